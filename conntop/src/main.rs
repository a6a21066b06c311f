// Copyright (c) James Kassemi, SC, US. All rights reserved.

mod cli;

use std::{
    fs::File,
    io::{self, BufReader},
    path::Path,
    process, thread,
    time::Duration,
};

use clap::Parser;
use conn_types::{ConfigError, LineParser, ScanConfig, StreamConfig};
use hour_window::{
    pump_source, seek_just_before, HourSummary, HourlyEngine, PumpError, RangeScanner, ScanError,
};
use log::info;
use thiserror::Error;

use cli::{Cli, Command, ScanArgs, StreamArgs};

/// Poll interval while tailing the final source.
const TAIL_POLL_MS: u64 = 100;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run() {
        eprintln!("conntop failed: {err}");
        process::exit(1);
    }
}

#[derive(Debug, Error)]
enum AppError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("stream error: {0}")]
    Pump(#[from] PumpError),
}

fn run() -> Result<(), AppError> {
    let args = Cli::parse();
    match args.command {
        Command::Scan(scan_args) => run_scan(scan_args),
        Command::Stream(stream_args) => run_stream(stream_args),
    }
}

fn run_scan(args: ScanArgs) -> Result<(), AppError> {
    let mut config = ScanConfig {
        to_host: args.to,
        time_init: args.time_init,
        time_end: args.time_end,
        max_log_late_seconds: args.max_log_late_seconds,
        fast_seek: !args.no_fast_seek,
    };
    config.validate()?;
    let fast_seek = config.fast_seek;

    let mut scanner = RangeScanner::new(config);
    info!("opening {}", args.file.display());
    let file = File::open(&args.file)?;
    let file_len = file.metadata()?.len();
    let mut reader = BufReader::new(file);
    if fast_seek {
        seek_just_before(&mut reader, file_len, scanner.seek_target())?;
    }
    // Output as we go, in case the user sees something that makes them
    // cancel.
    scanner.scan(reader, &mut |host| println!("{host}"))?;
    Ok(())
}

fn run_stream(args: StreamArgs) -> Result<(), AppError> {
    let mut config = StreamConfig {
        to_host: args.to,
        from_host: args.from,
        max_log_late_seconds: args.max_log_late_seconds,
        only_complete_hours: args.only_complete_hours,
        tail: args.tail,
    };
    config.validate(args.files.len())?;
    let tail = config.tail;

    let mut engine = HourlyEngine::new(config);
    let parser = LineParser::new();
    let mut emit = |summary: HourSummary| {
        if let Err(err) = print_summary(summary) {
            eprintln!("failed to write summary: {err}");
        }
    };

    if args.files.is_empty() {
        info!("reading from stdin");
        let stdin = io::stdin();
        // Reads from stdin block until data arrives, so tailing needs no
        // poll loop here.
        let mut reader = stdin.lock();
        pump_source(
            &mut engine,
            &parser,
            &mut reader,
            false,
            &mut || false,
            &mut emit,
        )?;
    } else {
        let last = args.files.len() - 1;
        for (position, path) in args.files.iter().enumerate() {
            let tail_this = tail && position == last;
            drain_file(&mut engine, &parser, path, tail_this, &mut emit)?;
        }
    }

    for summary in engine.finish() {
        emit(summary);
    }
    let stats = engine_stats_line(&engine);
    info!("{stats}");
    Ok(())
}

fn drain_file(
    engine: &mut HourlyEngine,
    parser: &LineParser,
    path: &Path,
    tail: bool,
    emit: &mut dyn FnMut(HourSummary),
) -> Result<(), AppError> {
    info!("reading {}", path.display());
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut wait = || {
        thread::sleep(Duration::from_millis(TAIL_POLL_MS));
        true // tailing ends with the process, not from inside the loop
    };
    pump_source(engine, parser, &mut reader, tail, &mut wait, emit)?;
    Ok(())
}

fn print_summary(mut summary: HourSummary) -> io::Result<()> {
    let mut to_hosts = summary.to_hosts.items()?.collect::<io::Result<Vec<_>>>()?;
    let mut from_hosts = summary
        .from_hosts
        .items()?
        .collect::<io::Result<Vec<_>>>()?;
    to_hosts.sort();
    from_hosts.sort();
    println!(
        "{} ({}) top={} to=[{}] from=[{}]",
        summary.hour_key,
        hour_label(summary.hour_key),
        summary.top_host,
        to_hosts.join(","),
        from_hosts.join(","),
    );
    Ok(())
}

fn hour_label(hour_key: i64) -> String {
    use chrono::{TimeZone, Utc};
    match Utc.timestamp_opt(hour_key, 0).single() {
        Some(datetime) => datetime.format("%Y-%m-%dT%H:00Z").to_string(),
        None => "invalid".to_string(),
    }
}

fn engine_stats_line(engine: &HourlyEngine) -> String {
    let stats = engine.stats();
    format!(
        "processed {} records, emitted {} hours, dropped {} late records",
        stats.records, stats.emitted_hours, stats.dropped_late
    )
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use hour_window::ScanStatus;

    use super::*;

    const T0: i64 = 1_551_466_800;

    #[test]
    fn scan_over_a_real_file_with_fast_seek() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        // Enough fixed-width lines to clear the minimum block count.
        for ts in 0..40_000i64 {
            writeln!(file, "{} src{} dst{}", 10_000 + ts, ts % 7, ts % 3).unwrap();
        }
        file.flush().unwrap();

        let mut config = ScanConfig {
            to_host: "dst0".to_string(),
            time_init: 20_000.0,
            time_end: 20_010.0,
            max_log_late_seconds: 0,
            fast_seek: true,
        };
        config.validate().unwrap();
        let mut scanner = RangeScanner::new(config);

        let handle = File::open(file.path()).unwrap();
        let file_len = handle.metadata().unwrap().len();
        let mut reader = BufReader::new(handle);
        seek_just_before(&mut reader, file_len, scanner.seek_target()).unwrap();

        let mut found = Vec::new();
        let status = scanner
            .scan(reader, &mut |host| found.push(host.to_string()))
            .unwrap();
        assert_eq!(status, ScanStatus::Done);
        // Timestamps 20000..20010 with dst = ts % 3 == 0 and src = ts % 7.
        let mut expected: Vec<String> = (20_000i64..20_010)
            .filter(|ts| (ts - 10_000) % 3 == 0)
            .map(|ts| format!("src{}", (ts - 10_000) % 7))
            .collect();
        expected.dedup();
        assert_eq!(found, expected);
    }

    #[test]
    fn stream_end_to_end_over_two_files() {
        let mut first = tempfile::NamedTempFile::new().unwrap();
        writeln!(first, "{} a b", T0).unwrap();
        writeln!(first, "{} d b", T0 + 4).unwrap();
        writeln!(first, "{} a c", T0 + 9).unwrap();
        first.flush().unwrap();
        let mut second = tempfile::NamedTempFile::new().unwrap();
        writeln!(second, "{} a c", T0 + 10).unwrap();
        writeln!(second, "{} b a", T0 + 701).unwrap();
        second.flush().unwrap();

        let mut config = StreamConfig {
            to_host: Some("b".to_string()),
            from_host: Some("a".to_string()),
            ..StreamConfig::default()
        };
        config.validate(2).unwrap();
        let mut engine = HourlyEngine::new(config);
        let parser = LineParser::new();
        let mut emitted = Vec::new();
        let mut emit = |summary: HourSummary| emitted.push(summary);
        for path in [first.path(), second.path()] {
            drain_file(&mut engine, &parser, path, false, &mut emit).unwrap();
        }
        for summary in engine.finish() {
            emitted.push(summary);
        }

        assert_eq!(emitted.len(), 1);
        let summary = &mut emitted[0];
        assert_eq!(summary.hour_key, T0);
        assert_eq!(summary.top_host, "a");
        let to_hosts = summary
            .to_hosts
            .items()
            .unwrap()
            .collect::<io::Result<Vec<_>>>()
            .unwrap();
        assert_eq!(to_hosts, vec!["a", "d"]);
    }
}
