use std::io::BufRead;

use conn_types::{LineParser, ParseOutcome};
use log::debug;

use crate::{
    engine::{HourSummary, HourlyEngine},
    error::PumpError,
};

/// Drains one line source into the engine, feeding matured summaries to
/// `sink` as they appear.
///
/// When `tail` is set, end-of-file suspends the loop at `wait` instead of
/// finishing: `wait` blocks (or sleeps) until new data may be available and
/// returns `false` to stop tailing. The waiter is injected so tests can
/// drive the poll loop deterministically; the binary installs a
/// `thread::sleep`-based one. "Current time" remains purely a function of
/// the data — an idle log emits nothing even as wall-clock hours pass.
pub fn pump_source<R: BufRead>(
    engine: &mut HourlyEngine,
    parser: &LineParser,
    reader: &mut R,
    tail: bool,
    wait: &mut dyn FnMut() -> bool,
    sink: &mut dyn FnMut(HourSummary),
) -> Result<(), PumpError> {
    let mut line = String::new();
    loop {
        line.clear();
        let bytes = reader.read_line(&mut line)?;
        if bytes == 0 {
            if tail && wait() {
                continue;
            }
            return Ok(());
        }
        match parser.parse(&line) {
            ParseOutcome::Parsed(record) => {
                for summary in engine.ingest(&record)? {
                    sink(summary);
                }
            }
            ParseOutcome::Invalid(invalid) => {
                debug!("dropping invalid line ({:?}): {line:?}", invalid.reason);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fs::OpenOptions,
        io::{BufReader, Cursor, Write},
    };

    use conn_types::StreamConfig;

    use super::*;

    const T0: i64 = 1_551_466_800;

    fn engine() -> HourlyEngine {
        HourlyEngine::new(StreamConfig {
            to_host: Some("b".to_string()),
            from_host: Some("a".to_string()),
            ..StreamConfig::default()
        })
    }

    #[test]
    fn drains_sources_sequentially_with_one_watermark() {
        let mut engine = engine();
        let parser = LineParser::new();
        let mut emitted = Vec::new();
        let mut stop = || false;

        let first = format!("{} a b\n{} d b\nnot a log line\n", T0, T0 + 4);
        let second = format!("{} c b\n", T0 + 3901);
        pump_source(
            &mut engine,
            &parser,
            &mut Cursor::new(first),
            false,
            &mut stop,
            &mut |summary| emitted.push(summary.hour_key),
        )
        .unwrap();
        assert!(emitted.is_empty());
        pump_source(
            &mut engine,
            &parser,
            &mut Cursor::new(second),
            false,
            &mut stop,
            &mut |summary| emitted.push(summary.hour_key),
        )
        .unwrap();
        // The second source's timestamp matured the first source's hour.
        assert_eq!(emitted, vec![T0]);
        assert_eq!(engine.stats().records, 3);
    }

    #[test]
    fn tailing_picks_up_appended_lines_between_polls() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{} a b", T0).unwrap();
        file.flush().unwrap();

        let path = file.path().to_path_buf();
        let mut reader = BufReader::new(std::fs::File::open(&path).unwrap());
        let mut engine = engine();
        let parser = LineParser::new();
        let mut emitted = Vec::new();
        let mut polls = 0;
        let mut wait = move || {
            polls += 1;
            if polls == 1 {
                let mut appender = OpenOptions::new().append(true).open(&path).unwrap();
                writeln!(appender, "{} c b", T0 + 3901).unwrap();
                true
            } else {
                false
            }
        };
        pump_source(
            &mut engine,
            &parser,
            &mut reader,
            true,
            &mut wait,
            &mut |summary| emitted.push(summary.hour_key),
        )
        .unwrap();
        assert_eq!(emitted, vec![T0]);
    }
}
