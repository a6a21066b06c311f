use clap::{Parser, Subcommand};
use std::path::PathBuf;

use conn_types::DEFAULT_MAX_LOG_LATE_SECONDS;

#[derive(Debug, Parser)]
#[command(name = "conntop")]
#[command(about = "Parse connection logs to see who is connecting to whom")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// One bounded time range: every source that connected to a host
    Scan(ScanArgs),

    /// Hourly summaries over a stream of (possibly growing) logs
    Stream(StreamArgs),
}

#[derive(Debug, Parser)]
pub struct ScanArgs {
    /// Collect all hosts who connected to this host
    #[arg(long)]
    pub to: String,

    /// Earliest timestamp of the log entries to consider (epoch seconds)
    #[arg(long)]
    pub time_init: f64,

    /// End of the timestamp range, noninclusive (epoch seconds)
    #[arg(long)]
    pub time_end: f64,

    /// Maximum time in seconds a log line can arrive late
    #[arg(long, default_value_t = DEFAULT_MAX_LOG_LATE_SECONDS)]
    pub max_log_late_seconds: i64,

    /// Do not use the fast block seek to the start time
    #[arg(long)]
    pub no_fast_seek: bool,

    /// The file to parse
    pub file: PathBuf,
}

#[derive(Debug, Parser)]
pub struct StreamArgs {
    /// Collect all hosts who connected to this host
    #[arg(long)]
    pub to: Option<String>,

    /// Collect all hosts who this host connected to
    #[arg(long)]
    pub from: Option<String>,

    /// Maximum time in seconds a log line can arrive late
    #[arg(long, default_value_t = DEFAULT_MAX_LOG_LATE_SECONDS)]
    pub max_log_late_seconds: i64,

    /// At end of input, discard partially completed hours instead of
    /// dumping them
    #[arg(long)]
    pub only_complete_hours: bool,

    /// Keep reading the final file after EOF and emit when the data itself
    /// crosses an hour; an inactive log emits nothing even as wall-clock
    /// time passes
    #[arg(long)]
    pub tail: bool,

    /// The files to parse, drained in order; leave blank for stdin
    pub files: Vec<PathBuf>,
}
