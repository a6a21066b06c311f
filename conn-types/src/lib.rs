//! Shared types for the connection-log summarizer.
//!
//! The crate exposes:
//! - [`Record`]: one parsed connection-log line.
//! - [`LineParser`]: whitespace-delimited line parser producing [`ParseOutcome`].
//! - [`StreamConfig`] / [`ScanConfig`]: validated run configuration.

pub mod config;
pub mod record;

pub use config::{ConfigError, ScanConfig, StreamConfig, DEFAULT_MAX_LOG_LATE_SECONDS};
pub use record::{InvalidLine, InvalidReason, LineParser, ParseOutcome, Record};
