// Copyright (c) James Kassemi, SC, US. All rights reserved.

use thiserror::Error;

use crate::record::is_valid_host;

/// Default lateness tolerance added to the watermark threshold.
pub const DEFAULT_MAX_LOG_LATE_SECONDS: i64 = 5 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max_log_late_seconds must be nonnegative, got {0}")]
    NegativeLateness(i64),
    #[error("invalid host filter {0:?}: must fully match [0-9a-z]+")]
    InvalidHostFilter(String),
    #[error("time_end {time_end} is before time_init {time_init}")]
    InvertedTimeRange { time_init: f64, time_end: f64 },
    #[error("no input files given and --tail not set; pass files or tail stdin")]
    NoInput,
}

/// Configuration for the hourly streaming mode.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Track sources that connected to this destination host.
    pub to_host: Option<String>,
    /// Track destinations this source host connected to.
    pub from_host: Option<String>,
    /// Lateness tolerance in seconds; the watermark trails the max observed
    /// timestamp by this much.
    pub max_log_late_seconds: i64,
    /// Suppress emission of still-open buckets at end of input.
    pub only_complete_hours: bool,
    /// Keep polling the final source for new lines after EOF.
    pub tail: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            to_host: None,
            from_host: None,
            max_log_late_seconds: DEFAULT_MAX_LOG_LATE_SECONDS,
            only_complete_hours: false,
            tail: false,
        }
    }
}

impl StreamConfig {
    /// Fail-fast validation, run before any ingestion. `input_files` is the
    /// number of files on the command line; zero means stdin, which is only
    /// sensible when tailing.
    pub fn validate(&mut self, input_files: usize) -> Result<(), ConfigError> {
        if self.max_log_late_seconds < 0 {
            return Err(ConfigError::NegativeLateness(self.max_log_late_seconds));
        }
        self.to_host = normalize_host_filter(self.to_host.take())?;
        self.from_host = normalize_host_filter(self.from_host.take())?;
        if input_files == 0 && !self.tail {
            return Err(ConfigError::NoInput);
        }
        Ok(())
    }
}

/// Configuration for the bounded-range scan mode.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Destination host whose connecting sources are collected.
    pub to_host: String,
    /// Earliest timestamp considered, inclusive.
    pub time_init: f64,
    /// End of the timestamp range, noninclusive.
    pub time_end: f64,
    pub max_log_late_seconds: i64,
    /// Use the block binary search to skip unwanted prefix.
    pub fast_seek: bool,
}

impl ScanConfig {
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.max_log_late_seconds < 0 {
            return Err(ConfigError::NegativeLateness(self.max_log_late_seconds));
        }
        self.to_host = self.to_host.to_ascii_lowercase();
        if !is_valid_host(&self.to_host) {
            return Err(ConfigError::InvalidHostFilter(self.to_host.clone()));
        }
        if self.time_end < self.time_init {
            return Err(ConfigError::InvertedTimeRange {
                time_init: self.time_init,
                time_end: self.time_end,
            });
        }
        Ok(())
    }
}

fn normalize_host_filter(filter: Option<String>) -> Result<Option<String>, ConfigError> {
    match filter {
        None => Ok(None),
        Some(host) => {
            let host = host.to_ascii_lowercase();
            if !is_valid_host(&host) {
                return Err(ConfigError::InvalidHostFilter(host));
            }
            Ok(Some(host))
        }
    }
}
