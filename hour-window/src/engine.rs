use std::collections::BTreeMap;

use chrono::{TimeZone, Timelike, Utc};
use conn_types::{Record, StreamConfig};

use crate::{
    bloom::{BloomSet, BloomSetConfig},
    counter::LimitedCounter,
    error::{EngineError, Result},
};

pub const SECONDS_PER_HOUR: i64 = 3600;

/// Aggregates for one matured (or flushed) hour.
///
/// The membership sets stay lazy: enumerating them streams from the spooled
/// journal, so a summary does not materialize its full host lists in memory.
pub struct HourSummary {
    /// Epoch seconds aligned to the UTC hour boundary.
    pub hour_key: i64,
    /// Hosts that connected to the configured `to_host`.
    pub to_hosts: BloomSet,
    /// Hosts the configured `from_host` connected to.
    pub from_hosts: BloomSet,
    /// Most-referenced host of the hour.
    pub top_host: String,
    /// Records routed into this hour.
    pub records: u64,
}

/// Per-hour state: OPEN while accepting writes, drained exactly once on
/// maturity or final flush, then destroyed. No other transitions exist.
struct WindowBucket {
    to_set: BloomSet,
    from_set: BloomSet,
    counter: LimitedCounter,
    records: u64,
}

impl WindowBucket {
    fn new(bloom_config: BloomSetConfig) -> Self {
        Self {
            to_set: BloomSet::with_config(bloom_config),
            from_set: BloomSet::with_config(bloom_config),
            counter: LimitedCounter::new(),
            records: 0,
        }
    }

    fn finalize(self, hour_key: i64) -> HourSummary {
        let top_host = self
            .counter
            .most_common(1)
            .into_iter()
            .next()
            .map(|(host, _)| host)
            .unwrap_or_default(); // buckets always hold at least one record
        HourSummary {
            hour_key,
            to_hosts: self.to_set,
            from_hosts: self.from_set,
            top_host,
            records: self.records,
        }
    }
}

/// Ingestion counters, exposed for observability.
#[derive(Debug, Default, Clone, Copy)]
pub struct EngineStats {
    pub records: u64,
    /// Records that arrived after their hour had already been emitted.
    pub dropped_late: u64,
    pub emitted_hours: u64,
}

/// The event-time windowing engine: routes records into hourly buckets,
/// advances the watermark, and drains matured buckets in ascending key order.
///
/// Single-threaded by design; `ingest` returns matured summaries so the
/// caller's sink runs synchronously on the ingesting thread.
pub struct HourlyEngine {
    config: StreamConfig,
    bloom_config: BloomSetConfig,
    buckets: BTreeMap<i64, WindowBucket>,
    max_seen: Option<f64>,
    /// Newest hour key already emitted; earlier (and equal) hours are
    /// retired and never revisited.
    last_emitted: Option<i64>,
    stats: EngineStats,
}

impl HourlyEngine {
    pub fn new(config: StreamConfig) -> Self {
        Self::with_bloom_config(config, BloomSetConfig::default())
    }

    pub fn with_bloom_config(config: StreamConfig, bloom_config: BloomSetConfig) -> Self {
        Self {
            config,
            bloom_config,
            buckets: BTreeMap::new(),
            max_seen: None,
            last_emitted: None,
            stats: EngineStats::default(),
        }
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Routes one record and returns every window the resulting watermark
    /// matured, in ascending hour order.
    pub fn ingest(&mut self, record: &Record) -> Result<Vec<HourSummary>> {
        let hour_key = hour_floor(record.timestamp)?;
        if self.last_emitted.is_some_and(|last| hour_key <= last) {
            self.stats.dropped_late += 1;
            return Ok(Vec::new());
        }
        self.stats.records += 1;

        let bloom_config = self.bloom_config;
        let bucket = self
            .buckets
            .entry(hour_key)
            .or_insert_with(|| WindowBucket::new(bloom_config));
        bucket.records += 1;
        bucket.counter.increment(&record.from_host);
        bucket.counter.increment(&record.to_host);
        if self
            .config
            .to_host
            .as_deref()
            .is_some_and(|target| record.to_host == target)
        {
            bucket.to_set.add(&record.from_host)?;
        }
        if self
            .config
            .from_host
            .as_deref()
            .is_some_and(|target| record.from_host == target)
        {
            bucket.from_set.add(&record.to_host)?;
        }

        let max_seen = match self.max_seen {
            Some(seen) => seen.max(record.timestamp),
            None => record.timestamp,
        };
        self.max_seen = Some(max_seen);
        Ok(self.drain_mature(max_seen))
    }

    /// Drains every minimum-key bucket the watermark has passed. Windows
    /// mature strictly in ascending key order: the watermark is global and
    /// monotonic, so a later bucket can never mature before an earlier one.
    fn drain_mature(&mut self, max_seen: f64) -> Vec<HourSummary> {
        let watermark = max_seen - self.config.max_log_late_seconds as f64;
        let mut matured = Vec::new();
        while let Some((&min_key, _)) = self.buckets.first_key_value() {
            if watermark <= (min_key + SECONDS_PER_HOUR) as f64 {
                break;
            }
            if let Some(bucket) = self.buckets.remove(&min_key) {
                matured.push(bucket.finalize(min_key));
                self.last_emitted = Some(min_key);
                self.stats.emitted_hours += 1;
            }
        }
        matured
    }

    /// End-of-input flush: emits still-open buckets in ascending key order,
    /// or discards them when the caller asked for complete hours only.
    /// Leaves the engine empty; `stats` keeps counting the flushed hours.
    pub fn finish(&mut self) -> Vec<HourSummary> {
        if self.config.only_complete_hours {
            self.buckets.clear();
            return Vec::new();
        }
        let buckets = std::mem::take(&mut self.buckets);
        buckets
            .into_iter()
            .map(|(hour_key, bucket)| {
                self.stats.emitted_hours += 1;
                bucket.finalize(hour_key)
            })
            .collect()
    }
}

/// UTC hour floor via calendar math (not `ts - ts % 3600`), so hour keys are
/// calendar-consistent regardless of the host's leap-second policy.
pub fn hour_floor(timestamp: f64) -> Result<i64> {
    let out_of_range = || EngineError::TimestampOutOfRange { timestamp };
    if !timestamp.is_finite() {
        return Err(out_of_range());
    }
    let secs = timestamp.floor() as i64;
    let datetime = Utc
        .timestamp_opt(secs, 0)
        .single()
        .ok_or_else(out_of_range)?;
    let floored = datetime
        .with_minute(0)
        .and_then(|dt| dt.with_second(0))
        .ok_or_else(out_of_range)?;
    Ok(floored.timestamp())
}
