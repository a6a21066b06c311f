//! Event-time hourly windowing over connection-log records.
//!
//! One forward pass, bounded memory: records that may arrive slightly out of
//! chronological order are routed into per-hour buckets, a watermark (max
//! observed timestamp minus the lateness tolerance) decides when a bucket
//! has matured, and matured aggregates are handed out in ascending hour
//! order before the bucket is destroyed.
//!
//! The crate exposes:
//! - [`HourlyEngine`]: the windowing state machine; [`HourSummary`] is what
//!   it emits per matured hour.
//! - [`BloomSet`]: fixed-memory membership set with enumerable contents.
//! - [`LimitedCounter`]: capacity-bounded frequency counter with explicit
//!   eviction.
//! - [`seek_just_before`]: block binary search to skip a time-ordered
//!   file's unwanted prefix.
//! - [`RangeScanner`]: bounded-range first-seen query with early stop.
//! - [`pump_source`]: sequential source draining, with injectable tailing.

pub mod bloom;
pub mod counter;
pub mod engine;
pub mod error;
pub mod pump;
pub mod scan;
pub mod seek;

pub use bloom::{BloomSet, BloomSetConfig, Items};
pub use counter::{EvictionPolicy, LimitedCounter};
pub use engine::{hour_floor, EngineStats, HourSummary, HourlyEngine, SECONDS_PER_HOUR};
pub use error::{BloomSetError, EngineError, PumpError, Result, ScanError};
pub use pump::pump_source;
pub use scan::{RangeScanner, ScanStatus};
pub use seek::{seek_just_before, BLOCK_SIZE};
