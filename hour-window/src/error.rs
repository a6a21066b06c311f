use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum BloomSetError {
    /// The single-pass discipline was violated: enumeration has begun, so
    /// the set no longer accepts writes. Callers treat this as fatal.
    #[error("bloom set is closed for writes after enumeration began")]
    ClosedForWrites,
    #[error("bloom set keys must be nonempty")]
    InvalidKey,
    #[error("bloom set spill io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("timestamp {timestamp} is outside the representable UTC range")]
    TimestampOutOfRange { timestamp: f64 },
    #[error("bloom set error: {0}")]
    Bloom(#[from] BloomSetError),
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scan io error: {0}")]
    Io(#[from] io::Error),
    #[error("bloom set error: {0}")]
    Bloom(#[from] BloomSetError),
}

#[derive(Debug, Error)]
pub enum PumpError {
    #[error("source io error: {0}")]
    Io(#[from] io::Error),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}
