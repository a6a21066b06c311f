use std::{
    hash::Hasher,
    io::{self, BufRead, BufReader, Seek, SeekFrom, Write},
};

use tempfile::SpooledTempFile;

use crate::error::BloomSetError;

/// Default expected distinct-key count the filter is sized for.
pub const DEFAULT_EXPECTED_CARDINALITY: usize = 1_000_000;
/// Default false-positive rate at the expected cardinality.
pub const DEFAULT_FALSE_POSITIVE_RATE: f64 = 1e-9;
/// Raw-key bytes kept in memory before the journal spills to disk.
pub const DEFAULT_SPILL_THRESHOLD_BYTES: usize = 5 * (1 << 20);

const HASH_SEED_A: u64 = 0x9e37_79b9_7f4a_7c15;
const HASH_SEED_B: u64 = 0xc2b2_ae3d_27d4_eb4f;

/// Sizing parameters for a [`BloomSet`].
#[derive(Debug, Clone, Copy)]
pub struct BloomSetConfig {
    pub expected_cardinality: usize,
    pub target_false_positive_rate: f64,
    pub spill_threshold_bytes: usize,
}

impl Default for BloomSetConfig {
    fn default() -> Self {
        Self {
            expected_cardinality: DEFAULT_EXPECTED_CARDINALITY,
            target_false_positive_rate: DEFAULT_FALSE_POSITIVE_RATE,
            spill_threshold_bytes: DEFAULT_SPILL_THRESHOLD_BYTES,
        }
    }
}

/// Set membership over strings in a fixed memory footprint.
///
/// A Bloom filter answers `contains` with a bounded false-positive rate and
/// no false negatives, while an append-only journal of inserted keys (spooled
/// to a temporary file past the spill threshold) lets the true insertion
/// sequence be reproduced once, via [`BloomSet::items`]. Exceeding the
/// expected cardinality raises the effective false-positive rate gradually
/// rather than failing.
pub struct BloomSet {
    bits: Vec<u64>,
    bit_count: u64,
    hash_count: u32,
    journal: SpooledTempFile,
    len: usize,
    closed: bool,
}

impl BloomSet {
    pub fn new() -> Self {
        Self::with_config(BloomSetConfig::default())
    }

    pub fn with_config(config: BloomSetConfig) -> Self {
        let n = config.expected_cardinality.max(1) as f64;
        let p = config.target_false_positive_rate.clamp(f64::MIN_POSITIVE, 0.5);
        let ln2 = std::f64::consts::LN_2;
        let bit_count = ((-n * p.ln()) / (ln2 * ln2)).ceil().max(64.0) as u64;
        let hash_count = ((bit_count as f64 / n) * ln2).round().max(1.0) as u32;
        Self {
            bits: vec![0u64; bit_count.div_ceil(64) as usize],
            bit_count,
            hash_count,
            journal: SpooledTempFile::new(config.spill_threshold_bytes),
            len: 0,
            closed: false,
        }
    }

    /// Number of keys recorded in the journal (probably-distinct inserts).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts `key`, returning whether it was newly added. A probable
    /// duplicate is not re-journaled. Fails once enumeration has begun.
    pub fn add(&mut self, key: &str) -> Result<bool, BloomSetError> {
        if self.closed {
            return Err(BloomSetError::ClosedForWrites);
        }
        if key.is_empty() {
            return Err(BloomSetError::InvalidKey);
        }
        if self.contains(key) {
            return Ok(false);
        }
        let (h1, h2) = self.hash_pair(key);
        for i in 0..self.hash_count {
            let bit = (h1.wrapping_add((i as u64).wrapping_mul(h2))) % self.bit_count;
            self.bits[(bit / 64) as usize] |= 1u64 << (bit % 64);
        }
        self.journal.write_all(key.as_bytes())?;
        self.journal.write_all(b"\n")?;
        self.len += 1;
        Ok(true)
    }

    /// One-sided membership test: may report a never-inserted key as present
    /// (bounded by the configured error rate), never the reverse.
    pub fn contains(&self, key: &str) -> bool {
        let (h1, h2) = self.hash_pair(key);
        (0..self.hash_count).all(|i| {
            let bit = (h1.wrapping_add((i as u64).wrapping_mul(h2))) % self.bit_count;
            self.bits[(bit / 64) as usize] & (1u64 << (bit % 64)) != 0
        })
    }

    /// Switches the set irrevocably into read mode and yields every key that
    /// was actually added, in insertion order, exactly once. Re-enumeration
    /// rewinds the journal; writing after the first call fails with
    /// [`BloomSetError::ClosedForWrites`].
    pub fn items(&mut self) -> io::Result<Items<'_>> {
        self.closed = true;
        self.journal.seek(SeekFrom::Start(0))?;
        Ok(Items {
            lines: BufReader::new(&mut self.journal).lines(),
        })
    }

    fn hash_pair(&self, key: &str) -> (u64, u64) {
        // Double hashing: k probe indices derived from two seeded streams.
        (seeded_hash(HASH_SEED_A, key), seeded_hash(HASH_SEED_B, key) | 1)
    }
}

impl Default for BloomSet {
    fn default() -> Self {
        Self::new()
    }
}

fn seeded_hash(seed: u64, key: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    hasher.write_u64(seed);
    hasher.write(key.as_bytes());
    hasher.finish()
}

/// Lazy enumeration of the journaled keys.
pub struct Items<'a> {
    lines: io::Lines<BufReader<&'a mut SpooledTempFile>>,
}

impl Iterator for Items<'_> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines.next()
    }
}
