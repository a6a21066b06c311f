use std::collections::HashMap;

/// Default distinct-key ceiling before eviction runs.
pub const DEFAULT_MAX_SIZE: usize = 30_000;
/// Default fraction of `max_size` kept after an eviction pass.
pub const DEFAULT_REDUCE_FACTOR: f64 = 0.5;

#[derive(Debug, Clone, Copy)]
struct Slot {
    count: u64,
    /// Monotonic touch sequence, used as the deterministic tie-break
    /// (most recently touched first).
    seq: u64,
}

/// Which keys survive when the counter reaches its ceiling. Kept separate
/// from the counting map so the surviving-key rule is auditable and
/// swappable on its own.
#[derive(Debug, Clone, Copy)]
pub struct EvictionPolicy {
    pub max_size: usize,
    pub reduce_factor: f64,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            reduce_factor: DEFAULT_REDUCE_FACTOR,
        }
    }
}

impl EvictionPolicy {
    /// Drops the lowest-count entries until at most
    /// `max_size * reduce_factor` remain. No-op below the ceiling.
    fn enforce(&self, counts: &mut HashMap<String, Slot>) {
        if counts.len() < self.max_size {
            return;
        }
        let keep = (self.max_size as f64 * self.reduce_factor) as usize;
        let evict = counts.len().saturating_sub(keep);
        let mut ranked: Vec<(String, u64, u64)> = counts
            .iter()
            .map(|(key, slot)| (key.clone(), slot.count, slot.seq))
            .collect();
        ranked.sort_unstable_by(|a, b| (a.1, a.2).cmp(&(b.1, b.2)));
        for (key, _, _) in ranked.into_iter().take(evict) {
            counts.remove(&key);
        }
    }
}

/// Approximate top-k frequency tracking under a memory ceiling.
///
/// Counts for evicted keys are lost outright; a key that reappears after
/// eviction restarts from a fresh count. That undercounts the long tail and
/// is the intended trade for bounded memory, not a defect.
#[derive(Debug, Default)]
pub struct LimitedCounter {
    counts: HashMap<String, Slot>,
    policy: EvictionPolicy,
    next_seq: u64,
}

impl LimitedCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: EvictionPolicy) -> Self {
        Self {
            counts: HashMap::new(),
            policy,
            next_seq: 0,
        }
    }

    pub fn increment(&mut self, key: &str) {
        self.increment_by(key, 1);
    }

    pub fn increment_by(&mut self, key: &str, by: u64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        match self.counts.get_mut(key) {
            Some(slot) => {
                slot.count += by;
                slot.seq = seq;
            }
            None => {
                self.counts.insert(key.to_string(), Slot { count: by, seq });
            }
        }
        self.policy.enforce(&mut self.counts);
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Up to `n` entries by descending count. Ties break most recently
    /// touched first; callers must not depend on tie order beyond the top
    /// count itself.
    pub fn most_common(&self, n: usize) -> Vec<(String, u64)> {
        let mut ranked: Vec<(&String, &Slot)> = self.counts.iter().collect();
        ranked.sort_unstable_by(|a, b| (b.1.count, b.1.seq).cmp(&(a.1.count, a.1.seq)));
        ranked
            .into_iter()
            .take(n)
            .map(|(key, slot)| (key.clone(), slot.count))
            .collect()
    }
}
