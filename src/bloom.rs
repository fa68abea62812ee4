//! Bit-array bloom filter.
//!
//! Membership answers may be false positives, never false negatives.
//! Probe positions use double hashing: `h1 + i * h2` for `i` in `0..k`.

use std::hash::{DefaultHasher, Hash, Hasher};

/// Target false-positive rate when sizing from an expected item count.
const FALSE_POSITIVE_RATE: f64 = 0.001;

#[derive(Debug, Clone)]
pub struct BloomFilter {
    bits: Vec<u64>,
    bit_count: u64,
    hashes: u32,
}

impl BloomFilter {
    /// A filter sized for `expected` items at a 0.1% false-positive rate.
    pub fn with_capacity(expected: usize) -> Self {
        let n = expected.max(1) as f64;
        let ln2 = std::f64::consts::LN_2;
        let bit_count = (-(n * FALSE_POSITIVE_RATE.ln()) / (ln2 * ln2)).ceil().max(64.0) as u64;
        let hashes = ((bit_count as f64 / n) * ln2).round().clamp(1.0, 16.0) as u32;
        Self {
            bits: vec![0; bit_count.div_ceil(64) as usize],
            bit_count,
            hashes,
        }
    }

    fn seeds(item: &str) -> (u64, u64) {
        let mut first = DefaultHasher::new();
        item.hash(&mut first);
        let mut second = DefaultHasher::new();
        0x9e37_79b9_7f4a_7c15u64.hash(&mut second);
        item.hash(&mut second);
        // odd step so every probe differs
        (first.finish(), second.finish() | 1)
    }

    fn probes(&self, item: &str) -> impl Iterator<Item = u64> + '_ {
        let (h1, h2) = Self::seeds(item);
        (0..self.hashes as u64).map(move |i| h1.wrapping_add(i.wrapping_mul(h2)) % self.bit_count)
    }

    pub fn insert(&mut self, item: &str) {
        let positions: Vec<u64> = self.probes(item).collect();
        for bit in positions {
            self.bits[(bit / 64) as usize] |= 1 << (bit % 64);
        }
    }

    pub fn contains(&self, item: &str) -> bool {
        self.probes(item)
            .all(|bit| self.bits[(bit / 64) as usize] & (1 << (bit % 64)) != 0)
    }
}
