//! Spaced-seed mask parsing and the seed-position index.

use rustc_hash::FxHashMap;

use crate::sequence::{PackedSeq, BASES_PER_WORD};

/// Widest spaced-seed pattern, in bases. Matches the packed word width, so
/// every seed key fits one 32-bit window.
pub const MAX_PAT_LEN: usize = 16;

/// Width of the key window probed into the index, in bases.
pub const SEED_WINDOW: usize = BASES_PER_WORD;

/// Compile a spaced-seed pattern string into a 2-bit-per-position mask.
///
/// Each `'1'` contributes a `0b11` group (the position participates in the
/// key), anything else a `0b00` group (wildcard). Only the first 16
/// characters are read; the rest are silently ignored.
pub fn parse_pattern(pat: &str) -> u32 {
    let mut mask = 0u32;
    for c in pat.chars().take(MAX_PAT_LEN) {
        mask = if c == '1' { (mask << 2) | 0x3 } else { mask << 2 };
    }
    mask
}

/// Index from masked 16-base window values to the reference positions that
/// produce them.
///
/// Built in one pass over the reference and replaced wholesale whenever the
/// reference changes; entries are never removed individually.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedMap {
    mask: u32,
    map: FxHashMap<u32, Vec<u32>>,
}

impl SeedMap {
    /// Index every window start in `[0, ref_len - 16)`. A reference of 16
    /// bases or fewer yields an empty index.
    pub fn build(reference: &PackedSeq, mask: u32) -> Self {
        let mut map: FxHashMap<u32, Vec<u32>> = FxHashMap::default();
        let n_windows = reference.len().saturating_sub(SEED_WINDOW);
        for i in 0..n_windows {
            let key = reference.window(i) & mask;
            map.entry(key).or_default().push(i as u32);
        }
        Self { mask, map }
    }

    /// Reference positions whose masked window equals the query's masked
    /// window at `offset`. A miss is an empty slice, not an error.
    pub fn probe(&self, query: &PackedSeq, offset: usize) -> &[u32] {
        let key = query.window(offset) & self.mask;
        self.map.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct keys.
    pub fn num_keys(&self) -> usize {
        self.map.len()
    }

    /// Number of indexed positions across all keys.
    pub fn num_positions(&self) -> usize {
        self.map.values().map(Vec::len).sum()
    }
}
