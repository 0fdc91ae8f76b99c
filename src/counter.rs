//! Shared contract for k-mer counters and the hash bit-packing they rely on.

use std::collections::TryReserveError;

use crate::constants;
use crate::countmin::CountMin;
use crate::hash_counter::HashCounter;

/// Bits of a hash word used as a column index in the sketch table.
pub const TABLE_WIDTH_BITS: u32 = constants::TABLE_WIDTH_BITS;
/// Number of rows (independent sub-hashes) in the sketch table.
pub const TABLE_ROWS: usize = constants::TABLE_ROWS;
/// Sub-hashes packed in one 64-bit hash word.
pub const HASH_PER_HASH: usize = hash_per_hash(TABLE_WIDTH_BITS);
/// Low `TABLE_WIDTH_BITS` bits set.
pub const TABLE_MASK: u64 = width_mask(TABLE_WIDTH_BITS);

pub const fn hash_per_hash(width_bits: u32) -> usize {
    (64 / width_bits) as usize
}

pub const fn width_mask(width_bits: u32) -> u64 {
    if width_bits >= 64 {
        u64::MAX
    } else {
        (1u64 << width_bits) - 1
    }
}

/// Splits a hash word into `64 / width_bits` column indices, lowest bits first.
#[derive(Debug, Clone)]
pub struct SubHashes {
    word: u64,
    width_bits: u32,
    mask: u64,
    remaining: usize,
}

impl SubHashes {
    pub fn new(word: u64, width_bits: u32) -> Self {
        Self {
            word,
            width_bits,
            mask: width_mask(width_bits),
            remaining: hash_per_hash(width_bits),
        }
    }
}

impl Iterator for SubHashes {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let column = (self.word & self.mask) as usize;
        self.word = self.word.checked_shr(self.width_bits).unwrap_or(0);
        Some(column)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for SubHashes {}

/// A k-mer occurrence counter.
///
/// `hashes` is the group of hash words for the current k-mer position. A
/// counter only reads it and never advances the hash source.
pub trait KmerCounter {
    /// Minimum count a k-mer must exceed to pass [`KmerCounter::above_min`].
    fn min_count(&self) -> u8;

    /// Hash words this counter reads per k-mer.
    fn num_hashes_needed(&self) -> usize;

    /// Records one more occurrence and returns the count estimate after it.
    fn add_count(&mut self, hashes: &[u64]) -> u8;

    /// Clears every count, keeping the allocation.
    fn reset(&mut self);

    /// Records one more occurrence and reports whether the estimate is now
    /// strictly above the minimum count.
    fn above_min(&mut self, hashes: &[u64]) -> bool {
        self.add_count(hashes) > self.min_count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    /// Fixed-size sketch, see [`CountMin`].
    CountMin,
    /// Hash map keyed on the first hash word, see [`HashCounter`].
    Exact,
}

pub fn new_counter(
    kind: CounterKind,
    min_count: u8,
) -> Result<Box<dyn KmerCounter + Send>, TryReserveError> {
    Ok(match kind {
        CounterKind::CountMin => {
            Box::new(CountMin::<TABLE_ROWS, TABLE_WIDTH_BITS>::new(min_count)?)
        }
        CounterKind::Exact => Box::new(HashCounter::new(min_count)),
    })
}
