//! Exact k-mer counter backed by a hash map. Memory grows with the number of
//! distinct k-mers, so this is the fallback for small inputs.

use hashbrown::hash_map::Entry;
use hashbrown::HashMap;

use crate::counter::KmerCounter;

#[derive(Debug, Clone, Default)]
pub struct HashCounter {
    table: HashMap<u64, u8>,
    min_count: u8,
}

impl HashCounter {
    pub fn new(min_count: u8) -> Self {
        Self {
            table: HashMap::new(),
            min_count,
        }
    }

    /// Count for the k-mer without recording an occurrence.
    ///
    /// An unseen k-mer is inserted with a count of zero, so probing grows
    /// [`HashCounter::len`].
    pub fn probe(&mut self, hashes: &[u64]) -> u8 {
        *self.table.entry(hashes[0]).or_insert(0)
    }

    /// Number of distinct keys held, including zero entries left by
    /// [`HashCounter::probe`].
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl KmerCounter for HashCounter {
    fn min_count(&self) -> u8 {
        self.min_count
    }

    fn num_hashes_needed(&self) -> usize {
        0
    }

    fn add_count(&mut self, hashes: &[u64]) -> u8 {
        match self.table.entry(hashes[0]) {
            Entry::Vacant(slot) => *slot.insert(1),
            Entry::Occupied(mut slot) => {
                let count = slot.get_mut();
                *count = count.saturating_add(1);
                *count
            }
        }
    }

    fn reset(&mut self) {
        self.table.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_adds_saturate() {
        let mut counter = HashCounter::new(1);
        let hashes = [0xABCD, 0x1111];
        for k in 1..=300u32 {
            assert_eq!(counter.add_count(&hashes) as u32, k.min(255));
        }
        assert_eq!(counter.probe(&hashes), 255);
    }

    #[test]
    fn keyed_on_first_word_only() {
        let mut counter = HashCounter::new(1);
        counter.add_count(&[5, 1]);
        assert_eq!(counter.add_count(&[5, 2]), 2);
        assert_eq!(counter.add_count(&[6, 1]), 1);
        assert_eq!(counter.len(), 2);
    }

    #[test]
    fn probe_inserts_zero_entry() {
        let mut counter = HashCounter::new(1);
        assert!(counter.is_empty());
        assert_eq!(counter.probe(&[42]), 0);
        assert_eq!(counter.len(), 1);
        assert_eq!(counter.add_count(&[42]), 1);
        assert_eq!(counter.len(), 1);
    }

    #[test]
    fn threshold_and_reset() {
        let mut counter = HashCounter::new(1);
        assert_eq!(counter.num_hashes_needed(), 0);
        assert!(!counter.above_min(&[3]));
        assert!(counter.above_min(&[3]));
        counter.reset();
        assert!(counter.is_empty());
        assert!(!counter.above_min(&[3]));
    }
}
