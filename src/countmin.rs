//! Fixed-memory k-mer counter.
//!
//! A table of `ROWS` x `2^WIDTH_BITS` saturating `u8` cells. Each hash word
//! carries `64 / WIDTH_BITS` column indices (see [`SubHashes`]), so a k-mer
//! needs `ROWS / (64 / WIDTH_BITS)` hash words. The reference layout is
//! [`TABLE_ROWS`] x `2^`[`TABLE_WIDTH_BITS`]; host and any device-side mirror
//! must agree on it to produce identical estimates.
//!
//! The estimate returned is the largest post-increment cell across the rows,
//! not the smallest as in a textbook count-min sketch. Collisions in any row
//! can therefore only raise the estimate.

use std::collections::TryReserveError;

use crate::counter::{
    hash_per_hash, width_mask, KmerCounter, SubHashes, TABLE_ROWS, TABLE_WIDTH_BITS,
};

#[derive(Debug, Clone)]
pub struct CountMin<
    const ROWS: usize = { TABLE_ROWS },
    const WIDTH_BITS: u32 = { TABLE_WIDTH_BITS },
> {
    table: Vec<u8>,
    min_count: u8,
}

impl<const ROWS: usize, const WIDTH_BITS: u32> CountMin<ROWS, WIDTH_BITS> {
    const HASH_PER_HASH: usize = {
        assert!(
            WIDTH_BITS >= 1 && WIDTH_BITS <= 32,
            "table width must be between 1 and 32 bits"
        );
        hash_per_hash(WIDTH_BITS)
    };
    const LAYOUT: () = assert!(
        ROWS > 0 && ROWS % Self::HASH_PER_HASH == 0,
        "table rows must be a non-zero multiple of hash_per_hash"
    );
    const MASK: u64 = width_mask(WIDTH_BITS);
    const WIDTH: usize = 1 << WIDTH_BITS;

    /// Allocates a zeroed table.
    pub fn new(min_count: u8) -> Result<Self, TryReserveError> {
        #[allow(clippy::let_unit_value)]
        let () = Self::LAYOUT;
        let cells = ROWS * Self::WIDTH;
        let mut table = Vec::new();
        table.try_reserve_exact(cells)?;
        table.resize(cells, 0);
        log::debug!(
            "Allocated countmin table: {} rows x 2^{} columns ({} bytes)",
            ROWS,
            WIDTH_BITS,
            cells
        );
        Ok(Self { table, min_count })
    }

    /// Current value of one cell.
    pub fn cell(&self, row: usize, column: usize) -> u8 {
        self.table[row * Self::WIDTH + column]
    }
}

impl<const ROWS: usize, const WIDTH_BITS: u32> KmerCounter for CountMin<ROWS, WIDTH_BITS> {
    fn min_count(&self) -> u8 {
        self.min_count
    }

    fn num_hashes_needed(&self) -> usize {
        ROWS / Self::HASH_PER_HASH
    }

    fn add_count(&mut self, hashes: &[u64]) -> u8 {
        let mut estimate = 0u8;
        for (group, &word) in hashes[..self.num_hashes_needed()].iter().enumerate() {
            let first_row = group * Self::HASH_PER_HASH;
            for (offset, column) in SubHashes::new(word, WIDTH_BITS).enumerate() {
                debug_assert!(column as u64 <= Self::MASK);
                let cell = &mut self.table[(first_row + offset) * Self::WIDTH + column];
                if *cell == u8::MAX {
                    // saturated: rest of this word's rows are not touched
                    estimate = u8::MAX;
                    break;
                }
                *cell += 1;
                estimate = estimate.max(*cell);
            }
        }
        estimate
    }

    fn reset(&mut self) {
        self.table.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashMap;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    // 8 rows of 256 columns, one hash word per k-mer
    type Tiny = CountMin<8, 8>;
    // 10 rows of 4096 columns, two hash words per k-mer
    type TwoWords = CountMin<10, 12>;

    #[test]
    fn hashes_needed_follow_layout() {
        assert_eq!(Tiny::new(1).unwrap().num_hashes_needed(), 1);
        assert_eq!(TwoWords::new(1).unwrap().num_hashes_needed(), 2);
        assert_eq!(CountMin::<4, 16>::new(1).unwrap().num_hashes_needed(), 1);
    }

    #[test]
    fn counts_up_then_saturates() {
        let mut counter = TwoWords::new(2).unwrap();
        let hashes = [0x1234_5678_9abc_def0, 0x0fed_cba9_8765_4321];
        for expected in 1..=255u32 {
            assert_eq!(counter.add_count(&hashes) as u32, expected);
        }
        assert_eq!(counter.add_count(&hashes), 255);
        assert_eq!(counter.add_count(&hashes), 255);
    }

    #[test]
    fn estimate_is_maximum_over_rows() {
        let mut counter = Tiny::new(0).unwrap();
        // column 1 in row 0, column 0 everywhere else
        let other = [0x01];
        for _ in 0..3 {
            counter.add_count(&other);
        }
        // column 0 in every row: row 0 is fresh, rows 1..8 already hold 3
        assert_eq!(counter.add_count(&[0x00]), 4);
        assert_eq!(counter.cell(0, 0), 1);
        assert_eq!(counter.cell(0, 1), 3);
        assert_eq!(counter.cell(7, 0), 4);
    }

    #[test]
    fn saturated_cell_stops_its_word_only() {
        let mut counter = TwoWords::new(0).unwrap();
        for _ in 0..255 {
            counter.add_count(&[0, 0]);
        }
        assert_eq!(counter.cell(0, 0), 255);

        // first word: row 0 saturated at column 0, row 1 would go to column 1
        let first = 1u64 << 12;
        // second word: column 1 in all five of its rows
        let second = (0..5).fold(0u64, |acc, i| acc | (1u64 << (12 * i)));
        assert_eq!(counter.add_count(&[first, second]), 255);
        assert_eq!(counter.cell(1, 1), 0);
        for row in 5..10 {
            assert_eq!(counter.cell(row, 1), 1);
        }
    }

    #[test]
    fn never_underestimates() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut counter = Tiny::new(1).unwrap();
        let words: Vec<u64> = (0..300).map(|_| rng.gen()).collect();
        let mut truth: HashMap<u64, u32> = HashMap::new();
        for _ in 0..5000 {
            let word = words[rng.gen_range(0..words.len())];
            let seen = truth.entry(word).or_insert(0);
            *seen += 1;
            let estimate = counter.add_count(&[word]);
            assert!(estimate as u32 >= (*seen).min(255));
        }
    }

    #[test]
    fn reset_clears_counts() {
        let mut counter = Tiny::new(1).unwrap();
        for _ in 0..10 {
            counter.add_count(&[99]);
        }
        counter.reset();
        assert_eq!(counter.add_count(&[99]), 1);
        assert_eq!(counter.cell(0, 99), 1);
        assert_eq!(counter.cell(0, 0), 0);
    }

    #[test]
    fn above_min_is_strict() {
        let mut counter = Tiny::new(2).unwrap();
        assert!(!counter.above_min(&[7]));
        assert!(!counter.above_min(&[7]));
        assert!(counter.above_min(&[7]));
    }
}
