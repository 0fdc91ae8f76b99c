//! Canonical k-mer hash source for driving the counters from sequence.
//!
//! k-mers are 2-bit packed (k <= 32) and canonicalised against their reverse
//! complement, then mixed into `n_hashes` independent 64-bit words, one group
//! per k-mer position. k-mers containing a non-ACGT base are skipped.

pub const MAX_K: usize = 32;

// Odd 64-bit constants, one per hash word in a group.
const SEEDS: [u64; 8] = [
    0x9e37_79b9_7f4a_7c15,
    0xbf58_476d_1ce4_e5b9,
    0x94d0_49bb_1331_11eb,
    0xd6e8_feb8_6659_fd93,
    0xa076_1d64_78bd_642f,
    0xe703_7ed1_a0b4_28db,
    0x8ebc_6af0_9c88_c6e3,
    0x5899_65cc_7537_4cc3,
];

pub fn base_to_bits(b: u8) -> Option<u64> {
    match b {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' => Some(3),
        _ => None,
    }
}

/// Finaliser from MurmurHash3.
#[inline]
fn fmix64(mut h: u64) -> u64 {
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^= h >> 33;
    h
}

/// `i`-th hash word of a canonical k-mer.
#[inline]
pub fn kmer_hash(canonical: u64, i: usize) -> u64 {
    let seed = SEEDS[i % SEEDS.len()].wrapping_add((i / SEEDS.len()) as u64);
    fmix64(canonical ^ seed)
}

/// Rolls over a sequence, yielding the hash group of every valid k-mer.
pub struct KmerHashes<'a> {
    seq: &'a [u8],
    pos: usize,
    k: usize,
    kmask: u64,
    shift: usize,
    fwd: u64,
    rev: u64,
    valid: usize,
    group: Vec<u64>,
}

impl<'a> KmerHashes<'a> {
    /// # Panics
    ///
    /// If `k` is zero or above [`MAX_K`].
    pub fn new(seq: &'a [u8], k: usize, n_hashes: usize) -> Self {
        assert!(k > 0 && k <= MAX_K, "k must be in 1..={MAX_K}, got {k}");
        let kmask = if k == MAX_K {
            u64::MAX
        } else {
            (1u64 << (2 * k)) - 1
        };
        Self {
            seq,
            pos: 0,
            k,
            kmask,
            shift: 2 * (k - 1),
            fwd: 0,
            rev: 0,
            valid: 0,
            group: vec![0; n_hashes.max(1)],
        }
    }

    /// Hash group for the next valid k-mer, or `None` at the end of the
    /// sequence. The slice is overwritten by the following call.
    pub fn next_group(&mut self) -> Option<&[u64]> {
        while self.pos < self.seq.len() {
            let b = self.seq[self.pos];
            self.pos += 1;
            match base_to_bits(b) {
                Some(bits) => {
                    self.fwd = ((self.fwd << 2) | bits) & self.kmask;
                    self.rev = (self.rev >> 2) | ((3 - bits) << self.shift);
                    self.valid += 1;
                }
                None => {
                    self.valid = 0;
                    continue;
                }
            }
            if self.valid >= self.k {
                let canonical = self.fwd.min(self.rev);
                for (i, word) in self.group.iter_mut().enumerate() {
                    *word = kmer_hash(canonical, i);
                }
                return Some(&self.group);
            }
        }
        None
    }

    /// Canonical value of the k-mer behind the last group returned.
    pub fn canonical(&self) -> u64 {
        self.fwd.min(self.rev)
    }
}
