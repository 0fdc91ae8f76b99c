//! Minimum-count filtering of the k-mers in FASTA samples.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use hashbrown::HashSet;
use rayon::prelude::*;
use seq_io::fasta::Reader;

use crate::counter::{new_counter, CounterKind, KmerCounter};
use crate::io::open_reader;
use crate::kmer::KmerHashes;
use crate::stats::CountStats;
use crate::utils::extract_filename;

/// Runs every k-mer of one sample through `counter`.
///
/// The counter is not reset first.
pub fn filter_sample(path: &Path, k: usize, counter: &mut dyn KmerCounter) -> Result<CountStats> {
    let mut reader = Reader::new(open_reader(path)?);
    let n_hashes = counter.num_hashes_needed().max(1);
    let mut passing: HashSet<u64> = HashSet::new();
    let mut stats = CountStats {
        sample: extract_filename(path).unwrap_or_default().to_string(),
        ..Default::default()
    };
    while let Some(record) = reader.next() {
        let record = record.with_context(|| format!("parse record in {}", path.display()))?;
        let seq = record.full_seq();
        let mut hashes = KmerHashes::new(&seq, k, n_hashes);
        while let Some(group) = hashes.next_group() {
            stats.total_kmers += 1;
            if counter.above_min(group) {
                stats.passing_kmers += 1;
                passing.insert(hashes.canonical());
            }
        }
    }
    stats.distinct_passing = passing.len() as u64;
    Ok(stats)
}

/// Filters samples in parallel. Each worker owns one counter, reset between
/// samples.
pub fn filter_samples(
    paths: &[PathBuf],
    k: usize,
    kind: CounterKind,
    min_count: u8,
) -> Result<Vec<CountStats>> {
    paths
        .par_iter()
        .map_init(
            || new_counter(kind, min_count),
            |counter, path| -> Result<CountStats> {
                let counter = counter
                    .as_mut()
                    .map_err(|e| anyhow!("allocate {:?} counter: {}", kind, e))?;
                counter.reset();
                let stats = filter_sample(path, k, &mut **counter)?;
                stats.log();
                Ok(stats)
            },
        )
        .collect()
}
