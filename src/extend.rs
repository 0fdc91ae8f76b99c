//! Growing and trimming sparse kNN distance graphs.
//!
//! Both operations keep, for every row, its nearest neighbours up to `knn`
//! distinct distance values. Distances tied with the last kept value are kept
//! too, so a row may hold more than `knn` entries.

use ndarray::ArrayView2;
use rayon::prelude::*;

use crate::sparse::{combine_rows, row_start_indices, sort_indexes, SparseCoo};

/// Absolute tolerance under which two distances count as the same value.
pub const EPSILON: f32 = 1e-10;

/// Running kNN cap for one row.
struct NeighbourCap {
    knn: usize,
    unique: usize,
    prev: f32,
}

impl NeighbourCap {
    fn new(knn: usize) -> Self {
        Self {
            knn,
            unique: 0,
            prev: -1.0,
        }
    }

    /// Whether to keep `dist`. `false` means this row is finished: every
    /// later candidate is at least as far.
    #[inline]
    fn accept(&mut self, dist: f32) -> bool {
        let new_value = (dist - self.prev).abs() >= EPSILON;
        if self.unique < self.knn || !new_value {
            if new_value {
                self.unique += 1;
                self.prev = dist;
            }
            true
        } else {
            false
        }
    }
}

/// Candidates for one row, `(col, dist)` in ascending distance.
fn sorted_candidates(dists: &[f32], col_of: impl Fn(usize) -> usize) -> Vec<(usize, f32)> {
    sort_indexes(dists)
        .into_iter()
        .map(|idx| (col_of(idx), dists[idx]))
        .collect()
}

/// Merges two ascending lists. On equal distances `cross` goes first.
fn merge_ascending(
    cross: Vec<(usize, f32)>,
    own: Vec<(usize, f32)>,
) -> impl Iterator<Item = (usize, f32)> {
    let mut cross = cross.into_iter().peekable();
    let mut own = own.into_iter().peekable();
    std::iter::from_fn(move || match (cross.peek(), own.peek()) {
        (Some(&(_, c)), Some(&(_, o))) => {
            if c <= o {
                cross.next()
            } else {
                own.next()
            }
        }
        (Some(_), None) => cross.next(),
        (None, _) => own.next(),
    })
}

fn keep_nearest(
    row: usize,
    candidates: impl Iterator<Item = (usize, f32)>,
    knn: usize,
    out: &mut Vec<(usize, f32)>,
) {
    let mut cap = NeighbourCap::new(knn);
    for (col, dist) in candidates {
        if col == row {
            continue;
        }
        if !cap.accept(dist) {
            break;
        }
        out.push((col, dist));
    }
}

/// Adds `nq` query samples to a sparse graph over `nr` reference samples.
///
/// `qq` holds query-query distances (`nq` x `nq`), `qr` reference-query
/// distances (`nr` x `nq`). Queries become rows `nr..nr + nq` of the result.
/// Reference rows pick from their existing entries and their distances to
/// the queries; query rows pick from all other samples.
///
/// Rows are computed in parallel on the current rayon pool.
///
/// # Panics
///
/// If `qq` is not `nq` x `nq`.
pub fn extend(
    sparse_rr: &SparseCoo,
    qq: ArrayView2<f32>,
    qr: ArrayView2<f32>,
    knn: usize,
) -> SparseCoo {
    let (nr, nq) = qr.dim();
    assert_eq!(
        qq.dim(),
        (nq, nq),
        "query-query matrix must be {nq} x {nq} to match the reference-query matrix"
    );
    let n_total = nr + nq;
    let row_start = row_start_indices(sparse_rr, nr);

    let mut per_row: Vec<Vec<(usize, f32)>> = vec![Vec::new(); n_total];
    if n_total > 0 {
        let chunk = n_total.div_ceil(rayon::current_num_threads().max(1));
        per_row
            .par_chunks_mut(chunk)
            .enumerate()
            .for_each(|(chunk_idx, rows)| {
                for (offset, out) in rows.iter_mut().enumerate() {
                    let i = chunk_idx * chunk + offset;
                    let (cross, own) = if i < nr {
                        let range = SparseCoo::row_range(&row_start, i);
                        let cols = &sparse_rr.cols[range.clone()];
                        let cross_dists = qr.row(i).to_vec();
                        (
                            sorted_candidates(&cross_dists, |idx| idx + nr),
                            sorted_candidates(&sparse_rr.dists[range], |idx| cols[idx]),
                        )
                    } else {
                        let q = i - nr;
                        let cross_dists = qr.column(q).to_vec();
                        let own_dists = qq.row(q).to_vec();
                        (
                            sorted_candidates(&cross_dists, |idx| idx),
                            sorted_candidates(&own_dists, |idx| idx + nr),
                        )
                    };
                    keep_nearest(i, merge_ascending(cross, own), knn, out);
                }
            });
    }

    let graph = combine_rows(per_row);
    log::debug!(
        "Extended {} reference rows with {} queries: {} -> {} entries",
        nr,
        nq,
        sparse_rr.len(),
        graph.len()
    );
    graph
}

/// Re-sparsifies a graph over `n_samples` rows to at most `knn` distinct
/// neighbour distances per row.
pub fn lower_rank(sparse_rr: &SparseCoo, n_samples: usize, knn: usize) -> SparseCoo {
    let row_start = row_start_indices(sparse_rr, n_samples);
    let mut graph = SparseCoo::new();
    let mut kept = Vec::new();
    for i in 0..n_samples {
        let range = SparseCoo::row_range(&row_start, i);
        let cols = &sparse_rr.cols[range.clone()];
        let candidates = sorted_candidates(&sparse_rr.dists[range], |idx| cols[idx]);
        kept.clear();
        keep_nearest(i, candidates.into_iter(), knn, &mut kept);
        for &(j, dist) in &kept {
            graph.push(i, j, dist);
        }
    }
    graph
}
