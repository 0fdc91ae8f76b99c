//! Coordinate-list sparse distance graph and row helpers.

use std::ops::Range;

/// Sparse distance graph as three parallel vectors.
///
/// Entries are sorted by row, in any order within a row. Self pairs never
/// appear.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseCoo {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
    pub dists: Vec<f32>,
}

impl SparseCoo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: Vec::with_capacity(capacity),
            cols: Vec::with_capacity(capacity),
            dists: Vec::with_capacity(capacity),
        }
    }

    /// Builds a graph from `(row, col, dist)` triplets, stable-sorting by row.
    pub fn from_triplets(mut triplets: Vec<(usize, usize, f32)>) -> Self {
        triplets.sort_by_key(|&(row, _, _)| row);
        let mut graph = Self::with_capacity(triplets.len());
        for (row, col, dist) in triplets {
            graph.push(row, col, dist);
        }
        graph
    }

    #[inline]
    pub fn push(&mut self, row: usize, col: usize, dist: f32) {
        self.rows.push(row);
        self.cols.push(col);
        self.dists.push(dist);
    }

    pub fn len(&self) -> usize {
        self.dists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dists.is_empty()
    }

    pub fn is_row_sorted(&self) -> bool {
        self.rows.windows(2).all(|w| w[0] <= w[1])
    }

    /// Entries of one row, given a row-start index from [`row_start_indices`].
    pub fn row_range(row_start: &[usize], row: usize) -> Range<usize> {
        row_start[row]..row_start[row + 1]
    }

    pub fn triplets(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        self.rows
            .iter()
            .zip(&self.cols)
            .zip(&self.dists)
            .map(|((&row, &col), &dist)| (row, col, dist))
    }
}

/// Offsets where each of `n_rows` rows starts in a row-sorted graph.
///
/// The result has `n_rows + 1` entries; the last is the entry count. Rows
/// must be sorted and below `n_rows`. Debug builds panic on a row index
/// outside the graph; release builds fold such entries into the last row.
pub fn row_start_indices(graph: &SparseCoo, n_rows: usize) -> Vec<usize> {
    let rows = &graph.rows;
    debug_assert!(
        rows.last().map_or(true, |&r| r < n_rows),
        "graph has row {:?} but only {} rows were requested",
        rows.last(),
        n_rows
    );
    let mut row_start = vec![0; n_rows + 1];
    let mut cursor = 0;
    for row in 1..n_rows {
        while cursor < rows.len() && rows[cursor] < row {
            cursor += 1;
        }
        row_start[row] = cursor;
    }
    row_start[n_rows] = rows.len();
    row_start
}

/// Positions of `values` in ascending order. Equal values keep their
/// original order.
pub fn sort_indexes(values: &[f32]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    idx
}

/// Concatenates per-row `(col, dist)` buffers, in row order, into one graph.
pub fn combine_rows(per_row: Vec<Vec<(usize, f32)>>) -> SparseCoo {
    let len: usize = per_row.iter().map(Vec::len).sum();
    let mut graph = SparseCoo::with_capacity(len);
    for (row, neighbours) in per_row.into_iter().enumerate() {
        for (col, dist) in neighbours {
            graph.push(row, col, dist);
        }
    }
    graph
}
