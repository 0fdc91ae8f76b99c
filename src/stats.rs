//! Summaries logged by the command line tools.

use num_format::{Locale, ToFormattedString};

use crate::sparse::{row_start_indices, SparseCoo};

/// Per-row neighbour counts of a sparse graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphStats {
    pub n_rows: usize,
    pub entries: usize,
    pub empty_rows: usize,
    pub min_neighbours: usize,
    pub max_neighbours: usize,
}

impl GraphStats {
    pub fn compute(graph: &SparseCoo, n_rows: usize) -> Self {
        let row_start = row_start_indices(graph, n_rows);
        let sizes = row_start.windows(2).map(|w| w[1] - w[0]);
        let (mut min, mut max, mut empty) = (usize::MAX, 0, 0);
        for size in sizes {
            min = min.min(size);
            max = max.max(size);
            if size == 0 {
                empty += 1;
            }
        }
        Self {
            n_rows,
            entries: graph.len(),
            empty_rows: empty,
            min_neighbours: if n_rows == 0 { 0 } else { min },
            max_neighbours: max,
        }
    }

    pub fn log(&self, label: &str) {
        let loc = Locale::en;
        log::info!(
            "{}: {} rows, {} entries, neighbours per row min={} max={}, {} empty rows",
            label,
            self.n_rows.to_formatted_string(&loc),
            self.entries.to_formatted_string(&loc),
            self.min_neighbours,
            self.max_neighbours,
            self.empty_rows.to_formatted_string(&loc)
        );
    }
}

/// k-mer filtering outcome for one sample.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountStats {
    pub sample: String,
    pub total_kmers: u64,
    pub passing_kmers: u64,
    pub distinct_passing: u64,
}

impl CountStats {
    pub fn log(&self) {
        let loc = Locale::en;
        log::info!(
            "{}: {} k-mers, {} above minimum count ({} distinct)",
            self.sample,
            self.total_kmers.to_formatted_string(&loc),
            self.passing_kmers.to_formatted_string(&loc),
            self.distinct_passing.to_formatted_string(&loc)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_stats_per_row() {
        let graph = SparseCoo::from_triplets(vec![(0, 1, 0.1), (0, 2, 0.2), (2, 0, 0.2)]);
        let stats = GraphStats::compute(&graph, 4);
        assert_eq!(
            stats,
            GraphStats {
                n_rows: 4,
                entries: 3,
                empty_rows: 2,
                min_neighbours: 0,
                max_neighbours: 2,
            }
        );
        assert_eq!(GraphStats::compute(&SparseCoo::new(), 0).min_neighbours, 0);
    }
}
