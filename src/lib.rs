//! Bounded-memory k-mer count filtering and sparse kNN distance graph
//! extension.
//!
//! Two independent halves:
//! - [`counter`], [`countmin`] and [`hash_counter`] decide whether a k-mer is
//!   frequent enough to be kept in a sketch;
//! - [`sparse`] and [`extend`] merge new dense distances into a sparse
//!   nearest-neighbour graph, or cut an existing graph down to fewer
//!   neighbours.

pub mod constants {
    include!(concat!(env!("OUT_DIR"), "/constants.rs"));
}

pub mod counter;
pub mod countmin;
pub mod extend;
pub mod filter;
pub mod hash_counter;
pub mod io;
pub mod kmer;
pub mod sparse;
pub mod stats;
pub mod utils;

pub use counter::{new_counter, CounterKind, KmerCounter};
pub use countmin::CountMin;
pub use extend::{extend, lower_rank, EPSILON};
pub use hash_counter::HashCounter;
pub use sparse::{row_start_indices, SparseCoo};
