//! Compute layer: cell math, coverings and post-filter evaluation.
//!
//! Nothing in here touches storage. The index module combines these pieces
//! with a `StorageBackend` to plan and run queries.

pub mod algorithms;
pub mod cell;
pub mod covering;
pub mod region;
pub mod validation;

pub use algorithms::{distance_meters, matches_filters};
pub use cell::{CellId, MAX_LEVEL, cell_id_for};
pub use covering::{CellRange, RegionCoverer, covering_ranges};
pub use region::Region;
