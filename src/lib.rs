//! Embedded geospatial point index over an ordered key-value store.
//!
//! Points are stored under hierarchical cell ids, so rectangle, circle and
//! polygon queries become a handful of range scans followed by an exact
//! post-filter. Nearest-neighbour search grows a disc until it holds enough
//! candidates. Every paginated call returns an opaque cursor.
//!
//! ```rust
//! use cellindex::{Coordinates, FilterCondition, FilterKeys, GeospatialIndex};
//! use cellindex::{NearestQuery, Rectangle, ShapeQuery};
//!
//! let index = GeospatialIndex::memory()?;
//! let mut google = FilterKeys::new();
//! google.insert("provider".into(), "google".into());
//!
//! index.insert("dc_1", Coordinates::new(38.90, -77.03), google.clone(), None)?;
//! index.insert("dc_2", Coordinates::new(38.91, -77.02), google.clone(), None)?;
//! index.insert("nyc", Coordinates::new(40.71, -74.00), google, None)?;
//!
//! let dc = Rectangle::new(38.995, 38.79, -76.91, -77.12);
//! let page = index.query(
//!     &ShapeQuery::new(dc, 10).with_filter(FilterCondition::must("provider", "google")),
//! )?;
//! assert_eq!(page.results.len(), 2);
//!
//! let nearest = index.nearest_points(&NearestQuery::new(Coordinates::new(38.90, -77.03), 1))?;
//! assert_eq!(nearest.results[0].key, "dc_1");
//! # Ok::<(), cellindex::IndexError>(())
//! ```

pub mod builder;
pub mod clock;
pub mod compute;
pub mod config;
pub mod error;
pub mod index;
pub mod storage;

pub use builder::IndexBuilder;
pub use clock::{Clock, FixedClock, SystemClock};
pub use compute::{CellId, CellRange, cell_id_for, covering_ranges};
pub use config::IndexConfig;
pub use error::{IndexError, Result};
pub use index::{
    DebugCell, DocumentSource, GeospatialIndex, IndexEntry, NearestPage, NearestQuery,
    NearestResult, QueryPage, QueryResult, ShapeQuery,
};
pub use storage::{
    EntryKey, IndexRecord, MemoryBackend, ScanPage, SortInterval, SortKey, StorageBackend,
    StorageStats,
};

pub use cellindex_types::EARTH_RADIUS_METERS;
pub use cellindex_types::filter::{
    FilterCondition, FilterField, FilterKeys, FilterValue, Occur,
};
pub use cellindex_types::point::{Coordinates, PointDocument};
pub use cellindex_types::shape::{Circle, Rectangle, Shape};

pub use geo::Polygon;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{GeospatialIndex, IndexBuilder, IndexConfig, IndexError, Result};

    pub use crate::{Circle, Coordinates, Polygon, Rectangle, Shape};

    pub use crate::{FilterCondition, FilterKeys, PointDocument};

    pub use crate::{NearestQuery, ShapeQuery, SortInterval};

    pub use crate::{MemoryBackend, StorageBackend};
}
