//! The geospatial index handle.
//!
//! `GeospatialIndex` ties an `IndexConfig` to a storage backend and a clock.
//! Mutations live in `mutation` and `sync`, reads in `query` and `nearest`,
//! diagnostics in `debug`.

use crate::clock::{Clock, SystemClock};
use crate::compute::cell::CellId;
use crate::compute::covering::RegionCoverer;
use crate::config::IndexConfig;
use crate::error::Result;
use crate::storage::{EntryKey, IndexRecord, MemoryBackend, StorageBackend, StorageStats};
use cellindex_types::filter::FilterKeys;
use cellindex_types::point::Coordinates;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

mod cursor;
mod debug;
mod mutation;
mod nearest;
mod query;
mod sync;

pub use debug::DebugCell;
pub use mutation::DEFAULT_SORT_KEY;
pub use nearest::{NearestPage, NearestQuery, NearestResult};
pub use query::{QueryPage, QueryResult, SCAN_BATCH_SIZE, ShapeQuery};
pub use sync::DocumentSource;

/// Embedded geospatial index over a pluggable ordered store.
///
/// Thread-safe: reads share the backend lock, each mutation holds the write
/// lock for its whole lookup-and-write sequence. Wrap in `Arc` to share.
pub struct GeospatialIndex<B: StorageBackend = MemoryBackend> {
    config: IndexConfig,
    coverer: RegionCoverer,
    backend: RwLock<B>,
    clock: Arc<dyn Clock>,
}

impl GeospatialIndex<MemoryBackend> {
    /// In-memory index with default configuration.
    pub fn memory() -> Result<Self> {
        Self::memory_with_config(IndexConfig::default())
    }

    /// In-memory index with custom configuration.
    pub fn memory_with_config(config: IndexConfig) -> Result<Self> {
        Self::with_backend(config, MemoryBackend::new())
    }

    pub fn builder() -> crate::builder::IndexBuilder {
        crate::builder::IndexBuilder::new()
    }
}

impl<B: StorageBackend> GeospatialIndex<B> {
    /// Index over an existing backend, stamping with the system clock.
    pub fn with_backend(config: IndexConfig, backend: B) -> Result<Self> {
        Self::from_parts(config, backend, Arc::new(SystemClock))
    }

    pub(crate) fn from_parts(config: IndexConfig, backend: B, clock: Arc<dyn Clock>) -> Result<Self> {
        let coverer = RegionCoverer::new(&config)?;
        log::debug!(
            "index opened: levels {}..={} (effective {}), level_mod {}, max_cells {}",
            config.min_level,
            config.max_level,
            config.effective_max_level(),
            config.level_mod,
            config.max_cells
        );
        Ok(Self {
            config,
            coverer,
            backend: RwLock::new(backend),
            clock,
        })
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Backend statistics.
    pub fn stats(&self) -> Result<StorageStats> {
        self.backend.read().stats()
    }

    /// Number of stored rows, duplicates included.
    pub fn len(&self) -> Result<usize> {
        self.backend.read().len()
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.backend.read().is_empty()
    }

    /// Consume the index and hand back its backend.
    pub fn into_backend(self) -> B {
        self.backend.into_inner()
    }
}

impl<B: StorageBackend + fmt::Debug> fmt::Debug for GeospatialIndex<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeospatialIndex")
            .field("config", &self.config)
            .field("backend", &*self.backend.read())
            .finish_non_exhaustive()
    }
}

/// A stored point as returned by `get`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub key: String,
    pub coordinates: Coordinates,
    pub filter_keys: FilterKeys,
    pub sort_key: f64,
    /// Cell at the index's max level holding the point.
    pub cell: CellId,
    pub indexed_at: SystemTime,
}

impl From<(EntryKey, IndexRecord)> for IndexEntry {
    fn from((entry, record): (EntryKey, IndexRecord)) -> Self {
        Self {
            key: record.key,
            coordinates: record.coordinates,
            filter_keys: record.filter_keys,
            sort_key: record.sort_key,
            cell: entry.cell,
            indexed_at: record.indexed_at,
        }
    }
}
