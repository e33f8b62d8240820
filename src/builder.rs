//! Index builder for flexible configuration
//!
//! Assembles a configuration, a storage backend and a clock into a
//! `GeospatialIndex`. The configuration is validated once, at `build`.

use crate::clock::{Clock, SystemClock};
use crate::config::IndexConfig;
use crate::error::Result;
use crate::index::GeospatialIndex;
use crate::storage::{MemoryBackend, StorageBackend};
use std::sync::Arc;

/// Builder for an index with a custom backend, clock or configuration.
pub struct IndexBuilder<B: StorageBackend = MemoryBackend> {
    config: IndexConfig,
    backend: B,
    clock: Arc<dyn Clock>,
}

impl IndexBuilder<MemoryBackend> {
    /// Create a new builder with default in-memory configuration.
    pub fn new() -> Self {
        Self {
            config: IndexConfig::default(),
            backend: MemoryBackend::new(),
            clock: Arc::new(SystemClock),
        }
    }
}

impl<B: StorageBackend> IndexBuilder<B> {
    /// Set the index configuration.
    pub fn config(mut self, config: IndexConfig) -> Self {
        self.config = config;
        self
    }

    /// Store rows in `backend` instead of memory.
    pub fn backend<T: StorageBackend>(self, backend: T) -> IndexBuilder<T> {
        IndexBuilder {
            config: self.config,
            backend,
            clock: self.clock,
        }
    }

    /// Stamp `indexed_at` from `clock`.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn max_level(mut self, level: u8) -> Self {
        self.config = self.config.with_max_level(level);
        self
    }

    pub fn min_level(mut self, level: u8) -> Self {
        self.config = self.config.with_min_level(level);
        self
    }

    /// Build the index.
    pub fn build(self) -> Result<GeospatialIndex<B>> {
        GeospatialIndex::from_parts(self.config, self.backend, self.clock)
    }
}

impl Default for IndexBuilder<MemoryBackend> {
    fn default() -> Self {
        Self::new()
    }
}
