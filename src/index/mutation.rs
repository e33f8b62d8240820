//! Insert, remove and point lookups.

use super::{GeospatialIndex, IndexEntry};
use crate::compute::cell::cell_id_for;
use crate::compute::validation::{validate_coordinates, validate_key, validate_sort_key};
use crate::error::{IndexError, Result};
use crate::storage::{EntryKey, IndexRecord, StorageBackend};
use cellindex_types::filter::FilterKeys;
use cellindex_types::point::Coordinates;

/// Sort key used when a point is inserted without one.
pub const DEFAULT_SORT_KEY: f64 = 0.0;

impl<B: StorageBackend> GeospatialIndex<B> {
    /// Index a point under `key`.
    ///
    /// The point is stored in its cell at the configured max level. Inserting
    /// a key that is already indexed does not replace the old row unless both
    /// land on the same cell and sort key; use `sync_point` for
    /// one-copy-per-key semantics.
    pub fn insert(
        &self,
        key: &str,
        coordinates: Coordinates,
        filter_keys: FilterKeys,
        sort_key: Option<f64>,
    ) -> Result<()> {
        let (entry, record) = self.prepare_row(key, coordinates, filter_keys, sort_key)?;
        self.backend.write().put(&entry, &record)?;
        log::trace!("inserted {:?} into cell {}", key, entry.cell);
        Ok(())
    }

    /// Remove the most recently inserted row for `key`.
    ///
    /// Returns `NotFound` when nothing is indexed under `key`.
    pub fn remove(&self, key: &str) -> Result<()> {
        let mut backend = self.backend.write();
        let removed = remove_newest(&mut *backend, key)?;
        log::trace!("removed {:?} at {:?}", key, removed.coordinates);
        Ok(())
    }

    /// The most recently inserted row for `key`, if any.
    pub fn get(&self, key: &str) -> Result<Option<IndexEntry>> {
        Ok(self.backend.read().get_by_key(key)?.map(IndexEntry::from))
    }

    /// Validate a point and build the row it is stored as.
    pub(super) fn prepare_row(
        &self,
        key: &str,
        coordinates: Coordinates,
        filter_keys: FilterKeys,
        sort_key: Option<f64>,
    ) -> Result<(EntryKey, IndexRecord)> {
        validate_key(key)?;
        validate_coordinates(&coordinates)?;
        let sort_key = sort_key.unwrap_or(DEFAULT_SORT_KEY);
        validate_sort_key(sort_key)?;

        let cell = cell_id_for(&coordinates, self.config.max_level)?;
        let entry = EntryKey::new(cell, sort_key, key);
        let record = IndexRecord {
            key: key.to_string(),
            coordinates,
            filter_keys,
            sort_key,
            indexed_at: self.clock.now(),
        };
        Ok((entry, record))
    }
}

/// Lookup and delete against an already-locked backend.
pub(super) fn remove_newest<B: StorageBackend + ?Sized>(
    backend: &mut B,
    key: &str,
) -> Result<IndexRecord> {
    let (entry, _) = backend
        .get_by_key(key)?
        .ok_or_else(|| IndexError::NotFound(format!("no index entry for key {:?}", key)))?;
    backend.delete(&entry)
}
