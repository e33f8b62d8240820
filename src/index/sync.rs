//! Keeping the index in step with a document store.
//!
//! Hosts that own the authoritative copy of each point call `sync_point`
//! (or `sync_from`) after every write to that copy. A document without
//! coordinates, or no document at all, removes the point from the index.

use super::GeospatialIndex;
use super::mutation::remove_newest;
use crate::error::Result;
use crate::storage::StorageBackend;
use cellindex_types::point::PointDocument;
use std::collections::{BTreeMap, HashMap};

/// Reads the current document for a key from the host's store.
pub trait DocumentSource {
    fn load(&self, key: &str) -> Result<Option<PointDocument>>;
}

impl<F> DocumentSource for F
where
    F: Fn(&str) -> Result<Option<PointDocument>>,
{
    fn load(&self, key: &str) -> Result<Option<PointDocument>> {
        self(key)
    }
}

impl DocumentSource for HashMap<String, PointDocument> {
    fn load(&self, key: &str) -> Result<Option<PointDocument>> {
        Ok(self.get(key).cloned())
    }
}

impl DocumentSource for BTreeMap<String, PointDocument> {
    fn load(&self, key: &str) -> Result<Option<PointDocument>> {
        Ok(self.get(key).cloned())
    }
}

impl<B: StorageBackend> GeospatialIndex<B> {
    /// `remove`, treating a missing key as success. Returns whether a row
    /// was removed.
    pub fn remove_if_present(&self, key: &str) -> Result<bool> {
        match self.remove(key) {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Make the index hold exactly the given document for `key`.
    ///
    /// Every existing row for `key` is dropped and the document, if it has
    /// coordinates, is inserted, all under one write lock. An invalid
    /// document fails before anything is removed.
    pub fn sync_point(&self, key: &str, document: Option<&PointDocument>) -> Result<()> {
        let located = document.and_then(|doc| doc.coordinates.map(|at| (doc, at)));
        let row = located
            .map(|(doc, at)| self.prepare_row(key, at, doc.filter_keys.clone(), doc.sort_key))
            .transpose()?;

        let mut backend = self.backend.write();
        let mut removed = 0usize;
        while backend.get_by_key(key)?.is_some() {
            remove_newest(&mut *backend, key)?;
            removed += 1;
        }
        if let Some((entry, record)) = &row {
            backend.put(entry, record)?;
        }

        log::debug!(
            "synced {:?}: removed {} rows, indexed: {}",
            key,
            removed,
            row.is_some()
        );
        Ok(())
    }

    /// Load `key` from `source` and `sync_point` it.
    pub fn sync_from<S>(&self, source: &S, key: &str) -> Result<()>
    where
        S: DocumentSource + ?Sized,
    {
        let document = source.load(key)?;
        self.sync_point(key, document.as_ref())
    }
}
