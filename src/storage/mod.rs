//! Storage backend abstraction for the index.
//!
//! Rows live in one ordered key space keyed by `(cell, sort_key, key)`, so a
//! range of cell ids maps onto one contiguous scan. Backends also keep a
//! reverse lookup from application key to composite keys, updated in the
//! same call as the row itself.

use crate::compute::cell::CellId;
use crate::compute::covering::CellRange;
use crate::error::Result;
use cellindex_types::filter::FilterKeys;
use cellindex_types::point::Coordinates;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::ops::Bound;
use std::time::SystemTime;

mod memory;

pub use memory::MemoryBackend;

/// Trait for storage backend implementations
///
/// Implementations must make each `put` and `delete` atomic with respect to
/// its reverse-lookup update. The index serializes calls through a lock, so
/// methods take `&mut self` for writes like the rest of the storage layer.
pub trait StorageBackend: Send + Sync {
    /// Insert or overwrite a row and record it as the newest copy of its key.
    fn put(&mut self, entry: &EntryKey, record: &IndexRecord) -> Result<()>;

    /// Remove a row and its reverse-lookup entry. `NotFound` if absent.
    fn delete(&mut self, entry: &EntryKey) -> Result<IndexRecord>;

    /// Newest live row stored for an application key.
    fn get_by_key(&self, key: &str) -> Result<Option<(EntryKey, IndexRecord)>>;

    /// Up to `limit` rows with cell ids in `range` and sort keys in
    /// `interval`, in composite-key order, strictly after `after`.
    fn scan_range(
        &self,
        range: &CellRange,
        interval: &SortInterval,
        limit: usize,
        after: Option<&EntryKey>,
    ) -> Result<ScanPage>;

    /// Number of stored rows.
    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn stats(&self) -> Result<StorageStats>;
}

/// An `f64` ordered by `total_cmp`, usable inside composite keys.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortKey(pub f64);

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for SortKey {}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for SortKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// Composite storage key. Orders by cell, then sort key, then key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryKey {
    pub cell: CellId,
    pub sort_key: SortKey,
    pub key: String,
}

impl EntryKey {
    pub fn new(cell: CellId, sort_key: f64, key: impl Into<String>) -> Self {
        Self {
            cell,
            sort_key: SortKey(sort_key),
            key: key.into(),
        }
    }

    /// Smallest possible key inside `cell`.
    pub fn lower_bound(cell: CellId) -> Self {
        Self::new(cell, f64::NEG_INFINITY, String::new())
    }
}

/// The value stored for one indexed point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub key: String,
    pub coordinates: Coordinates,
    pub filter_keys: FilterKeys,
    pub sort_key: f64,
    pub indexed_at: SystemTime,
}

/// Bounds on sort keys for a scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SortInterval {
    pub lower: Bound<f64>,
    pub upper: Bound<f64>,
}

impl SortInterval {
    /// No restriction.
    pub fn all() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    pub fn new(lower: Bound<f64>, upper: Bound<f64>) -> Self {
        Self { lower, upper }
    }

    /// `[start, end)`: the usual pagination shape.
    pub fn half_open(start: f64, end: f64) -> Self {
        Self::new(Bound::Included(start), Bound::Excluded(end))
    }

    pub fn at_least(start: f64) -> Self {
        Self::new(Bound::Included(start), Bound::Unbounded)
    }

    pub fn below(end: f64) -> Self {
        Self::new(Bound::Unbounded, Bound::Excluded(end))
    }

    pub fn contains(&self, value: f64) -> bool {
        let above = match self.lower {
            Bound::Included(lo) => value >= lo,
            Bound::Excluded(lo) => value > lo,
            Bound::Unbounded => true,
        };
        let below = match self.upper {
            Bound::Included(hi) => value <= hi,
            Bound::Excluded(hi) => value < hi,
            Bound::Unbounded => true,
        };
        above && below
    }
}

impl Default for SortInterval {
    fn default() -> Self {
        Self::all()
    }
}

/// One page of a range scan.
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    pub rows: Vec<(EntryKey, IndexRecord)>,
    /// Last returned key when more qualifying rows remain in the range.
    pub next: Option<EntryKey>,
}

/// Storage backend statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of stored rows
    pub entry_count: usize,
    /// Number of distinct application keys with at least one row
    pub key_count: usize,
    /// Number of put/delete operations performed
    pub operations_count: u64,
}
