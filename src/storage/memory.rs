//! In-memory storage backend implementation.

use super::{EntryKey, IndexRecord, ScanPage, SortInterval, StorageBackend, StorageStats};
use crate::compute::covering::CellRange;
use crate::error::{IndexError, Result};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::ops::Bound;

/// In-memory storage backend: an ordered row map plus a key lookup table.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    rows: BTreeMap<EntryKey, IndexRecord>,
    /// Composite keys per application key, oldest first.
    by_key: FxHashMap<String, SmallVec<[EntryKey; 1]>>,
    operations: u64,
}

impl MemoryBackend {
    /// Create a new in-memory storage backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with initial capacity hint for the key lookup table
    pub fn with_capacity(capacity: usize) -> Self {
        let mut backend = Self::new();
        backend.by_key.reserve(capacity);
        backend
    }
}

impl StorageBackend for MemoryBackend {
    fn put(&mut self, entry: &EntryKey, record: &IndexRecord) -> Result<()> {
        debug_assert_eq!(entry.key, record.key);
        self.rows.insert(entry.clone(), record.clone());

        let copies = self.by_key.entry(entry.key.clone()).or_default();
        copies.retain(|existing| existing != entry);
        copies.push(entry.clone());

        self.operations += 1;
        Ok(())
    }

    fn delete(&mut self, entry: &EntryKey) -> Result<IndexRecord> {
        let record = self.rows.remove(entry).ok_or_else(|| {
            IndexError::NotFound(format!(
                "no row for key {:?} in cell {}",
                entry.key, entry.cell
            ))
        })?;

        if let Some(copies) = self.by_key.get_mut(&entry.key) {
            copies.retain(|existing| existing != entry);
            if copies.is_empty() {
                self.by_key.remove(&entry.key);
            }
        }

        self.operations += 1;
        Ok(record)
    }

    fn get_by_key(&self, key: &str) -> Result<Option<(EntryKey, IndexRecord)>> {
        let newest = self
            .by_key
            .get(key)
            .and_then(|copies| copies.last())
            .and_then(|entry| {
                self.rows
                    .get(entry)
                    .map(|record| (entry.clone(), record.clone()))
            });
        Ok(newest)
    }

    fn scan_range(
        &self,
        range: &CellRange,
        interval: &SortInterval,
        limit: usize,
        after: Option<&EntryKey>,
    ) -> Result<ScanPage> {
        if limit == 0 {
            return Err(IndexError::InvalidArgument(
                "scan limit must be greater than zero".to_string(),
            ));
        }

        let lower = EntryKey::lower_bound(range.min);
        let start = match after {
            Some(after) if *after >= lower => Bound::Excluded(after.clone()),
            _ => Bound::Included(lower),
        };

        let mut page = ScanPage::default();
        for (entry, record) in self.rows.range((start, Bound::Unbounded)) {
            if entry.cell > range.max {
                break;
            }
            if !interval.contains(entry.sort_key.0) {
                continue;
            }
            if page.rows.len() == limit {
                page.next = page.rows.last().map(|(last, _)| last.clone());
                break;
            }
            page.rows.push((entry.clone(), record.clone()));
        }

        Ok(page)
    }

    fn len(&self) -> Result<usize> {
        Ok(self.rows.len())
    }

    fn stats(&self) -> Result<StorageStats> {
        Ok(StorageStats {
            entry_count: self.rows.len(),
            key_count: self.by_key.len(),
            operations_count: self.operations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::cell::CellId;
    use cellindex_types::filter::FilterKeys;
    use cellindex_types::point::Coordinates;
    use std::time::SystemTime;

    fn record(key: &str, sort_key: f64) -> IndexRecord {
        IndexRecord {
            key: key.to_string(),
            coordinates: Coordinates::new(0.0, 0.0),
            filter_keys: FilterKeys::new(),
            sort_key,
            indexed_at: SystemTime::UNIX_EPOCH,
        }
    }

    fn put(backend: &mut MemoryBackend, cell: u64, sort_key: f64, key: &str) -> EntryKey {
        let entry = EntryKey::new(CellId(cell), sort_key, key);
        backend.put(&entry, &record(key, sort_key)).unwrap();
        entry
    }

    #[test]
    fn test_memory_backend_basic_ops() {
        let mut backend = MemoryBackend::new();
        let entry = put(&mut backend, 9, 1.0, "a");

        assert_eq!(backend.len().unwrap(), 1);
        let (found, rec) = backend.get_by_key("a").unwrap().unwrap();
        assert_eq!(found, entry);
        assert_eq!(rec.key, "a");

        backend.delete(&entry).unwrap();
        assert!(backend.is_empty().unwrap());
        assert!(backend.get_by_key("a").unwrap().is_none());
        assert!(backend.delete(&entry).unwrap_err().is_not_found());
    }

    #[test]
    fn test_put_same_composite_key_overwrites() {
        let mut backend = MemoryBackend::new();
        put(&mut backend, 9, 1.0, "a");
        put(&mut backend, 9, 1.0, "a");

        let stats = backend.stats().unwrap();
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.key_count, 1);
        assert_eq!(stats.operations_count, 2);
    }

    #[test]
    fn test_reverse_lookup_tracks_newest_copy() {
        let mut backend = MemoryBackend::new();
        let old = put(&mut backend, 9, 1.0, "a");
        let new = put(&mut backend, 21, 1.0, "a");

        assert_eq!(backend.get_by_key("a").unwrap().unwrap().0, new);
        backend.delete(&new).unwrap();
        assert_eq!(backend.get_by_key("a").unwrap().unwrap().0, old);
    }

    #[test]
    fn test_scan_range_order_limit_and_cursor() {
        let mut backend = MemoryBackend::new();
        put(&mut backend, 5, 0.0, "x");
        let b = put(&mut backend, 9, 2.0, "b");
        let a = put(&mut backend, 9, 1.0, "a");
        let c = put(&mut backend, 11, 0.0, "c");
        put(&mut backend, 13, 0.0, "y");

        let range = CellRange::new(CellId(9), CellId(11));
        let page = backend
            .scan_range(&range, &SortInterval::all(), 2, None)
            .unwrap();
        let keys: Vec<_> = page.rows.iter().map(|(e, _)| e.clone()).collect();
        assert_eq!(keys, vec![a.clone(), b.clone()]);
        assert_eq!(page.next, Some(b.clone()));

        let page = backend
            .scan_range(&range, &SortInterval::all(), 2, Some(&b))
            .unwrap();
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].0, c);
        assert_eq!(page.next, None);
    }

    #[test]
    fn test_scan_range_exact_fit_has_no_next() {
        let mut backend = MemoryBackend::new();
        put(&mut backend, 9, 0.0, "a");
        put(&mut backend, 9, 0.0, "b");
        let page = backend
            .scan_range(
                &CellRange::new(CellId(1), CellId(15)),
                &SortInterval::all(),
                2,
                None,
            )
            .unwrap();
        assert_eq!(page.rows.len(), 2);
        assert!(page.next.is_none());
    }

    #[test]
    fn test_scan_range_sort_interval() {
        let mut backend = MemoryBackend::new();
        put(&mut backend, 9, 1.0, "a");
        put(&mut backend, 9, 3.0, "b");
        put(&mut backend, 9, 5.0, "c");
        let page = backend
            .scan_range(
                &CellRange::new(CellId(9), CellId(9)),
                &SortInterval::half_open(2.0, 5.0),
                10,
                None,
            )
            .unwrap();
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].0.key, "b");
    }

    #[test]
    fn test_scan_range_rejects_zero_limit() {
        let backend = MemoryBackend::new();
        let range = CellRange::new(CellId(1), CellId(3));
        assert!(
            backend
                .scan_range(&range, &SortInterval::all(), 0, None)
                .is_err()
        );
    }
}
