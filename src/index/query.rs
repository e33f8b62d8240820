//! Shape queries: rectangle, circle and polygon containment with filters.

use super::{GeospatialIndex, cursor};
use crate::compute::algorithms::matches_filters;
use crate::compute::region::Region;
use crate::compute::validation::{validate_max_results, validate_shape};
use crate::error::{IndexError, Result};
use crate::storage::{EntryKey, SortInterval, StorageBackend};
use cellindex_types::filter::FilterCondition;
use cellindex_types::point::Coordinates;
use cellindex_types::shape::Shape;
use serde::{Deserialize, Serialize};

/// Rows fetched from storage per scan call.
pub const SCAN_BATCH_SIZE: usize = 256;

/// A paginated containment query.
#[derive(Debug, Clone)]
pub struct ShapeQuery {
    pub shape: Shape,
    pub filtering: Vec<FilterCondition>,
    pub sort_interval: SortInterval,
    pub max_results: usize,
    /// Token from a previous page's `next_cursor`.
    pub cursor: Option<String>,
    /// Stop after examining this many stored rows, matching or not.
    pub scan_budget: Option<usize>,
}

impl ShapeQuery {
    pub fn new(shape: impl Into<Shape>, max_results: usize) -> Self {
        Self {
            shape: shape.into(),
            filtering: Vec::new(),
            sort_interval: SortInterval::all(),
            max_results,
            cursor: None,
            scan_budget: None,
        }
    }

    pub fn with_filter(mut self, condition: FilterCondition) -> Self {
        self.filtering.push(condition);
        self
    }

    pub fn with_sort_interval(mut self, interval: SortInterval) -> Self {
        self.sort_interval = interval;
        self
    }

    pub fn with_cursor(mut self, cursor: Option<String>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn with_scan_budget(mut self, budget: usize) -> Self {
        self.scan_budget = Some(budget);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub key: String,
    pub coordinates: Coordinates,
    pub sort_key: f64,
}

/// One page of shape query results, ordered by cell, sort key, then key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryPage {
    pub results: Vec<QueryResult>,
    /// Present only when the scan stopped early with rows left to examine.
    pub next_cursor: Option<String>,
}

impl<B: StorageBackend> GeospatialIndex<B> {
    /// Points inside `query.shape` that pass its filters.
    ///
    /// Scans the covering ranges of the shape in id order and post-filters
    /// each row. Pages are read-committed: a point moved between two calls
    /// may be missed or returned twice.
    pub fn query(&self, query: &ShapeQuery) -> Result<QueryPage> {
        validate_shape(&query.shape)?;
        validate_max_results(query.max_results)?;
        if query.scan_budget == Some(0) {
            return Err(IndexError::InvalidArgument(
                "scan_budget must be greater than zero".to_string(),
            ));
        }

        let region = Region::from_shape(&query.shape)?;
        let ranges = self.coverer.covering_ranges(&region);
        let fingerprint = self.config.fingerprint();

        let mut resume = query
            .cursor
            .as_deref()
            .map(|token| cursor::decode_query(token, fingerprint))
            .transpose()?;
        let first_range = match &resume {
            Some(entry) => ranges
                .iter()
                .position(|range| range.contains(entry.cell))
                .ok_or_else(|| {
                    log::warn!("rejected cursor: cell {} outside the covering", entry.cell);
                    IndexError::InvalidCursor(
                        "cursor position is outside this query's covering".to_string(),
                    )
                })?,
            None => 0,
        };
        log::debug!(
            "shape query: {} ranges, resuming at range {}",
            ranges.len(),
            first_range
        );

        let budget = query.scan_budget.unwrap_or(usize::MAX);
        let mut results = Vec::new();
        let mut examined = 0usize;
        let mut last_visited: Option<EntryKey> = None;
        let mut stopped = false;

        'ranges: for range in &ranges[first_range..] {
            let mut after = resume.take();
            loop {
                let page = self.backend.read().scan_range(
                    range,
                    &query.sort_interval,
                    SCAN_BATCH_SIZE,
                    after.as_ref(),
                )?;
                log::trace!("scanned {} rows in {:?}", page.rows.len(), range);

                for (entry, record) in page.rows {
                    if results.len() >= query.max_results || examined >= budget {
                        stopped = true;
                        break 'ranges;
                    }
                    examined += 1;
                    if query.shape.contains(&record.coordinates)
                        && matches_filters(&record.filter_keys, &query.filtering)
                    {
                        results.push(QueryResult {
                            key: record.key,
                            coordinates: record.coordinates,
                            sort_key: record.sort_key,
                        });
                    }
                    last_visited = Some(entry);
                }

                match page.next {
                    Some(next) => after = Some(next),
                    None => break,
                }
            }
        }

        let next_cursor = match (stopped, &last_visited) {
            (true, Some(entry)) => Some(cursor::encode_query(entry, fingerprint)?),
            _ => None,
        };
        log::debug!(
            "shape query: {} results from {} rows, more: {}",
            results.len(),
            examined,
            next_cursor.is_some()
        );

        Ok(QueryPage {
            results,
            next_cursor,
        })
    }
}
