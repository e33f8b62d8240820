//! Nearest-neighbour search by expanding discs.
//!
//! Each round covers a disc around the query point and scans only the id
//! ranges no earlier round has scanned. The radius doubles until enough
//! candidates fall inside it or the search limit is reached, so only points
//! within the final radius are known to be complete.

use super::query::SCAN_BATCH_SIZE;
use super::{GeospatialIndex, cursor};
use crate::compute::algorithms::{cmp_by_distance, distance_meters, matches_filters};
use crate::compute::covering::{CellRange, merge_ranges, subtract_ranges};
use crate::compute::region::{HALF_CIRCUMFERENCE_METERS, Region};
use crate::compute::validation::{validate_coordinates, validate_distance, validate_max_results};
use crate::error::{IndexError, Result};
use crate::storage::{EntryKey, IndexRecord, SortInterval, StorageBackend};
use cellindex_types::EARTH_RADIUS_METERS;
use cellindex_types::filter::FilterCondition;
use cellindex_types::point::Coordinates;
use cellindex_types::shape::Circle;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Lower bound on the starting radius.
const MIN_INITIAL_RADIUS_METERS: f64 = 100.0;

#[derive(Debug, Clone)]
pub struct NearestQuery {
    pub point: Coordinates,
    /// Results farther than this are never returned.
    pub max_distance: Option<f64>,
    pub max_results: usize,
    pub cursor: Option<String>,
    pub filtering: Vec<FilterCondition>,
    /// First search radius in meters; derived from the max level if unset.
    pub initial_radius: Option<f64>,
}

impl NearestQuery {
    pub fn new(point: Coordinates, max_results: usize) -> Self {
        Self {
            point,
            max_distance: None,
            max_results,
            cursor: None,
            filtering: Vec::new(),
            initial_radius: None,
        }
    }

    pub fn with_max_distance(mut self, meters: f64) -> Self {
        self.max_distance = Some(meters);
        self
    }

    pub fn with_filter(mut self, condition: FilterCondition) -> Self {
        self.filtering.push(condition);
        self
    }

    pub fn with_cursor(mut self, cursor: Option<String>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn with_initial_radius(mut self, meters: f64) -> Self {
        self.initial_radius = Some(meters);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestResult {
    pub key: String,
    pub coordinates: Coordinates,
    /// Haversine distance from the query point in meters.
    pub distance: f64,
}

/// Results nearest first, ties broken by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NearestPage {
    pub results: Vec<NearestResult>,
    pub next_cursor: Option<String>,
}

impl<B: StorageBackend> GeospatialIndex<B> {
    /// Up to `max_results` points nearest to `query.point`.
    pub fn nearest_points(&self, query: &NearestQuery) -> Result<NearestPage> {
        validate_coordinates(&query.point)?;
        validate_max_results(query.max_results)?;
        if let Some(max_distance) = query.max_distance {
            validate_distance(max_distance)?;
        }
        if let Some(radius) = query.initial_radius {
            validate_distance(radius)?;
            if radius == 0.0 {
                return Err(IndexError::InvalidArgument(
                    "initial_radius must be greater than zero".to_string(),
                ));
            }
        }

        let fingerprint = self.config.fingerprint();
        let resume = query
            .cursor
            .as_deref()
            .map(|token| cursor::decode_nearest(token, fingerprint))
            .transpose()?;

        let limit = query
            .max_distance
            .unwrap_or(HALF_CIRCUMFERENCE_METERS)
            .min(HALF_CIRCUMFERENCE_METERS);
        let mut radius = query
            .initial_radius
            .unwrap_or_else(|| self.default_initial_radius());
        if let Some(position) = &resume {
            radius = radius.max(position.radius);
        }
        radius = radius.min(limit);

        let mut visited: Vec<CellRange> = Vec::new();
        let mut candidates: Vec<(f64, EntryKey, IndexRecord)> = Vec::new();
        loop {
            let region = Region::from_circle(&Circle::new(query.point, radius))?;
            let ranges = self.coverer.covering_ranges(&region);

            for range in subtract_ranges(&ranges, &visited) {
                self.scan_all(&range, |entry, record| {
                    let distance = distance_meters(&query.point, &record.coordinates);
                    if distance > limit || !matches_filters(&record.filter_keys, &query.filtering)
                    {
                        return;
                    }
                    if let Some(position) = &resume {
                        let order = cmp_candidates(
                            (distance, &entry),
                            (position.last_distance, &position.last_entry),
                        );
                        if order != Ordering::Greater {
                            return;
                        }
                    }
                    candidates.push((distance, entry, record));
                })?;
            }

            visited.extend(ranges);
            visited = merge_ranges(visited);

            let within = candidates.iter().filter(|(d, _, _)| *d <= radius).count();
            log::debug!(
                "nearest: radius {:.1} m, {} candidates, {} within",
                radius,
                candidates.len(),
                within
            );
            if within >= query.max_results || radius >= limit {
                break;
            }
            radius = (radius * 2.0).min(limit);
        }

        candidates.retain(|(d, _, _)| *d <= radius);
        candidates.sort_by(|a, b| cmp_candidates((a.0, &a.1), (b.0, &b.1)));

        let more = candidates.len() > query.max_results
            || (candidates.len() == query.max_results && radius < limit);
        candidates.truncate(query.max_results);

        let next_cursor = match candidates.last() {
            Some((distance, entry, _)) if more => Some(cursor::encode_nearest(
                &cursor::NearestPosition {
                    last_distance: *distance,
                    last_entry: entry.clone(),
                    radius,
                },
                fingerprint,
            )?),
            _ => None,
        };

        let results: Vec<NearestResult> = candidates
            .into_iter()
            .map(|(distance, _, record)| NearestResult {
                key: record.key,
                coordinates: record.coordinates,
                distance,
            })
            .collect();

        Ok(NearestPage {
            results,
            next_cursor,
        })
    }

    /// Twice the latitude span of a max-level cell, in meters.
    fn default_initial_radius(&self) -> f64 {
        let span_degrees = 180.0 / (1u64 << self.config.max_level) as f64;
        (2.0 * span_degrees.to_radians() * EARTH_RADIUS_METERS).max(MIN_INITIAL_RADIUS_METERS)
    }

    /// Every row in `range`, batch by batch.
    fn scan_all(
        &self,
        range: &CellRange,
        mut visit: impl FnMut(EntryKey, IndexRecord),
    ) -> Result<()> {
        let interval = SortInterval::all();
        let mut after = None;
        loop {
            let page = self
                .backend
                .read()
                .scan_range(range, &interval, SCAN_BATCH_SIZE, after.as_ref())?;
            for (entry, record) in page.rows {
                visit(entry, record);
            }
            match page.next {
                Some(next) => after = Some(next),
                None => return Ok(()),
            }
        }
    }
}

/// `(distance, key)` order, then the full composite key so copies of one
/// key at the same distance still have a strict order.
fn cmp_candidates(a: (f64, &EntryKey), b: (f64, &EntryKey)) -> Ordering {
    cmp_by_distance((a.0, a.1.key.as_str()), (b.0, b.1.key.as_str())).then_with(|| a.1.cmp(b.1))
}
