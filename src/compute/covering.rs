//! Region coverings.
//!
//! A covering is a set of disjoint cells, at levels between `min_level` and
//! the effective max level, whose union contains the region. Coverings are
//! approximations: they may include area outside the region, never the
//! other way round. Query code turns them into sorted, merged id ranges for
//! range scans.

use crate::compute::cell::CellId;
use crate::compute::region::Region;
use crate::config::IndexConfig;
use crate::error::{IndexError, Result};
use cellindex_types::shape::Shape;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// An inclusive interval of cell ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellRange {
    pub min: CellId,
    pub max: CellId,
}

impl CellRange {
    pub fn new(min: CellId, max: CellId) -> Self {
        debug_assert!(min <= max);
        Self { min, max }
    }

    /// Every id at or below `cell` in the hierarchy.
    pub fn from_cell(cell: CellId) -> Self {
        Self::new(cell.range_min(), cell.range_max())
    }

    #[inline]
    pub fn contains(&self, cell: CellId) -> bool {
        cell >= self.min && cell <= self.max
    }
}

/// Computes coverings for one configuration.
#[derive(Debug, Clone, Copy)]
pub struct RegionCoverer {
    min_level: u8,
    max_level: u8,
    level_mod: u8,
    max_cells: usize,
}

impl RegionCoverer {
    pub fn new(config: &IndexConfig) -> Result<Self> {
        config.validate().map_err(IndexError::InvalidArgument)?;
        Ok(Self {
            min_level: config.min_level,
            max_level: config.effective_max_level(),
            level_mod: config.level_mod,
            max_cells: config.max_cells,
        })
    }

    /// Disjoint cells covering `region`, sorted by id.
    ///
    /// Candidates are refined coarsest first. A candidate is kept as-is when
    /// it lies fully inside the region, sits at the max level, or splitting it
    /// would push the cell count past `max_cells`. Cells above `min_level`
    /// are always split, so `min_level` can force more than `max_cells` cells.
    pub fn covering(&self, region: &Region) -> Vec<CellId> {
        let mut result = self.refine(region, false);
        result.sort_by_key(|cell| cell.range_min());
        log::trace!(
            "covering: {} cells between levels {} and {}",
            result.len(),
            self.min_level,
            self.max_level
        );
        result
    }

    /// Covering as merged, ascending id ranges.
    ///
    /// Interior cells coarser than `min_level` are kept whole here: their id
    /// range is the union of their descendants' ranges.
    pub fn covering_ranges(&self, region: &Region) -> Vec<CellRange> {
        merge_ranges(
            self.refine(region, true)
                .into_iter()
                .map(CellRange::from_cell)
                .collect(),
        )
    }

    fn refine(&self, region: &Region, coarse_interior: bool) -> Vec<CellId> {
        let mut result = Vec::new();
        let mut queue = BinaryHeap::new();

        for seed in self.seeds(region, coarse_interior, &mut result) {
            self.enqueue(seed, region, &mut result, &mut queue);
        }

        while let Some(Reverse((_, cell))) = queue.pop() {
            let child_level = (cell.level() + self.level_mod).min(self.max_level);
            let children: Vec<CellId> = cell
                .children_at_level(child_level)
                .filter(|child| region.intersects(&child.bounds()))
                .collect();

            if result.len() + queue.len() + children.len() > self.max_cells {
                result.push(cell);
                continue;
            }

            for child in children {
                self.enqueue(child, region, &mut result, &mut queue);
            }
        }
        result
    }

    /// Cells at `min_level` intersecting the region. With `coarse_interior`,
    /// cells fully inside the region go straight to `result` at whatever
    /// level they are found.
    fn seeds(
        &self,
        region: &Region,
        coarse_interior: bool,
        result: &mut Vec<CellId>,
    ) -> Vec<CellId> {
        let mut frontier = vec![CellId::ROOT];
        for _ in 0..self.min_level {
            if coarse_interior {
                let (inside, edge): (Vec<CellId>, Vec<CellId>) = frontier
                    .into_iter()
                    .partition(|cell| region.contains(&cell.bounds()));
                result.extend(inside);
                frontier = edge;
            }
            frontier = frontier
                .iter()
                .flat_map(|cell| cell.children())
                .filter(|child| region.intersects(&child.bounds()))
                .collect();
        }
        frontier
    }

    fn enqueue(
        &self,
        cell: CellId,
        region: &Region,
        result: &mut Vec<CellId>,
        queue: &mut BinaryHeap<Reverse<(u8, CellId)>>,
    ) {
        if cell.level() >= self.max_level || region.contains(&cell.bounds()) {
            result.push(cell);
        } else {
            queue.push(Reverse((cell.level(), cell)));
        }
    }
}

/// Covering ranges for `shape` under `config`.
///
/// # Examples
///
/// ```
/// use cellindex::compute::covering::covering_ranges;
/// use cellindex::{IndexConfig, Rectangle, Shape};
///
/// let dc = Shape::Rectangle(Rectangle::new(38.995, 38.79, -76.91, -77.12));
/// let ranges = covering_ranges(&dc, &IndexConfig::default())?;
/// assert!(!ranges.is_empty());
/// assert!(ranges.windows(2).all(|w| w[0].max < w[1].min));
/// # Ok::<(), cellindex::IndexError>(())
/// ```
pub fn covering_ranges(shape: &Shape, config: &IndexConfig) -> Result<Vec<CellRange>> {
    let region = Region::from_shape(shape)?;
    Ok(RegionCoverer::new(config)?.covering_ranges(&region))
}

/// Sorts ranges and merges overlapping or adjacent ones.
pub fn merge_ranges(mut ranges: Vec<CellRange>) -> Vec<CellRange> {
    ranges.sort();
    let mut merged: Vec<CellRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.min.0 <= last.max.0.saturating_add(1) => {
                if range.max > last.max {
                    last.max = range.max;
                }
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// Parts of `ranges` not covered by `visited`. Both inputs must be sorted
/// and disjoint, as produced by `merge_ranges`.
pub fn subtract_ranges(ranges: &[CellRange], visited: &[CellRange]) -> Vec<CellRange> {
    let mut out = Vec::new();
    let mut next = 0;
    for range in ranges {
        let end = range.max.0;
        let mut start = range.min.0;
        while next < visited.len() && visited[next].max.0 < start {
            next += 1;
        }

        let mut exhausted = false;
        while let Some(v) = visited.get(next) {
            if v.min.0 > end {
                break;
            }
            if v.min.0 > start {
                out.push(CellRange::new(CellId(start), CellId(v.min.0 - 1)));
            }
            if v.max.0 >= end {
                exhausted = true;
                break;
            }
            start = v.max.0 + 1;
            next += 1;
        }

        if !exhausted {
            out.push(CellRange::new(CellId(start), CellId(end)));
        }
    }
    out
}
