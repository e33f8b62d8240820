//! Hierarchical cell identifiers.
//!
//! The world (longitude `[-180, 180]` by latitude `[-90, 90]`) is a quadtree.
//! At level `L` it is split into a `2^L x 2^L` grid of equal-angle cells. A
//! cell's grid position `(i, j)` is Morton-interleaved into a `2L`-bit path
//! and packed into a `u64` with a sentinel bit directly below the path:
//!
//! ```text
//! level L:  [ 3 zero bits | 2L path bits | 1 | 2(30-L) zero bits ]
//! ```
//!
//! With this layout every descendant of a cell has an id in
//! `[range_min, range_max]` of that cell, so a cell maps onto one contiguous
//! range of an ordered key space.

use crate::compute::validation::validate_coordinates;
use crate::error::{IndexError, Result};
use cellindex_types::point::Coordinates;
use cellindex_types::shape::Rectangle;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Finest level of the hierarchy.
pub const MAX_LEVEL: u8 = 30;

/// Number of low bits used by path plus sentinel at `MAX_LEVEL`.
const POS_BITS: u32 = 2 * MAX_LEVEL as u32 + 1;

/// A cell at some level of the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellId(pub u64);

impl CellId {
    /// The level-0 cell covering the whole world.
    pub const ROOT: CellId = CellId(1 << (POS_BITS - 1));

    /// Cell at `level` holding grid column `i` (longitude) and row `j` (latitude).
    pub fn from_level_ij(level: u8, i: u32, j: u32) -> Self {
        let shift = 2 * u32::from(MAX_LEVEL - level);
        let path = interleave(i, j);
        CellId((path << (shift + 1)) | (1u64 << shift))
    }

    /// Cell containing the given coordinates at `level`.
    ///
    /// Points on the north or east edge of the world fall into the last
    /// row or column.
    pub fn from_coordinates(coordinates: &Coordinates, level: u8) -> Self {
        let n = 1u64 << level;
        let scale = n as f64;
        let i = grid_index((coordinates.longitude + 180.0) / 360.0 * scale, n);
        let j = grid_index((coordinates.latitude + 90.0) / 180.0 * scale, n);
        Self::from_level_ij(level, i, j)
    }

    /// Lowest set bit of a cell id at `level`.
    #[inline]
    pub fn lsb_for_level(level: u8) -> u64 {
        1u64 << (2 * u32::from(MAX_LEVEL - level))
    }

    #[inline]
    pub fn lsb(&self) -> u64 {
        self.0 & self.0.wrapping_neg()
    }

    pub fn is_valid(&self) -> bool {
        self.0 != 0 && self.0 >> POS_BITS == 0 && self.lsb().trailing_zeros() % 2 == 0
    }

    pub fn level(&self) -> u8 {
        MAX_LEVEL.saturating_sub((self.0.trailing_zeros() / 2) as u8)
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.0 & 1 == 1
    }

    /// Smallest id among this cell's descendants.
    #[inline]
    pub fn range_min(&self) -> CellId {
        CellId(self.0 - (self.lsb() - 1))
    }

    /// Largest id among this cell's descendants.
    #[inline]
    pub fn range_max(&self) -> CellId {
        CellId(self.0 + (self.lsb() - 1))
    }

    /// Whether `other` is this cell or one of its descendants.
    pub fn contains(&self, other: CellId) -> bool {
        other >= self.range_min() && other <= self.range_max()
    }

    /// Ancestor at `level`. `level` must not exceed this cell's level.
    pub fn parent(&self, level: u8) -> CellId {
        debug_assert!(level <= self.level());
        let lsb = Self::lsb_for_level(level);
        CellId((self.0 & lsb.wrapping_neg()) | lsb)
    }

    /// The four children, in curve order.
    pub fn children(&self) -> [CellId; 4] {
        debug_assert!(!self.is_leaf());
        let lsb = self.lsb();
        let child_lsb = lsb >> 2;
        let first = self.0 - lsb + child_lsb;
        let step = child_lsb << 1;
        [
            CellId(first),
            CellId(first + step),
            CellId(first + 2 * step),
            CellId(first + 3 * step),
        ]
    }

    /// All descendants at `level`, in curve order.
    pub fn children_at_level(&self, level: u8) -> impl Iterator<Item = CellId> {
        debug_assert!(level >= self.level() && level <= MAX_LEVEL);
        let child_lsb = Self::lsb_for_level(level);
        let first = self.0 - self.lsb() + child_lsb;
        let step = child_lsb << 1;
        let count = 1u64 << (2 * u32::from(level - self.level()));
        (0..count).map(move |k| CellId(first + k * step))
    }

    /// Grid column and row of this cell at its own level.
    pub fn ij(&self) -> (u32, u32) {
        let shift = 2 * u32::from(MAX_LEVEL - self.level());
        let path = self.0 >> (shift + 1);
        (compact(path), compact(path >> 1))
    }

    /// Latitude/longitude bounds of the cell.
    pub fn bounds(&self) -> Rectangle {
        let level = self.level();
        let n = (1u64 << level) as f64;
        let (i, j) = self.ij();
        let lng_size = 360.0 / n;
        let lat_size = 180.0 / n;
        let west = -180.0 + f64::from(i) * lng_size;
        let south = -90.0 + f64::from(j) * lat_size;
        Rectangle::new(south + lat_size, south, west + lng_size, west)
    }

    /// Corners in SW, SE, NE, NW order.
    pub fn vertices(&self) -> [Coordinates; 4] {
        let b = self.bounds();
        [
            Coordinates::new(b.south, b.west),
            Coordinates::new(b.south, b.east),
            Coordinates::new(b.north, b.east),
            Coordinates::new(b.north, b.west),
        ]
    }

    /// Compact hex form with trailing zero nibbles removed.
    pub fn to_token(&self) -> String {
        if self.0 == 0 {
            return "X".to_string();
        }
        let hex = format!("{:016x}", self.0);
        hex.trim_end_matches('0').to_string()
    }

    pub fn from_token(token: &str) -> Result<Self> {
        if token.is_empty() || token.len() > 16 {
            return Err(IndexError::InvalidArgument(format!(
                "Cell token must be 1-16 hex digits, got {:?}",
                token
            )));
        }
        let padded = format!("{:0<16}", token);
        let id = u64::from_str_radix(&padded, 16).map_err(|e| {
            IndexError::InvalidArgument(format!("Cell token {:?} is not hex: {}", token, e))
        })?;
        let cell = CellId(id);
        if !cell.is_valid() {
            return Err(IndexError::InvalidArgument(format!(
                "Cell token {:?} does not name a valid cell",
                token
            )));
        }
        Ok(cell)
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_token())
    }
}

/// Cell containing `coordinates` at `level`, validating both.
///
/// # Examples
///
/// ```
/// use cellindex::compute::cell::cell_id_for;
/// use cellindex::Coordinates;
///
/// let dc = Coordinates::new(38.90, -77.03);
/// let fine = cell_id_for(&dc, 16)?;
/// let coarse = cell_id_for(&dc, 8)?;
/// assert_eq!(fine.level(), 16);
/// assert_eq!(fine.parent(8), coarse);
/// # Ok::<(), cellindex::IndexError>(())
/// ```
pub fn cell_id_for(coordinates: &Coordinates, level: u8) -> Result<CellId> {
    validate_coordinates(coordinates)?;
    if level > MAX_LEVEL {
        return Err(IndexError::InvalidArgument(format!(
            "Level must be at most {}, got {}",
            MAX_LEVEL, level
        )));
    }
    Ok(CellId::from_coordinates(coordinates, level))
}

fn grid_index(scaled: f64, n: u64) -> u32 {
    let idx = scaled.floor().max(0.0) as u64;
    idx.min(n - 1) as u32
}

/// Spreads the 32 bits of `v` onto the even bit positions of a `u64`.
fn spread(v: u32) -> u64 {
    let mut x = u64::from(v);
    x = (x | (x << 16)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x << 8)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x << 4)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x << 2)) & 0x3333_3333_3333_3333;
    x = (x | (x << 1)) & 0x5555_5555_5555_5555;
    x
}

/// Inverse of `spread`: gathers the even bits of `x`.
fn compact(x: u64) -> u32 {
    let mut x = x & 0x5555_5555_5555_5555;
    x = (x | (x >> 1)) & 0x3333_3333_3333_3333;
    x = (x | (x >> 2)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x >> 4)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x >> 8)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x >> 16)) & 0x0000_0000_FFFF_FFFF;
    x as u32
}

#[inline]
fn interleave(i: u32, j: u32) -> u64 {
    spread(i) | (spread(j) << 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_and_leaf_levels() {
        assert_eq!(CellId::ROOT.level(), 0);
        assert!(CellId::ROOT.is_valid());
        assert_eq!(CellId::ROOT.range_min(), CellId(1));
        assert_eq!(CellId::ROOT.range_max(), CellId((1 << 61) - 1));

        let leaf = CellId::from_coordinates(&Coordinates::new(10.0, 20.0), MAX_LEVEL);
        assert!(leaf.is_leaf());
        assert_eq!(leaf.level(), MAX_LEVEL);
        assert_eq!(leaf.range_min(), leaf);
        assert_eq!(leaf.range_max(), leaf);
    }

    #[test]
    fn test_spread_compact_inverse() {
        for v in [0u32, 1, 2, 0xABCD, 0x3FFF_FFFF, u32::MAX] {
            assert_eq!(compact(spread(v)), v);
        }
    }

    #[test]
    fn test_ij_roundtrip() {
        let cell = CellId::from_level_ij(12, 1234, 4000);
        assert_eq!(cell.level(), 12);
        assert_eq!(cell.ij(), (1234, 4000));
    }

    #[test]
    fn test_parent_contains_child() {
        let dc = Coordinates::new(38.90, -77.03);
        let cell = CellId::from_coordinates(&dc, 16);
        for level in 0..=16 {
            let parent = cell.parent(level);
            assert_eq!(parent.level(), level);
            assert!(parent.contains(cell));
            assert_eq!(parent, CellId::from_coordinates(&dc, level));
        }
    }

    #[test]
    fn test_children_partition_parent_range() {
        let parent = CellId::from_level_ij(5, 7, 9);
        let children = parent.children();
        assert_eq!(children[0].range_min(), parent.range_min());
        assert_eq!(children[3].range_max(), parent.range_max());
        for pair in children.windows(2) {
            assert_eq!(pair[0].range_max().0 + 1, pair[1].range_min().0);
        }
        for child in children {
            assert_eq!(child.level(), 6);
            assert_eq!(child.parent(5), parent);
        }

        let grandchildren: Vec<_> = parent.children_at_level(7).collect();
        assert_eq!(grandchildren.len(), 16);
        assert!(grandchildren.iter().all(|c| parent.contains(*c)));
        assert!(grandchildren.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_bounds_contain_source_point() {
        let point = Coordinates::new(-33.8688, 151.2093);
        for level in [0, 1, 5, 12, 20, 30] {
            let cell = CellId::from_coordinates(&point, level);
            assert!(cell.bounds().contains(&point), "level {}", level);
        }
    }

    #[test]
    fn test_world_edges_land_in_last_cells() {
        let ne = CellId::from_coordinates(&Coordinates::new(90.0, 180.0), 3);
        assert_eq!(ne.ij(), (7, 7));
        let sw = CellId::from_coordinates(&Coordinates::new(-90.0, -180.0), 3);
        assert_eq!(sw.ij(), (0, 0));
    }

    #[test]
    fn test_vertices_order() {
        let cell = CellId::from_level_ij(1, 1, 0);
        let [sw, se, ne, nw] = cell.vertices();
        assert_eq!((sw.latitude, sw.longitude), (-90.0, 0.0));
        assert_eq!((se.latitude, se.longitude), (-90.0, 180.0));
        assert_eq!((ne.latitude, ne.longitude), (0.0, 180.0));
        assert_eq!((nw.latitude, nw.longitude), (0.0, 0.0));
    }

    #[test]
    fn test_token_roundtrip() {
        let cell = CellId::from_coordinates(&Coordinates::new(40.71, -74.0), 14);
        let token = cell.to_token();
        assert!(!token.ends_with('0'));
        assert_eq!(CellId::from_token(&token).unwrap(), cell);
        assert_eq!(CellId::ROOT.to_token(), "1");
        assert!(CellId::from_token("zz").is_err());
        assert!(CellId::from_token("").is_err());
        assert!(CellId::from_token("ffffffffffffffff").is_err());
    }

    #[test]
    fn test_cell_id_for_validates() {
        assert!(cell_id_for(&Coordinates::new(91.0, 0.0), 10).is_err());
        assert!(cell_id_for(&Coordinates::new(0.0, 0.0), 31).is_err());
        assert!(cell_id_for(&Coordinates::new(0.0, 0.0), 30).is_ok());
    }
}
