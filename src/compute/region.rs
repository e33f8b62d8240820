//! Query regions as unions of non-wrapping latitude/longitude rectangles.
//!
//! Coverings are computed against these rectangles. Shapes are reduced to
//! rectangles that contain them; exactness is restored by the post-filter.

use crate::compute::validation::{validate_circle, validate_polygon, validate_rectangle};
use crate::error::{IndexError, Result};
use cellindex_types::EARTH_RADIUS_METERS;
use cellindex_types::shape::{Circle, Rectangle, Shape};
use geo::{BoundingRect, Polygon};
use smallvec::SmallVec;
use std::f64::consts::{FRAC_PI_2, PI};

/// Slack, in degrees, applied when comparing cell bounds against a region so
/// that float rounding in cell assignment never drops a boundary point.
const EDGE_SLACK_DEGREES: f64 = 1e-9;

/// Half the Earth's circumference; a disc this large covers the sphere.
pub const HALF_CIRCUMFERENCE_METERS: f64 = PI * EARTH_RADIUS_METERS;

/// A union of rectangles, none of which crosses the antimeridian.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    parts: SmallVec<[Rectangle; 2]>,
}

impl Region {
    /// The whole sphere.
    pub fn world() -> Self {
        Self::single(Rectangle::new(90.0, -90.0, 180.0, -180.0))
    }

    fn single(rect: Rectangle) -> Self {
        let mut parts = SmallVec::new();
        parts.push(rect);
        Self { parts }
    }

    /// Region of an arbitrary shape after validation.
    pub fn from_shape(shape: &Shape) -> Result<Self> {
        match shape {
            Shape::Rectangle(rect) => Self::from_rectangle(rect),
            Shape::Circle(circle) => Self::from_circle(circle),
            Shape::Polygon(polygon) => Self::from_polygon(polygon),
        }
    }

    /// A rectangle, split in two if it wraps the antimeridian.
    pub fn from_rectangle(rect: &Rectangle) -> Result<Self> {
        validate_rectangle(rect)?;
        if rect.wraps_antimeridian() {
            let mut parts = SmallVec::new();
            parts.push(Rectangle::new(rect.north, rect.south, 180.0, rect.west));
            parts.push(Rectangle::new(rect.north, rect.south, rect.east, -180.0));
            Ok(Self { parts })
        } else {
            Ok(Self::single(*rect))
        }
    }

    /// Bounding rectangle(s) of a disc.
    ///
    /// A disc reaching a pole spans every longitude in its latitude band; a
    /// disc whose longitude span crosses the antimeridian is split.
    pub fn from_circle(circle: &Circle) -> Result<Self> {
        validate_circle(circle)?;
        Ok(Self::disc_bounds(circle))
    }

    fn disc_bounds(circle: &Circle) -> Self {
        // Pad so the haversine edge is always inside the bounds.
        let angular = circle.radius / EARTH_RADIUS_METERS * (1.0 + 1e-9) + 1e-12;
        if angular >= PI {
            return Self::world();
        }

        let lat = circle.center.latitude.to_radians();
        let lng = circle.center.longitude;
        let lat_lo = lat - angular;
        let lat_hi = lat + angular;

        if lat_hi >= FRAC_PI_2 || lat_lo <= -FRAC_PI_2 {
            let north = if lat_hi >= FRAC_PI_2 {
                90.0
            } else {
                lat_hi.to_degrees()
            };
            let south = if lat_lo <= -FRAC_PI_2 {
                -90.0
            } else {
                lat_lo.to_degrees()
            };
            return Self::single(Rectangle::new(north, south, 180.0, -180.0));
        }

        let north = lat_hi.to_degrees();
        let south = lat_lo.to_degrees();
        let dlng = (angular.sin() / lat.cos()).min(1.0).asin().to_degrees();
        let west = lng - dlng;
        let east = lng + dlng;

        if east - west >= 360.0 {
            return Self::single(Rectangle::new(north, south, 180.0, -180.0));
        }

        if west < -180.0 {
            let mut parts = SmallVec::new();
            parts.push(Rectangle::new(north, south, 180.0, west + 360.0));
            parts.push(Rectangle::new(north, south, east, -180.0));
            Self { parts }
        } else if east > 180.0 {
            let mut parts = SmallVec::new();
            parts.push(Rectangle::new(north, south, 180.0, west));
            parts.push(Rectangle::new(north, south, east - 360.0, -180.0));
            Self { parts }
        } else {
            Self::single(Rectangle::new(north, south, east, west))
        }
    }

    /// Bounding rectangle of a polygon in lat/lng space.
    pub fn from_polygon(polygon: &Polygon<f64>) -> Result<Self> {
        validate_polygon(polygon)?;
        let rect = polygon.bounding_rect().ok_or_else(|| {
            IndexError::InvalidArgument("Polygon has no bounding rectangle".to_string())
        })?;
        Ok(Self::single(Rectangle::new(
            rect.max().y,
            rect.min().y,
            rect.max().x,
            rect.min().x,
        )))
    }

    pub fn parts(&self) -> &[Rectangle] {
        &self.parts
    }

    /// Whether a cell with these bounds may hold a point of the region.
    pub fn intersects(&self, cell: &Rectangle) -> bool {
        self.parts.iter().any(|part| {
            cell.south <= part.north + EDGE_SLACK_DEGREES
                && cell.north >= part.south - EDGE_SLACK_DEGREES
                && cell.west <= part.east + EDGE_SLACK_DEGREES
                && cell.east >= part.west - EDGE_SLACK_DEGREES
        })
    }

    /// Whether a cell with these bounds lies entirely inside one part.
    pub fn contains(&self, cell: &Rectangle) -> bool {
        self.parts.iter().any(|part| {
            cell.south >= part.south
                && cell.north <= part.north
                && cell.west >= part.west
                && cell.east <= part.east
        })
    }
}
