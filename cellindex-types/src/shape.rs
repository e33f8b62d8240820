use crate::point::Coordinates;
use geo::{Distance, Haversine, Intersects, Polygon};
use serde::{Deserialize, Serialize};

/// A latitude/longitude rectangle given by its four edges in degrees.
///
/// When `west > east` the rectangle wraps across the antimeridian, e.g.
/// `west = 170, east = -170` spans the 20 degrees around longitude 180.
///
/// # Examples
///
/// ```
/// use cellindex_types::point::Coordinates;
/// use cellindex_types::shape::Rectangle;
///
/// let fiji = Rectangle::new(-15.0, -20.0, -178.0, 176.0);
/// assert!(fiji.wraps_antimeridian());
/// assert!(fiji.contains(&Coordinates::new(-17.7, 178.0)));
/// assert!(fiji.contains(&Coordinates::new(-17.7, -179.5)));
/// assert!(!fiji.contains(&Coordinates::new(-17.7, 0.0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Rectangle {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Whether the longitude span crosses the antimeridian.
    #[inline]
    pub fn wraps_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// Exact, edge-inclusive containment test.
    pub fn contains(&self, point: &Coordinates) -> bool {
        if point.latitude < self.south || point.latitude > self.north {
            return false;
        }
        if self.wraps_antimeridian() {
            point.longitude >= self.west || point.longitude <= self.east
        } else {
            point.longitude >= self.west && point.longitude <= self.east
        }
    }
}

/// A disc on the sphere: every point within `radius` meters of `center`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Coordinates,
    /// Radius in meters.
    pub radius: f64,
}

impl Circle {
    pub fn new(center: Coordinates, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Haversine distance test, edge-inclusive.
    pub fn contains(&self, point: &Coordinates) -> bool {
        Haversine.distance(self.center.to_point(), point.to_point()) <= self.radius
    }
}

/// A query region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Rectangle(Rectangle),
    Circle(Circle),
    /// Polygon in (x = longitude, y = latitude) coordinates. Polygons are
    /// tested in planar lat/lng space and must not cross the antimeridian.
    Polygon(Polygon<f64>),
}

impl Shape {
    /// Exact containment test, inclusive of the boundary.
    pub fn contains(&self, point: &Coordinates) -> bool {
        match self {
            Self::Rectangle(rect) => rect.contains(point),
            Self::Circle(circle) => circle.contains(point),
            Self::Polygon(polygon) => polygon.intersects(&point.to_point()),
        }
    }
}

impl From<Rectangle> for Shape {
    fn from(rect: Rectangle) -> Self {
        Self::Rectangle(rect)
    }
}

impl From<Circle> for Shape {
    fn from(circle: Circle) -> Self {
        Self::Circle(circle)
    }
}

impl From<Polygon<f64>> for Shape {
    fn from(polygon: Polygon<f64>) -> Self {
        Self::Polygon(polygon)
    }
}
