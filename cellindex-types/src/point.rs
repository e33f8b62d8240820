use crate::filter::FilterKeys;
use geo::Point;
use serde::{Deserialize, Serialize};

/// A geographic location in degrees.
///
/// Latitude comes first, matching how the host application stores place
/// locations. Conversion to `geo::Point` maps longitude to `x` and latitude
/// to `y`.
///
/// # Examples
///
/// ```
/// use cellindex_types::point::Coordinates;
///
/// let nyc = Coordinates::new(40.7128, -74.0060);
/// assert_eq!(nyc.to_point().x(), -74.0060);
/// assert_eq!(nyc.to_point().y(), 40.7128);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Create coordinates from latitude and longitude in degrees.
    #[inline]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and inside the geographic range.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Convert into a `geo::Point` (x = longitude, y = latitude).
    #[inline]
    pub fn to_point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

impl From<Point<f64>> for Coordinates {
    fn from(point: Point<f64>) -> Self {
        Self::new(point.y(), point.x())
    }
}

impl From<Coordinates> for Point<f64> {
    fn from(coordinates: Coordinates) -> Self {
        coordinates.to_point()
    }
}

/// The attributes of an indexable record as the host application sees them.
///
/// `coordinates` is optional because records in the host may lack a
/// location; syncing such a record removes it from the index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointDocument {
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub filter_keys: FilterKeys,
    #[serde(default)]
    pub sort_key: Option<f64>,
}

impl PointDocument {
    pub fn new(coordinates: Coordinates) -> Self {
        Self {
            coordinates: Some(coordinates),
            ..Default::default()
        }
    }

    pub fn with_filter_keys(mut self, filter_keys: FilterKeys) -> Self {
        self.filter_keys = filter_keys;
        self
    }

    pub fn with_sort_key(mut self, sort_key: f64) -> Self {
        self.sort_key = Some(sort_key);
        self
    }
}
