//! Validation for geographic input.

use crate::error::{IndexError, Result};
use cellindex_types::point::Coordinates;
use cellindex_types::shape::{Circle, Rectangle, Shape};
use geo::Polygon;

/// Validates that coordinates are finite and inside the geographic range.
///
/// Latitude: [-90.0, 90.0], Longitude: [-180.0, 180.0]
///
/// # Examples
///
/// ```
/// use cellindex::compute::validation::validate_coordinates;
/// use cellindex::Coordinates;
///
/// assert!(validate_coordinates(&Coordinates::new(40.7128, -74.0060)).is_ok());
/// assert!(validate_coordinates(&Coordinates::new(95.0, -74.0)).is_err());
/// assert!(validate_coordinates(&Coordinates::new(40.0, 200.0)).is_err());
/// ```
pub fn validate_coordinates(coordinates: &Coordinates) -> Result<()> {
    let (lat, lng) = (coordinates.latitude, coordinates.longitude);

    if !lat.is_finite() {
        return Err(IndexError::InvalidArgument(format!(
            "Latitude must be finite, got: {}",
            lat
        )));
    }

    if !lng.is_finite() {
        return Err(IndexError::InvalidArgument(format!(
            "Longitude must be finite, got: {}",
            lng
        )));
    }

    if !(-90.0..=90.0).contains(&lat) {
        return Err(IndexError::InvalidArgument(format!(
            "Latitude out of range [-90.0, 90.0]: {}",
            lat
        )));
    }

    if !(-180.0..=180.0).contains(&lng) {
        return Err(IndexError::InvalidArgument(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            lng
        )));
    }

    Ok(())
}

/// Validates rectangle edges. `west > east` is allowed and means the
/// rectangle wraps the antimeridian; `south > north` is rejected.
pub fn validate_rectangle(rect: &Rectangle) -> Result<()> {
    validate_coordinates(&Coordinates::new(rect.south, rect.west))
        .map_err(|e| IndexError::InvalidArgument(format!("South-west corner: {}", e)))?;
    validate_coordinates(&Coordinates::new(rect.north, rect.east))
        .map_err(|e| IndexError::InvalidArgument(format!("North-east corner: {}", e)))?;

    if rect.south > rect.north {
        return Err(IndexError::InvalidArgument(format!(
            "Rectangle south ({}) is above north ({})",
            rect.south, rect.north
        )));
    }

    Ok(())
}

/// Validates a distance in meters: finite and non-negative.
///
/// # Examples
///
/// ```
/// use cellindex::compute::validation::validate_distance;
///
/// assert!(validate_distance(1000.0).is_ok());
/// assert!(validate_distance(0.0).is_ok());
/// assert!(validate_distance(-100.0).is_err());
/// assert!(validate_distance(f64::NAN).is_err());
/// ```
pub fn validate_distance(meters: f64) -> Result<()> {
    if !meters.is_finite() {
        return Err(IndexError::InvalidArgument(format!(
            "Distance must be finite, got: {}",
            meters
        )));
    }

    if meters < 0.0 {
        return Err(IndexError::InvalidArgument(format!(
            "Distance must not be negative, got: {}",
            meters
        )));
    }

    Ok(())
}

pub fn validate_circle(circle: &Circle) -> Result<()> {
    validate_coordinates(&circle.center)
        .map_err(|e| IndexError::InvalidArgument(format!("Circle center: {}", e)))?;
    validate_distance(circle.radius)
}

/// Validates all polygon coordinates (exterior and interior rings).
pub fn validate_polygon(polygon: &Polygon<f64>) -> Result<()> {
    if polygon.exterior().0.len() < 3 {
        return Err(IndexError::InvalidArgument(
            "Polygon exterior needs at least three points".to_string(),
        ));
    }

    for (idx, coord) in polygon.exterior().coords().enumerate() {
        validate_coordinates(&Coordinates::new(coord.y, coord.x)).map_err(|e| {
            IndexError::InvalidArgument(format!("Exterior ring point at index {}: {}", idx, e))
        })?;
    }

    for (ring_idx, interior) in polygon.interiors().iter().enumerate() {
        for (idx, coord) in interior.coords().enumerate() {
            validate_coordinates(&Coordinates::new(coord.y, coord.x)).map_err(|e| {
                IndexError::InvalidArgument(format!(
                    "Interior ring {} point at index {}: {}",
                    ring_idx, idx, e
                ))
            })?;
        }
    }

    Ok(())
}

pub fn validate_shape(shape: &Shape) -> Result<()> {
    match shape {
        Shape::Rectangle(rect) => validate_rectangle(rect),
        Shape::Circle(circle) => validate_circle(circle),
        Shape::Polygon(polygon) => validate_polygon(polygon),
    }
}

pub fn validate_max_results(max_results: usize) -> Result<()> {
    if max_results == 0 {
        return Err(IndexError::InvalidArgument(
            "max_results must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Sort keys must be comparable, so NaN is rejected.
pub fn validate_sort_key(sort_key: f64) -> Result<()> {
    if sort_key.is_nan() {
        return Err(IndexError::InvalidArgument(
            "Sort key must not be NaN".to_string(),
        ));
    }
    Ok(())
}

/// Keys are opaque but must be non-empty.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(IndexError::InvalidArgument("Key must not be empty".to_string()));
    }
    Ok(())
}
