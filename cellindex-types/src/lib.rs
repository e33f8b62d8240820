//! # cellindex-types
//!
//! Core value types for the cellindex geospatial index.
//!
//! This crate provides the plain data types shared between the index and the
//! application embedding it:
//!
//! - **Point types**: `Coordinates`, `PointDocument`
//! - **Shape types**: `Rectangle`, `Circle`, `Shape`
//! - **Filter types**: `FilterValue`, `FilterField`, `FilterKeys`, `FilterCondition`, `Occur`
//!
//! All types are serializable with Serde and built on top of the `geo` crate's
//! geometric primitives.
//!
//! ## Examples
//!
//! ```rust
//! use cellindex_types::point::Coordinates;
//! use cellindex_types::shape::Rectangle;
//!
//! let white_house = Coordinates::new(38.8977, -77.0365);
//! let dc = Rectangle::new(39.0, 38.8, -76.9, -77.2);
//! assert!(dc.contains(&white_house));
//! ```

pub mod filter;
pub mod point;
pub mod shape;

/// Mean Earth radius in meters, matching `geo::Haversine`.
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;
