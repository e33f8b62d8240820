//! Covering inspection for map overlays.

use super::GeospatialIndex;
use crate::compute::cell::CellId;
use crate::compute::region::Region;
use crate::compute::validation::validate_shape;
use crate::error::Result;
use crate::storage::StorageBackend;
use cellindex_types::point::Coordinates;
use cellindex_types::shape::Shape;
use serde::{Deserialize, Serialize};

/// One covering cell with its corners, SW, SE, NE, NW.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugCell {
    pub token: String,
    pub level: u8,
    pub vertices: [Coordinates; 4],
}

impl From<CellId> for DebugCell {
    fn from(cell: CellId) -> Self {
        Self {
            token: cell.to_token(),
            level: cell.level(),
            vertices: cell.vertices(),
        }
    }
}

impl<B: StorageBackend> GeospatialIndex<B> {
    /// The cells a query for `shape` would scan.
    pub fn debug_cells(&self, shape: &Shape) -> Result<Vec<DebugCell>> {
        validate_shape(shape)?;
        let region = Region::from_shape(shape)?;
        Ok(self
            .coverer
            .covering(&region)
            .into_iter()
            .map(DebugCell::from)
            .collect())
    }

    /// `debug_cells` as a GeoJSON feature collection of closed polygons.
    #[cfg(feature = "geojson")]
    pub fn debug_cells_geojson(&self, shape: &Shape) -> Result<geojson::FeatureCollection> {
        use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};

        let features = self
            .debug_cells(shape)?
            .into_iter()
            .map(|cell| {
                let mut ring: Vec<Vec<f64>> = cell
                    .vertices
                    .iter()
                    .map(|v| vec![v.longitude, v.latitude])
                    .collect();
                ring.push(ring[0].clone());

                let mut properties = JsonObject::new();
                properties.insert("token".to_string(), cell.token.into());
                properties.insert("level".to_string(), cell.level.into());

                Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        })
    }
}
