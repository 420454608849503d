use foundation::{LngLat, OverlayKind};
use layers::{OverlayDescriptor, VectorPoint};
use serde::{Deserialize, Deserializer, Serialize};

use crate::CatalogError;

/// A historical map as stored by the map-data collaborator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapRecord {
    pub id: String,
    pub title: String,
    pub years: String,
    /// Rich-text description shown in the info modal; may embed footnotes.
    pub description: String,
    pub map_type: Option<OverlayKind>,
    pub raster_image: Option<String>,
    /// Four `"lng,lat"` strings: top-left, top-right, bottom-right, bottom-left.
    pub image_bounds_coords: Option<Vec<String>>,
    pub vector_points: Option<Vec<RecordPoint>>,
    pub center: Option<LngLat>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordPoint {
    pub coordinates: String,
    #[serde(deserialize_with = "loose_number")]
    pub bearing: f64,
    pub description: String,
    pub image: String,
    pub is_directional: bool,
}

impl From<&RecordPoint> for VectorPoint {
    fn from(p: &RecordPoint) -> Self {
        VectorPoint {
            coordinates: p.coordinates.clone(),
            bearing: p.bearing,
            caption: p.description.clone(),
            image: p.image.clone(),
            directional: p.is_directional,
        }
    }
}

impl MapRecord {
    /// Declared type, else whichever geometry the record carries.
    pub fn kind(&self) -> Option<OverlayKind> {
        self.map_type.or_else(|| {
            if self.image_bounds_coords.is_some() {
                Some(OverlayKind::Raster)
            } else if self.vector_points.is_some() {
                Some(OverlayKind::Vector)
            } else {
                None
            }
        })
    }

    /// Overlay for this record at `opacity`. Coordinates are not validated
    /// here; the reconciler skips descriptors it cannot draw.
    pub fn to_descriptor(&self, opacity: f64) -> Result<OverlayDescriptor, CatalogError> {
        let unrenderable = |reason: &str| CatalogError::Unrenderable {
            id: self.id.clone(),
            reason: reason.to_string(),
        };
        let descriptor = match self.kind() {
            Some(OverlayKind::Raster) => {
                let url = self
                    .raster_image
                    .clone()
                    .ok_or_else(|| unrenderable("raster map without image"))?;
                let corners = self
                    .image_bounds_coords
                    .clone()
                    .ok_or_else(|| unrenderable("raster map without corner coordinates"))?;
                OverlayDescriptor::raster(self.id.as_str(), url, corners)
            }
            Some(OverlayKind::Vector) => {
                let points = self
                    .vector_points
                    .as_deref()
                    .ok_or_else(|| unrenderable("vector map without points"))?;
                OverlayDescriptor::vector(self.id.as_str(), points.iter().map(VectorPoint::from).collect())
            }
            None => return Err(unrenderable("no geometry")),
        };
        let descriptor = descriptor.with_opacity(opacity);
        Ok(match self.center {
            Some(c) if c.is_finite() => descriptor.with_center(c),
            _ => descriptor,
        })
    }
}

// Bearings were entered as free text in older records.
fn loose_number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Number(f64),
        Text(String),
    }
    Ok(match Option::<Loose>::deserialize(d)? {
        Some(Loose::Number(n)) => n,
        Some(Loose::Text(s)) => s.trim().parse().unwrap_or(0.0),
        None => 0.0,
    })
}
