use foundation::{LngLat, OverlayKey, parse_lng_lat};
use serde_json::{Value, json};

use crate::descriptor::{OverlayBuildError, VectorPoint};
use crate::layer::{LayerId, SourceId};
use crate::surface::{LayerKind, LayerSpec, SourceSpec};
use crate::symbology::SymbologyConfig;

/// A pin with parsed coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PointFeature {
    pub position: LngLat,
    pub bearing: f64,
    pub caption: String,
    pub image: String,
    pub directional: bool,
}

impl PointFeature {
    pub fn parse(point: &VectorPoint) -> Result<Self, foundation::CoordError> {
        Ok(Self {
            position: parse_lng_lat(&point.coordinates)?,
            bearing: if point.bearing.is_finite() {
                point.bearing
            } else {
                0.0
            },
            caption: point.caption.clone(),
            image: point.image.clone(),
            directional: point.directional,
        })
    }

    pub fn to_geojson(&self) -> Value {
        json!({
            "type": "Feature",
            "geometry": {
                "type": "Point",
                "coordinates": self.position.to_array(),
            },
            "properties": {
                "bearing": self.bearing,
                "image": self.image,
                "caption": self.caption,
                "is_directional": self.directional,
            },
        })
    }
}

pub fn feature_collection(features: &[PointFeature]) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": features.iter().map(PointFeature::to_geojson).collect::<Vec<_>>(),
    })
}

/// GeoJSON source and symbol layer for one pin set.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorOverlay {
    pub source_id: SourceId,
    pub source: SourceSpec,
    pub layer: LayerSpec,
}

impl VectorOverlay {
    /// Fails on the first malformed pin; a pin set is all-or-nothing.
    pub fn build(
        key: &OverlayKey,
        points: &[VectorPoint],
        opacity: f64,
        symbology: &SymbologyConfig,
    ) -> Result<Self, OverlayBuildError> {
        if points.is_empty() {
            return Err(OverlayBuildError::NoPoints);
        }
        let features = points
            .iter()
            .enumerate()
            .map(|(index, p)| {
                PointFeature::parse(p).map_err(|source| OverlayBuildError::Point { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let source_id = SourceId::for_overlay(key);
        Ok(Self {
            source: SourceSpec::GeoJson {
                data: feature_collection(&features),
            },
            layer: LayerSpec {
                id: LayerId::for_overlay(key),
                source: source_id.clone(),
                kind: LayerKind::Symbol(symbology.symbol_layout()),
                opacity,
            },
            source_id,
        })
    }
}
