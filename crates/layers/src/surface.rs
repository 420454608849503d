//! Operations the core invokes on the interactive map.
//!
//! The render surface is the only shared mutable resource. Sources, layers
//! and paint values on it are written exclusively by the
//! [`Reconciler`](crate::Reconciler); camera moves and icon registration go
//! through [`MapView`](crate::MapView).

use foundation::{LngLat, LngLatBounds};
use serde_json::{Map, Value};

use crate::layer::{LayerId, SourceId};
use crate::symbology::{PaintProperty, SymbolLayout};

#[derive(Debug, Clone, PartialEq)]
pub enum SourceSpec {
    /// Image stretched over four corners (top-left, top-right, bottom-right, bottom-left).
    Image {
        url: String,
        coordinates: [[f64; 2]; 4],
    },
    /// GeoJSON `FeatureCollection`.
    GeoJson { data: Value },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerKind {
    Raster,
    Symbol(SymbolLayout),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub id: LayerId,
    pub source: SourceId,
    pub kind: LayerKind,
    pub opacity: f64,
}

impl LayerSpec {
    pub fn opacity_property(&self) -> PaintProperty {
        match self.kind {
            LayerKind::Raster => PaintProperty::RasterOpacity,
            LayerKind::Symbol(_) => PaintProperty::IconOpacity,
        }
    }
}

/// Screen-space padding in pixels.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Padding {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Padding {
    pub fn uniform(px: f64) -> Self {
        Self {
            top: px,
            bottom: px,
            left: px,
            right: px,
        }
    }
}

/// A feature hit by a click on a subscribed layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickedFeature {
    pub layer: LayerId,
    pub coordinates: LngLat,
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub at: LngLat,
    pub html: String,
    pub max_width_px: u32,
}

/// Invoked by the surface for clicks on a layer; a returned popup is shown.
pub type ClickHandler = Box<dyn Fn(&ClickedFeature) -> Option<Popup>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    DuplicateSource(String),
    DuplicateLayer(String),
    UnknownSource(String),
    UnknownLayer(String),
    /// Removing a source that a layer still draws from.
    SourceInUse { source: String, layer: String },
    Backend(String),
}

impl std::fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurfaceError::DuplicateSource(id) => write!(f, "source already exists: {id}"),
            SurfaceError::DuplicateLayer(id) => write!(f, "layer already exists: {id}"),
            SurfaceError::UnknownSource(id) => write!(f, "unknown source: {id}"),
            SurfaceError::UnknownLayer(id) => write!(f, "unknown layer: {id}"),
            SurfaceError::SourceInUse { source, layer } => {
                write!(f, "source {source} is still used by layer {layer}")
            }
            SurfaceError::Backend(msg) => write!(f, "render surface error: {msg}"),
        }
    }
}

impl std::error::Error for SurfaceError {}

pub trait RenderSurface {
    fn add_source(&mut self, id: &SourceId, spec: SourceSpec) -> Result<(), SurfaceError>;

    /// Must only be called once no layer references `id`.
    fn remove_source(&mut self, id: &SourceId) -> Result<(), SurfaceError>;

    /// Adds `spec` directly below `before`, or on top when `before` is `None`.
    fn add_layer(&mut self, spec: LayerSpec, before: Option<&LayerId>) -> Result<(), SurfaceError>;

    fn remove_layer(&mut self, id: &LayerId) -> Result<(), SurfaceError>;

    fn set_paint_property(
        &mut self,
        layer: &LayerId,
        property: PaintProperty,
        value: f64,
    ) -> Result<(), SurfaceError>;

    /// Subscriptions are keyed by layer name and outlive removal of the layer
    /// and style resets, so callers subscribe at most once per name.
    fn on_feature_click(&mut self, layer: &LayerId, handler: ClickHandler);

    /// Registers a named style image. Re-registering an existing name is a no-op.
    fn add_icon(&mut self, name: &str, asset: &str) -> Result<(), SurfaceError>;

    fn fly_to(&mut self, center: LngLat, zoom: Option<f64>);

    fn fit_bounds(&mut self, bounds: LngLatBounds, padding: Padding);
}
