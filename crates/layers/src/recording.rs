//! In-memory [`RenderSurface`] that records every call.
//!
//! It enforces the rules a real tile-map surface enforces (no duplicate
//! sources or layers, no removing a source that a layer still uses) and keeps
//! the layer stack in draw order, so tests can assert on ordering and z-order.

use std::collections::{BTreeMap, BTreeSet};

use foundation::{LngLat, LngLatBounds};
use serde_json::{Map, Value};

use crate::layer::{LayerId, SourceId};
use crate::surface::{
    ClickHandler, ClickedFeature, LayerSpec, Padding, Popup, RenderSurface, SourceSpec,
    SurfaceError,
};
use crate::symbology::PaintProperty;

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    AddSource(String),
    RemoveSource(String),
    AddLayer { id: String, before: Option<String> },
    RemoveLayer(String),
    SetPaint {
        layer: String,
        property: &'static str,
        value: f64,
    },
    SubscribeClick(String),
    AddIcon(String),
    FlyTo { center: LngLat, zoom: Option<f64> },
    FitBounds { bounds: LngLatBounds, padding: Padding },
}

impl SurfaceCall {
    /// Source, layer or paint change (as opposed to camera, icon, subscription).
    pub fn is_overlay_mutation(&self) -> bool {
        matches!(
            self,
            SurfaceCall::AddSource(_)
                | SurfaceCall::RemoveSource(_)
                | SurfaceCall::AddLayer { .. }
                | SurfaceCall::RemoveLayer(_)
                | SurfaceCall::SetPaint { .. }
        )
    }
}

impl std::fmt::Display for SurfaceCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurfaceCall::AddSource(id) => write!(f, "add-source {id}"),
            SurfaceCall::RemoveSource(id) => write!(f, "remove-source {id}"),
            SurfaceCall::AddLayer { id, before: None } => write!(f, "add-layer {id}"),
            SurfaceCall::AddLayer {
                id,
                before: Some(b),
            } => write!(f, "add-layer {id} before {b}"),
            SurfaceCall::RemoveLayer(id) => write!(f, "remove-layer {id}"),
            SurfaceCall::SetPaint {
                layer,
                property,
                value,
            } => write!(f, "set-paint {layer} {property}={value}"),
            SurfaceCall::SubscribeClick(id) => write!(f, "on-click {id}"),
            SurfaceCall::AddIcon(name) => write!(f, "add-icon {name}"),
            SurfaceCall::FlyTo { center, zoom } => match zoom {
                Some(z) => write!(f, "fly-to {},{} z{z}", center.lng, center.lat),
                None => write!(f, "fly-to {},{}", center.lng, center.lat),
            },
            SurfaceCall::FitBounds { bounds, padding } => write!(
                f,
                "fit-bounds {},{} {},{} pad[t{} b{} l{} r{}]",
                bounds.sw.lng,
                bounds.sw.lat,
                bounds.ne.lng,
                bounds.ne.lat,
                padding.top,
                padding.bottom,
                padding.left,
                padding.right
            ),
        }
    }
}

#[derive(Default)]
pub struct RecordingSurface {
    calls: Vec<SurfaceCall>,
    sources: BTreeMap<SourceId, SourceSpec>,
    // Bottom to top.
    layers: Vec<LayerSpec>,
    handlers: BTreeMap<LayerId, Vec<ClickHandler>>,
    icons: BTreeSet<String>,
    failing_sources: BTreeSet<SourceId>,
    failing_layer_removals: BTreeSet<LayerId>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[SurfaceCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<SurfaceCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn overlay_mutations(&self) -> Vec<&SurfaceCall> {
        self.calls
            .iter()
            .filter(|c| c.is_overlay_mutation())
            .collect()
    }

    /// Layer names, bottom to top.
    pub fn draw_order(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.id.as_str()).collect()
    }

    pub fn draw_index(&self, layer: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.id.as_str() == layer)
    }

    pub fn layer(&self, layer: &str) -> Option<&LayerSpec> {
        self.layers.iter().find(|l| l.id.as_str() == layer)
    }

    pub fn source(&self, source: &str) -> Option<&SourceSpec> {
        self.sources
            .iter()
            .find(|(id, _)| id.as_str() == source)
            .map(|(_, spec)| spec)
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn handler_count(&self, layer: &str) -> usize {
        self.handlers
            .iter()
            .find(|(id, _)| id.as_str() == layer)
            .map_or(0, |(_, hs)| hs.len())
    }

    pub fn has_icon(&self, name: &str) -> bool {
        self.icons.contains(name)
    }

    /// Makes the next `add_source` for `id` fail with a backend error.
    pub fn fail_source(&mut self, id: &str) {
        self.failing_sources.insert(SourceId(id.to_string()));
    }

    /// Makes the next `remove_layer` for `id` fail with a backend error.
    pub fn fail_layer_removal(&mut self, id: &str) {
        self.failing_layer_removals.insert(LayerId(id.to_string()));
    }

    /// Simulates a click on `layer`; returns the popups its handlers produced.
    ///
    /// Clicks only land on layers that are currently drawn.
    pub fn click(
        &self,
        layer: &str,
        coordinates: LngLat,
        properties: Map<String, Value>,
    ) -> Vec<Popup> {
        if self.layer(layer).is_none() {
            return Vec::new();
        }
        let feature = ClickedFeature {
            layer: LayerId(layer.to_string()),
            coordinates,
            properties,
        };
        self.handlers
            .get(&feature.layer)
            .map(|hs| hs.iter().filter_map(|h| h(&feature)).collect())
            .unwrap_or_default()
    }

    /// Basemap switch: the new style drops sources, layers and images.
    /// Click subscriptions are kept.
    pub fn reset_style(&mut self) {
        self.sources.clear();
        self.layers.clear();
        self.icons.clear();
    }
}

impl RenderSurface for RecordingSurface {
    fn add_source(&mut self, id: &SourceId, spec: SourceSpec) -> Result<(), SurfaceError> {
        self.calls.push(SurfaceCall::AddSource(id.0.clone()));
        if self.failing_sources.remove(id) {
            return Err(SurfaceError::Backend(format!("injected failure for {id}")));
        }
        if self.sources.contains_key(id) {
            return Err(SurfaceError::DuplicateSource(id.0.clone()));
        }
        self.sources.insert(id.clone(), spec);
        Ok(())
    }

    fn remove_source(&mut self, id: &SourceId) -> Result<(), SurfaceError> {
        self.calls.push(SurfaceCall::RemoveSource(id.0.clone()));
        if let Some(user) = self.layers.iter().find(|l| &l.source == id) {
            return Err(SurfaceError::SourceInUse {
                source: id.0.clone(),
                layer: user.id.0.clone(),
            });
        }
        self.sources
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| SurfaceError::UnknownSource(id.0.clone()))
    }

    fn add_layer(&mut self, spec: LayerSpec, before: Option<&LayerId>) -> Result<(), SurfaceError> {
        self.calls.push(SurfaceCall::AddLayer {
            id: spec.id.0.clone(),
            before: before.map(|b| b.0.clone()),
        });
        if self.layers.iter().any(|l| l.id == spec.id) {
            return Err(SurfaceError::DuplicateLayer(spec.id.0.clone()));
        }
        if !self.sources.contains_key(&spec.source) {
            return Err(SurfaceError::UnknownSource(spec.source.0.clone()));
        }
        let at = match before {
            Some(b) => self
                .layers
                .iter()
                .position(|l| &l.id == b)
                .ok_or_else(|| SurfaceError::UnknownLayer(b.0.clone()))?,
            None => self.layers.len(),
        };
        self.layers.insert(at, spec);
        Ok(())
    }

    fn remove_layer(&mut self, id: &LayerId) -> Result<(), SurfaceError> {
        self.calls.push(SurfaceCall::RemoveLayer(id.0.clone()));
        if self.failing_layer_removals.remove(id) {
            return Err(SurfaceError::Backend(format!("injected failure for {id}")));
        }
        let at = self
            .layers
            .iter()
            .position(|l| &l.id == id)
            .ok_or_else(|| SurfaceError::UnknownLayer(id.0.clone()))?;
        self.layers.remove(at);
        Ok(())
    }

    fn set_paint_property(
        &mut self,
        layer: &LayerId,
        property: PaintProperty,
        value: f64,
    ) -> Result<(), SurfaceError> {
        self.calls.push(SurfaceCall::SetPaint {
            layer: layer.0.clone(),
            property: property.name(),
            value,
        });
        let spec = self
            .layers
            .iter_mut()
            .find(|l| &l.id == layer)
            .ok_or_else(|| SurfaceError::UnknownLayer(layer.0.clone()))?;
        spec.opacity = value;
        Ok(())
    }

    fn on_feature_click(&mut self, layer: &LayerId, handler: ClickHandler) {
        self.calls.push(SurfaceCall::SubscribeClick(layer.0.clone()));
        self.handlers.entry(layer.clone()).or_default().push(handler);
    }

    fn add_icon(&mut self, name: &str, _asset: &str) -> Result<(), SurfaceError> {
        self.calls.push(SurfaceCall::AddIcon(name.to_string()));
        self.icons.insert(name.to_string());
        Ok(())
    }

    fn fly_to(&mut self, center: LngLat, zoom: Option<f64>) {
        self.calls.push(SurfaceCall::FlyTo { center, zoom });
    }

    fn fit_bounds(&mut self, bounds: LngLatBounds, padding: Padding) {
        self.calls.push(SurfaceCall::FitBounds { bounds, padding });
    }
}
