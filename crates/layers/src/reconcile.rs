use std::collections::{BTreeMap, BTreeSet};

use foundation::{OverlayId, OverlayKey, OverlayKind};
use runtime::EventBus;
use tracing::{debug, warn};

use crate::descriptor::{OverlayDescriptor, OverlayGeometry};
use crate::layer::{LayerId, SourceId};
use crate::lifecycle::OverlayState;
use crate::popup::pin_click_handler;
use crate::raster::RasterOverlay;
use crate::surface::{LayerSpec, RenderSurface, SourceSpec, SurfaceError};
use crate::symbology::{PaintProperty, SymbologyConfig};
use crate::vector::VectorOverlay;

const OPACITY_EPSILON: f64 = 1e-6;
const TRACE_CAPACITY: usize = 4096;

#[derive(Debug, Clone)]
struct Materialized {
    key: OverlayKey,
    source: SourceId,
    layer: LayerId,
    property: PaintProperty,
    opacity: f64,
}

/// What one [`Reconciler::apply`] pass changed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ApplyReport {
    pub pass: u64,
    pub removed: Vec<OverlayKey>,
    pub added: Vec<OverlayKey>,
    pub updated: Vec<OverlayKey>,
    pub skipped: Vec<(OverlayKey, String)>,
}

impl ApplyReport {
    pub fn is_noop(&self) -> bool {
        self.removed.is_empty()
            && self.added.is_empty()
            && self.updated.is_empty()
            && self.skipped.is_empty()
    }
}

/// Sole writer of overlay sources and layers on a [`RenderSurface`].
///
/// Ordering contract:
/// - Within a pass: removals, then additions (all rasters before any pin
///   layer), then opacity updates.
/// - A removed overlay loses its layer before its source.
/// - Raster layers are always inserted below the lowest pin layer, so pins
///   stay on top regardless of desired-list order or pass history.
/// - Click handlers are attached once per layer name for the lifetime of
///   the reconciler.
pub struct Reconciler {
    symbology: SymbologyConfig,
    materialized: BTreeMap<OverlayId, Materialized>,
    // Our own layers, bottom to top.
    stack: Vec<(OverlayKind, LayerId)>,
    subscribed: BTreeSet<LayerId>,
    // Sources whose layer is gone but whose own removal failed.
    orphaned_sources: BTreeSet<SourceId>,
    pass: u64,
    events: EventBus,
}

impl Reconciler {
    pub fn new(symbology: SymbologyConfig) -> Self {
        Self {
            symbology,
            materialized: BTreeMap::new(),
            stack: Vec::new(),
            subscribed: BTreeSet::new(),
            orphaned_sources: BTreeSet::new(),
            pass: 0,
            events: EventBus::with_capacity_limit(TRACE_CAPACITY),
        }
    }

    pub fn symbology(&self) -> &SymbologyConfig {
        &self.symbology
    }

    pub fn pass(&self) -> u64 {
        self.pass
    }

    pub fn len(&self) -> usize {
        self.materialized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materialized.is_empty()
    }

    pub fn state(&self, id: &OverlayId) -> OverlayState {
        if self.materialized.contains_key(id) {
            OverlayState::Materialized
        } else {
            OverlayState::Absent
        }
    }

    pub fn materialized_keys(&self) -> Vec<OverlayKey> {
        self.materialized.values().map(|m| m.key.clone()).collect()
    }

    pub fn layer_of(&self, id: &OverlayId) -> Option<&LayerId> {
        self.materialized.get(id).map(|m| &m.layer)
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Brings the surface in line with `desired`.
    ///
    /// Never fails: bad descriptors and surface errors are logged, reported
    /// in [`ApplyReport::skipped`] and leave the id un-materialized. An
    /// overlay whose layer could not be removed stays tracked and the removal
    /// is retried on the next pass.
    pub fn apply<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        desired: &[OverlayDescriptor],
    ) -> ApplyReport {
        self.pass += 1;
        let mut report = ApplyReport {
            pass: self.pass,
            ..ApplyReport::default()
        };
        self.retry_orphaned_sources(surface);
        let desired = dedupe(desired);
        let wanted: BTreeMap<&OverlayId, OverlayKind> =
            desired.iter().map(|d| (&d.id, d.kind())).collect();

        let to_remove: Vec<OverlayId> = self
            .materialized
            .iter()
            .filter(|(id, m)| wanted.get(id) != Some(&m.key.kind))
            .map(|(id, _)| id.clone())
            .collect();
        for id in to_remove {
            let Some(m) = self.materialized.get(&id).cloned() else {
                continue;
            };
            if self.dematerialize(surface, &m) {
                self.materialized.remove(&id);
                report.removed.push(m.key);
            }
        }

        let (rasters, vectors): (Vec<&OverlayDescriptor>, Vec<&OverlayDescriptor>) = desired
            .iter()
            .copied()
            .filter(|d| !self.materialized.contains_key(&d.id))
            .partition(|d| d.kind() == OverlayKind::Raster);
        for d in rasters.into_iter().chain(vectors) {
            match self.materialize(surface, d) {
                Ok(()) => report.added.push(d.key()),
                Err(reason) => report.skipped.push((d.key(), reason)),
            }
        }

        for d in &desired {
            let Some(m) = self.materialized.get_mut(&d.id) else {
                continue;
            };
            if m.key.kind != d.kind() {
                report.skipped.push((
                    d.key(),
                    format!("previous layer {} is still on the surface", m.layer),
                ));
                continue;
            }
            if (m.opacity - d.opacity).abs() <= OPACITY_EPSILON {
                continue;
            }
            match surface.set_paint_property(&m.layer, m.property, d.opacity) {
                Ok(()) => {
                    m.opacity = d.opacity;
                    report.updated.push(m.key.clone());
                    self.events
                        .emit(self.pass, "opacity", format!("{} {}", m.key, d.opacity));
                }
                Err(e) => warn!(overlay = %m.key, "opacity update failed: {e}"),
            }
        }

        debug!(
            pass = self.pass,
            added = report.added.len(),
            removed = report.removed.len(),
            updated = report.updated.len(),
            skipped = report.skipped.len(),
            "reconciled overlays"
        );
        report
    }

    /// The surface dropped every source and layer (style switch).
    ///
    /// Materialized entries are retired without surface calls; click
    /// subscriptions are kept because the surface keeps them.
    pub fn forget_surface_state(&mut self) {
        let retired = std::mem::take(&mut self.materialized);
        self.stack.clear();
        self.orphaned_sources.clear();
        for m in retired.into_values() {
            self.transition(&m.key, OverlayState::Materialized, OverlayState::Removing);
            self.transition(&m.key, OverlayState::Removing, OverlayState::Absent);
        }
    }

    fn materialize<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        d: &OverlayDescriptor,
    ) -> Result<(), String> {
        let key = d.key();
        self.transition(&key, OverlayState::Absent, OverlayState::Materializing);

        let (source_id, source, layer) = match self.build(&key, d) {
            Ok(parts) => parts,
            Err(reason) => {
                warn!(overlay = %key, "skipping overlay: {reason}");
                return Err(self.abort(&key, reason));
            }
        };

        if let Err(e) = surface.add_source(&source_id, source) {
            warn!(overlay = %key, "could not add source {source_id}: {e}");
            return Err(self.abort(&key, e.to_string()));
        }

        let before = match key.kind {
            OverlayKind::Raster => self.lowest_pin_layer().cloned(),
            OverlayKind::Vector => None,
        };
        let layer_id = layer.id.clone();
        let property = layer.opacity_property();
        if let Err(e) = surface.add_layer(layer, before.as_ref()) {
            warn!(overlay = %key, "could not add layer {layer_id}: {e}");
            if let Err(e) = surface.remove_source(&source_id) {
                warn!(overlay = %key, "could not clean up source {source_id}: {e}");
            }
            return Err(self.abort(&key, e.to_string()));
        }

        let at = before
            .and_then(|b| self.stack.iter().position(|(_, l)| *l == b))
            .unwrap_or(self.stack.len());
        self.stack.insert(at, (key.kind, layer_id.clone()));

        if key.kind == OverlayKind::Vector && self.subscribed.insert(layer_id.clone()) {
            surface.on_feature_click(
                &layer_id,
                pin_click_handler(self.symbology.popup_max_width_px),
            );
        }

        self.materialized.insert(
            d.id.clone(),
            Materialized {
                key: key.clone(),
                source: source_id,
                layer: layer_id,
                property,
                opacity: d.opacity,
            },
        );
        self.transition(&key, OverlayState::Materializing, OverlayState::Materialized);
        Ok(())
    }

    fn build(
        &self,
        key: &OverlayKey,
        d: &OverlayDescriptor,
    ) -> Result<(SourceId, SourceSpec, LayerSpec), String> {
        match &d.geometry {
            OverlayGeometry::Raster(img) => RasterOverlay::build(key, img, d.opacity)
                .map(|r| (r.source_id, r.source, r.layer))
                .map_err(|e| e.to_string()),
            OverlayGeometry::Vector(points) => {
                VectorOverlay::build(key, points, d.opacity, &self.symbology)
                    .map(|v| (v.source_id, v.source, v.layer))
                    .map_err(|e| e.to_string())
            }
        }
    }

    /// Removes layer then source. Returns `false` when the layer is still
    /// on the surface; the caller keeps the entry so the next pass retries.
    fn dematerialize<S: RenderSurface + ?Sized>(&mut self, surface: &mut S, m: &Materialized) -> bool {
        self.transition(&m.key, OverlayState::Materialized, OverlayState::Removing);

        match surface.remove_layer(&m.layer) {
            Ok(()) | Err(SurfaceError::UnknownLayer(_)) => {}
            Err(e) => {
                warn!(overlay = %m.key, "could not remove layer {}, retrying next pass: {e}", m.layer);
                self.transition(&m.key, OverlayState::Removing, OverlayState::Materialized);
                return false;
            }
        }
        self.stack.retain(|(_, l)| *l != m.layer);

        match surface.remove_source(&m.source) {
            Ok(()) | Err(SurfaceError::UnknownSource(_)) => {}
            Err(e) => {
                warn!(overlay = %m.key, "could not remove source {}, retrying next pass: {e}", m.source);
                self.orphaned_sources.insert(m.source.clone());
            }
        }

        self.transition(&m.key, OverlayState::Removing, OverlayState::Absent);
        true
    }

    fn retry_orphaned_sources<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) {
        let pending = std::mem::take(&mut self.orphaned_sources);
        for source in pending {
            match surface.remove_source(&source) {
                Ok(()) | Err(SurfaceError::UnknownSource(_)) => {
                    debug!(%source, "removed orphaned source");
                }
                Err(e) => {
                    warn!(%source, "orphaned source still not removable: {e}");
                    self.orphaned_sources.insert(source);
                }
            }
        }
    }

    fn abort(&mut self, key: &OverlayKey, reason: String) -> String {
        self.events
            .emit(self.pass, "skip", format!("{key}: {reason}"));
        self.transition(key, OverlayState::Materializing, OverlayState::Absent);
        reason
    }

    fn lowest_pin_layer(&self) -> Option<&LayerId> {
        self.stack
            .iter()
            .find(|(kind, _)| *kind == OverlayKind::Vector)
            .map(|(_, l)| l)
    }

    fn transition(&mut self, key: &OverlayKey, from: OverlayState, to: OverlayState) {
        debug_assert!(from.can_transition_to(to), "{key}: {from:?} -> {to:?}");
        debug!(overlay = %key, from = from.name(), to = to.name(), "overlay lifecycle");
        self.events.emit(self.pass, to.name(), key.to_string());
    }
}

/// Drops repeated ids; the later entry wins but keeps the earlier position.
fn dedupe(desired: &[OverlayDescriptor]) -> Vec<&OverlayDescriptor> {
    let mut out: Vec<&OverlayDescriptor> = Vec::with_capacity(desired.len());
    let mut index: BTreeMap<&OverlayId, usize> = BTreeMap::new();
    for d in desired {
        match index.get(&d.id) {
            Some(&at) => {
                warn!(overlay = %d.id, "duplicate overlay id in desired state, keeping the later entry");
                out[at] = d;
            }
            None => {
                index.insert(&d.id, out.len());
                out.push(d);
            }
        }
    }
    out
}
