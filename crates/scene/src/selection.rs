use std::collections::BTreeMap;

use foundation::OverlayId;
use layers::OverlayDescriptor;
use tracing::{debug, warn};

const FULL_OPACITY_PCT: f64 = 100.0;

/// User-chosen overlays in selection order, with per-map opacity.
///
/// Ordering contract:
/// - Snapshots list overlays in the order they were first selected.
/// - A deselected id leaves the order entirely; reselecting appends it.
/// - Opacity percentages survive deselect/reselect.
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    order: Vec<OverlayId>,
    entries: BTreeMap<OverlayId, OverlayDescriptor>,
    opacity_pct: BTreeMap<OverlayId, f64>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn selected_ids(&self) -> &[OverlayId] {
        &self.order
    }

    pub fn is_selected(&self, id: &OverlayId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn opacity_pct(&self, id: &OverlayId) -> f64 {
        self.opacity_pct
            .get(id)
            .copied()
            .unwrap_or(FULL_OPACITY_PCT)
    }

    /// Flips `descriptor.id` in or out of the selection.
    ///
    /// With `exclusive` the selection becomes exactly this overlay.
    pub fn toggle(&mut self, descriptor: OverlayDescriptor, exclusive: bool) -> Vec<OverlayDescriptor> {
        let id = descriptor.id.clone();
        if exclusive {
            self.order.clear();
            self.entries.clear();
            self.select(descriptor);
        } else if self.entries.remove(&id).is_some() {
            self.order.retain(|o| *o != id);
        } else {
            self.select(descriptor);
        }
        debug!(overlay = %id, exclusive, selected = self.order.len(), "toggled overlay");
        self.snapshot()
    }

    /// Stores `pct` (clamped to 0..=100) for `id`.
    ///
    /// Only opacity values change; the set of selected ids never does.
    pub fn set_opacity(&mut self, id: &OverlayId, pct: f64) -> Vec<OverlayDescriptor> {
        let pct = if pct.is_nan() {
            warn!(overlay = %id, "ignoring NaN opacity");
            self.opacity_pct(id)
        } else {
            pct.clamp(0.0, FULL_OPACITY_PCT)
        };
        self.opacity_pct.insert(id.clone(), pct);
        self.snapshot()
    }

    pub fn clear(&mut self) -> Vec<OverlayDescriptor> {
        self.order.clear();
        self.entries.clear();
        Vec::new()
    }

    /// Full desired list with opacities merged in.
    pub fn snapshot(&self) -> Vec<OverlayDescriptor> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id))
            .map(|d| d.clone().with_opacity(self.opacity_pct(&d.id) / FULL_OPACITY_PCT))
            .collect()
    }

    fn select(&mut self, descriptor: OverlayDescriptor) {
        let id = descriptor.id.clone();
        if self.entries.insert(id.clone(), descriptor).is_none() {
            self.order.push(id);
        }
    }
}
