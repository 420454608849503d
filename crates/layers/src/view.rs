use foundation::{LngLat, LngLatBounds};
use runtime::ReadinessGate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::descriptor::OverlayDescriptor;
use crate::reconcile::{ApplyReport, Reconciler};
use crate::surface::{Padding, RenderSurface};
use crate::symbology::SymbologyConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Zoom used when flying to a single map.
    pub default_zoom: f64,
    pub symbology: SymbologyConfig,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_zoom: 14.0,
            symbology: SymbologyConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CameraMove {
    FlyTo { center: LngLat, zoom: Option<f64> },
    FitBounds { bounds: LngLatBounds, padding: Padding },
}

/// The interactive map as seen by the rest of the system.
///
/// Overlay requests and camera moves made before the surface reports
/// readiness are parked; only the latest of each survives. On readiness the
/// pin icons are registered, then overlays are reconciled, then the camera
/// moves.
pub struct MapView<S> {
    surface: S,
    reconciler: Reconciler,
    config: ViewConfig,
    overlays: ReadinessGate<Vec<OverlayDescriptor>>,
    camera: ReadinessGate<CameraMove>,
    last_desired: Vec<OverlayDescriptor>,
}

impl<S: RenderSurface> MapView<S> {
    pub fn new(surface: S, config: ViewConfig) -> Self {
        Self {
            surface,
            reconciler: Reconciler::new(config.symbology.clone()),
            config,
            overlays: ReadinessGate::new(),
            camera: ReadinessGate::new(),
            last_desired: Vec::new(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.overlays.is_ready()
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    pub fn reconciler_mut(&mut self) -> &mut Reconciler {
        &mut self.reconciler
    }

    pub fn last_desired(&self) -> &[OverlayDescriptor] {
        &self.last_desired
    }

    /// Asks for `desired` to be on the map. Returns the pass report when it
    /// ran now, `None` when it was parked until readiness.
    pub fn request(&mut self, desired: Vec<OverlayDescriptor>) -> Option<ApplyReport> {
        self.last_desired = desired.clone();
        match self.overlays.submit(desired) {
            Some(desired) => Some(self.reconciler.apply(&mut self.surface, &desired)),
            None => {
                debug!(count = self.last_desired.len(), "overlay request parked until map is ready");
                None
            }
        }
    }

    /// Readiness signal from the surface (initial load or style reload).
    pub fn on_ready(&mut self) -> Option<ApplyReport> {
        if self.overlays.is_ready() {
            return None;
        }
        self.register_icons();
        let report = self
            .overlays
            .open()
            .map(|desired| self.reconciler.apply(&mut self.surface, &desired));
        if let Some(mv) = self.camera.open() {
            self.execute(mv);
        }
        info!(overlays = self.reconciler.len(), "map ready");
        report
    }

    /// The basemap style changed; everything we drew is gone.
    ///
    /// The last requested overlays are parked and restored by the next
    /// [`MapView::on_ready`].
    pub fn on_style_reset(&mut self) {
        self.reconciler.forget_surface_state();
        self.overlays.close();
        self.camera.close();
        self.overlays.submit(self.last_desired.clone());
        info!(pending = self.last_desired.len(), "style reset, waiting for map");
    }

    pub fn move_camera(&mut self, mv: CameraMove) {
        match self.camera.submit(mv) {
            Some(mv) => self.execute(mv),
            None => debug!("camera move parked until map is ready"),
        }
    }

    /// Flies to a single map at the configured zoom.
    ///
    /// Returns false when the descriptor has nothing to focus on.
    pub fn focus(&mut self, descriptor: &OverlayDescriptor) -> bool {
        match descriptor.focus_point() {
            Some(center) => {
                self.move_camera(CameraMove::FlyTo {
                    center,
                    zoom: Some(self.config.default_zoom),
                });
                true
            }
            None => {
                warn!(overlay = %descriptor.id, "no usable location to fly to");
                false
            }
        }
    }

    fn execute(&mut self, mv: CameraMove) {
        match mv {
            CameraMove::FlyTo { center, zoom } => self.surface.fly_to(center, zoom),
            CameraMove::FitBounds { bounds, padding } => self.surface.fit_bounds(bounds, padding),
        }
    }

    fn register_icons(&mut self) {
        for (name, asset) in self.config.symbology.icons() {
            if let Err(e) = self.surface.add_icon(name, asset) {
                warn!(icon = name, "icon registration failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CameraMove, MapView, ViewConfig};
    use crate::descriptor::{OverlayDescriptor, VectorPoint};
    use crate::recording::{RecordingSurface, SurfaceCall};
    use foundation::LngLat;
    use pretty_assertions::assert_eq;

    fn quad() -> Vec<String> {
        ["-122.1,37.1", "-122.0,37.1", "-122.0,37.0", "-122.1,37.0"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn raster(id: &str) -> OverlayDescriptor {
        OverlayDescriptor::raster(id, format!("{id}.png"), quad())
    }

    fn vector(id: &str) -> OverlayDescriptor {
        OverlayDescriptor::vector(
            id,
            vec![VectorPoint {
                coordinates: "-122.4,37.8".to_string(),
                bearing: 0.0,
                caption: String::new(),
                image: String::new(),
                directional: false,
            }],
        )
    }

    fn view() -> MapView<RecordingSurface> {
        MapView::new(RecordingSurface::new(), ViewConfig::default())
    }

    #[test]
    fn requests_before_ready_collapse_to_latest() {
        let mut v = view();
        assert!(v.request(vec![raster("alpha")]).is_none());
        assert!(v.request(vec![vector("bravo")]).is_none());
        assert!(v.surface().calls().is_empty());

        let report = v.on_ready().expect("parked request applied");
        assert_eq!(report.added.len(), 1);
        assert_eq!(v.surface().draw_order(), vec!["vector-layer-bravo"]);
        assert!(v.surface().source("raster-source-alpha").is_none());
    }

    #[test]
    fn ready_registers_icons_before_overlays_then_moves_camera() {
        let mut v = view();
        v.request(vec![vector("bravo")]);
        v.move_camera(CameraMove::FlyTo {
            center: LngLat::new(1.0, 2.0),
            zoom: None,
        });
        v.on_ready();

        let calls: Vec<String> = v.surface().calls().iter().map(|c| c.to_string()).collect();
        assert_eq!(
            calls,
            vec![
                "add-icon arrow-icon",
                "add-icon arrow-icon-directional",
                "add-source vector-source-bravo",
                "add-layer vector-layer-bravo",
                "on-click vector-layer-bravo",
                "fly-to 1,2",
            ]
        );
        assert!(v.on_ready().is_none());
    }

    #[test]
    fn only_latest_parked_camera_move_runs() {
        let mut v = view();
        v.move_camera(CameraMove::FlyTo {
            center: LngLat::new(1.0, 1.0),
            zoom: None,
        });
        v.move_camera(CameraMove::FlyTo {
            center: LngLat::new(2.0, 2.0),
            zoom: Some(9.0),
        });
        v.on_ready();
        let moves: Vec<&SurfaceCall> = v
            .surface()
            .calls()
            .iter()
            .filter(|c| matches!(c, SurfaceCall::FlyTo { .. }))
            .collect();
        assert_eq!(
            moves,
            vec![&SurfaceCall::FlyTo {
                center: LngLat::new(2.0, 2.0),
                zoom: Some(9.0)
            }]
        );
    }

    #[test]
    fn style_reset_restores_overlays_on_next_ready() {
        let mut v = view();
        v.on_ready();
        v.request(vec![raster("alpha"), vector("bravo")]);
        v.surface_mut().reset_style();
        v.on_style_reset();
        assert!(!v.is_ready());
        assert!(v.surface().draw_order().is_empty());

        let report = v.on_ready().expect("restored");
        assert_eq!(report.added.len(), 2);
        assert_eq!(
            v.surface().draw_order(),
            vec!["raster-layer-alpha", "vector-layer-bravo"]
        );
        assert!(v.surface().has_icon("arrow-icon-directional"));
        assert_eq!(v.surface().handler_count("vector-layer-bravo"), 1);
    }

    #[test]
    fn focus_falls_back_to_quad_center_at_default_zoom() {
        let mut v = view();
        v.on_ready();
        assert!(v.focus(&raster("alpha")));
        let Some(SurfaceCall::FlyTo { center, zoom }) = v.surface().calls().last() else {
            panic!("expected fly-to");
        };
        assert!((center.lng - -122.05).abs() < 1e-9);
        assert!((center.lat - 37.05).abs() < 1e-9);
        assert_eq!(*zoom, Some(14.0));
    }

    #[test]
    fn explicit_center_wins_and_unlocatable_is_refused() {
        let mut v = view();
        v.on_ready();
        assert!(v.focus(&vector("bravo").with_center(LngLat::new(3.0, 4.0))));
        assert_eq!(
            v.surface().calls().last(),
            Some(&SurfaceCall::FlyTo {
                center: LngLat::new(3.0, 4.0),
                zoom: Some(14.0)
            })
        );

        let nowhere = OverlayDescriptor::vector("empty", Vec::new());
        let before = v.surface().calls().len();
        assert!(!v.focus(&nowhere));
        assert_eq!(v.surface().calls().len(), before);
    }

    #[test]
    fn config_fills_missing_fields() {
        let cfg: ViewConfig = serde_json::from_str(r#"{"default_zoom": 12}"#).expect("parse");
        assert_eq!(cfg.default_zoom, 12.0);
        assert_eq!(cfg.symbology.icon_size, 0.3);
    }
}
