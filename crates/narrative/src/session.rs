use catalog::{CatalogError, MapCatalog};
use foundation::OverlayId;
use layers::{ApplyReport, MapView, OverlayDescriptor, RenderSurface, ViewConfig};
use scene::{ActivationConfig, IntersectionEntry, SelectionTracker};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    CameraConfig, ChapterActivation, ChapterSynchronizer, FootnoteRecord, FootnoteStore, Narrative,
    NarrativeError, ResolvedChapter, TransformedChapter, transform_narrative,
};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub view: ViewConfig,
    pub activation: ActivationConfig,
    pub camera: CameraConfig,
}

impl SessionConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, NarrativeError> {
        serde_json::from_str(raw).map_err(|e| NarrativeError::Config(e.to_string()))
    }
}

/// Who currently decides what is on the map.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    /// The user's map selection.
    Browse,
    /// The active chapter of an open narrative.
    Narrative,
}

/// One viewer: the map, the user's selection and the open narrative.
///
/// Selection and narrative both produce a full desired overlay list; only
/// the one matching [`Mode`] reaches the map.
pub struct Session<S> {
    view: MapView<S>,
    selection: SelectionTracker,
    sync: ChapterSynchronizer,
    chapters: Vec<TransformedChapter>,
    footnotes: FootnoteStore,
}

impl<S: RenderSurface> Session<S> {
    pub fn new(surface: S, config: SessionConfig) -> Self {
        Self {
            view: MapView::new(surface, config.view),
            selection: SelectionTracker::new(),
            sync: ChapterSynchronizer::new(config.activation, config.camera),
            chapters: Vec::new(),
            footnotes: FootnoteStore::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        if self.sync.is_active() {
            Mode::Narrative
        } else {
            Mode::Browse
        }
    }

    pub fn view(&self) -> &MapView<S> {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut MapView<S> {
        &mut self.view
    }

    pub fn into_surface(self) -> S {
        self.view.into_surface()
    }

    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    pub fn synchronizer(&self) -> &ChapterSynchronizer {
        &self.sync
    }

    pub fn on_map_ready(&mut self) -> Option<ApplyReport> {
        self.view.on_ready()
    }

    pub fn on_style_reset(&mut self) {
        self.view.on_style_reset();
    }

    // Browsing

    /// Toggles a map in the user's selection, closing any open narrative
    /// first.
    pub fn toggle_map(&mut self, descriptor: OverlayDescriptor, exclusive: bool) -> Option<ApplyReport> {
        if self.sync.is_active() {
            self.close_narrative();
        }
        let desired = self.selection.toggle(descriptor, exclusive);
        self.view.request(desired)
    }

    /// Looks `id` up in the catalog and toggles it.
    pub async fn select_map<C: MapCatalog + ?Sized>(
        &mut self,
        catalog: &C,
        id: &str,
        exclusive: bool,
    ) -> Result<Option<ApplyReport>, CatalogError> {
        let Some(record) = catalog.fetch_map(id).await? else {
            warn!(map = id, "no such map");
            return Ok(None);
        };
        let descriptor = record.to_descriptor(1.0)?;
        Ok(self.toggle_map(descriptor, exclusive))
    }

    /// Slider change. Remembered in every mode, drawn only while browsing.
    pub fn set_opacity(&mut self, id: &OverlayId, pct: f64) -> Option<ApplyReport> {
        let desired = self.selection.set_opacity(id, pct);
        if self.sync.is_active() {
            debug!(map = %id, "opacity stored, narrative controls the map");
            return None;
        }
        self.view.request(desired)
    }

    pub fn focus_map(&mut self, descriptor: &OverlayDescriptor) -> bool {
        self.view.focus(descriptor)
    }

    // Narratives

    /// Opens `narrative`: transforms all chapter footnotes, clears the
    /// selection and activates the first chapter.
    pub fn begin_narrative(&mut self, narrative: Narrative) -> Result<ChapterActivation, NarrativeError> {
        let (chapters, footnotes) = transform_narrative(&narrative);
        let activation = self.sync.open(narrative)?;
        self.selection.clear();
        self.chapters = chapters;
        self.footnotes = footnotes;
        Ok(self.start(activation))
    }

    pub fn begin_visibility(&mut self, entries: &[IntersectionEntry]) -> Option<ChapterActivation> {
        let activation = self.sync.observe(entries)?;
        Some(self.start(activation))
    }

    pub fn begin_chapter(&mut self, chapter_id: &str) -> Result<ChapterActivation, NarrativeError> {
        let activation = self.sync.activate(chapter_id)?;
        Ok(self.start(activation))
    }

    /// Applies a finished resolution unless a newer activation superseded it.
    pub fn complete(&mut self, resolved: ResolvedChapter) -> Option<ApplyReport> {
        let overlays = self.sync.accept(resolved)?;
        self.view.request(overlays)
    }

    pub async fn open_narrative<C: MapCatalog + ?Sized>(
        &mut self,
        catalog: &C,
        narrative: Narrative,
    ) -> Result<Option<ApplyReport>, NarrativeError> {
        let activation = self.begin_narrative(narrative)?;
        let resolved = activation.resolve(catalog).await;
        Ok(self.complete(resolved))
    }

    pub async fn on_visibility<C: MapCatalog + ?Sized>(
        &mut self,
        catalog: &C,
        entries: &[IntersectionEntry],
    ) -> Option<ApplyReport> {
        let activation = self.begin_visibility(entries)?;
        let resolved = activation.resolve(catalog).await;
        self.complete(resolved)
    }

    pub async fn go_to_chapter<C: MapCatalog + ?Sized>(
        &mut self,
        catalog: &C,
        chapter_id: &str,
    ) -> Result<Option<ApplyReport>, NarrativeError> {
        let activation = self.begin_chapter(chapter_id)?;
        let resolved = activation.resolve(catalog).await;
        Ok(self.complete(resolved))
    }

    /// Returns the map to the user's selection.
    pub fn close_narrative(&mut self) -> Option<ApplyReport> {
        self.sync.close()?;
        self.chapters.clear();
        self.footnotes = FootnoteStore::new();
        self.view.request(self.selection.snapshot())
    }

    pub fn chapters(&self) -> &[TransformedChapter] {
        &self.chapters
    }

    pub fn chapter_html(&self, chapter_id: &str) -> Option<&str> {
        self.chapters
            .iter()
            .find(|c| c.chapter_id == chapter_id)
            .map(|c| c.html.as_str())
    }

    /// Click on a footnote placeholder.
    pub fn footnote(&self, id: &str) -> Option<&FootnoteRecord> {
        self.footnotes.get(id)
    }

    pub fn footnotes(&self) -> &FootnoteStore {
        &self.footnotes
    }

    fn start(&mut self, activation: ChapterActivation) -> ChapterActivation {
        if let Some(mv) = activation.camera.clone() {
            self.view.move_camera(mv);
        }
        activation
    }
}

#[cfg(test)]
mod tests {
    use super::{Mode, Session, SessionConfig};
    use crate::Narrative;
    use catalog::InMemoryMapCatalog;
    use foundation::OverlayId;
    use layers::{RecordingSurface, SurfaceCall};
    use pollster::block_on;
    use pretty_assertions::assert_eq;
    use scene::IntersectionEntry;

    const MAPS: &str = r#"[
        {"id": "a", "title": "Raster A", "raster_image": "a.png",
         "image_bounds_coords": ["-122.1,37.1", "-122.0,37.1", "-122.0,37.0", "-122.1,37.0"]},
        {"id": "b", "title": "Pins B", "vector_points": [
            {"coordinates": "-122.05,37.05", "bearing": 90, "description": "Pier", "image": "pier.jpg", "is_directional": true}
        ]},
        {"id": "c", "title": "Raster C", "raster_image": "c.png",
         "image_bounds_coords": ["-122.3,37.3", "-122.2,37.3", "-122.2,37.2", "-122.3,37.2"]}
    ]"#;

    const NARRATIVE: &str = r#"{
        "id": "fill",
        "title": "Making Land",
        "chapters": {
            "shore": {"order": 0, "content": "<p>Shore&lt;footnote&gt;&lt;text&gt;see note&lt;/text&gt;&lt;content&gt;&lt;b&gt;detail&lt;/b&gt;&lt;/content&gt;&lt;/footnote&gt;</p>",
                      "maps": [{"id": "a", "opacityVal": 0.7}, {"id": "ghost"}],
                      "center": [-122.05, 37.05], "zoom": 13},
            "fill": {"order": 1, "content": "<p>Fill</p>",
                     "maps": [{"id": "c"}, {"id": "b"}],
                     "bounds": [[-122.3, 37.0], [-122.0, 37.3]]}
        }
    }"#;

    fn catalog() -> InMemoryMapCatalog {
        InMemoryMapCatalog::from_json_str(MAPS).expect("maps")
    }

    fn ready_session() -> Session<RecordingSurface> {
        let mut s = Session::new(RecordingSurface::new(), SessionConfig::default());
        s.on_map_ready();
        s
    }

    fn order(s: &Session<RecordingSurface>) -> Vec<String> {
        s.view()
            .surface()
            .draw_order()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn browsing_select_and_deselect() {
        let cat = catalog();
        let mut s = ready_session();
        block_on(s.select_map(&cat, "a", false)).expect("a");
        block_on(s.select_map(&cat, "b", false)).expect("b");
        assert_eq!(order(&s), vec!["raster-layer-a", "vector-layer-b"]);

        s.view_mut().surface_mut().take_calls();
        block_on(s.select_map(&cat, "a", false)).expect("deselect a");
        let calls: Vec<String> = s
            .view()
            .surface()
            .overlay_mutations()
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(calls, vec!["remove-layer raster-layer-a", "remove-source raster-source-a"]);

        let report = block_on(s.select_map(&cat, "c", true)).expect("c").expect("applied");
        assert_eq!(report.removed.len(), 1);
        assert_eq!(order(&s), vec!["raster-layer-c"]);
    }

    #[test]
    fn slider_changes_paint_only() {
        let cat = catalog();
        let mut s = ready_session();
        block_on(s.select_map(&cat, "a", false)).expect("a");
        s.view_mut().surface_mut().take_calls();
        let report = s.set_opacity(&OverlayId::new("a"), 30.0).expect("applied");
        assert_eq!(report.updated.len(), 1);
        assert_eq!(s.view().surface().overlay_mutations().len(), 1);
    }

    #[test]
    fn narrative_drives_overlays_camera_and_footnotes() {
        let cat = catalog();
        let mut s = ready_session();
        block_on(s.select_map(&cat, "c", false)).expect("c");

        let narrative = Narrative::from_json_str(NARRATIVE).expect("narrative");
        block_on(s.open_narrative(&cat, narrative)).expect("open");
        assert_eq!(s.mode(), Mode::Narrative);
        assert!(s.selection().is_empty());
        assert_eq!(order(&s), vec!["raster-layer-a"]);
        assert_eq!(
            s.view().surface().layer("raster-layer-a").map(|l| l.opacity),
            Some(0.7)
        );

        let html = s.chapter_html("shore").expect("shore html");
        assert!(html.contains("data-footnote-id=\"shore-fn-0\""));
        let note = s.footnote("shore-fn-0").expect("footnote");
        assert_eq!(note.display_text, "see note");
        assert_eq!(note.modal_html, "<b>detail</b>");

        let flew = s
            .view()
            .surface()
            .calls()
            .iter()
            .any(|c| matches!(c, SurfaceCall::FlyTo { zoom: Some(z), .. } if *z == 13.0));
        assert!(flew);

        block_on(s.on_visibility(&cat, &[IntersectionEntry::new("fill", 1.0)])).expect("fill applied");
        assert_eq!(s.synchronizer().active_chapter(), Some("fill"));
        assert_eq!(order(&s), vec!["raster-layer-c", "vector-layer-b"]);
        let fitted = s.view().surface().calls().iter().find_map(|c| match c {
            SurfaceCall::FitBounds { padding, .. } => Some(*padding),
            _ => None,
        });
        assert_eq!(fitted.map(|p| p.left), Some(460.0));
    }

    #[test]
    fn superseded_chapter_resolution_is_not_applied() {
        let cat = catalog();
        let mut s = ready_session();
        let narrative = Narrative::from_json_str(NARRATIVE).expect("narrative");
        let first = s.begin_narrative(narrative).expect("open");
        let second = s.begin_chapter("fill").expect("fill");

        let late = block_on(first.resolve(&cat));
        assert!(s.complete(late).is_none());
        assert!(s.view().surface().draw_order().is_empty());

        let fresh = block_on(second.resolve(&cat));
        assert!(s.complete(fresh).is_some());
        assert_eq!(order(&s), vec!["raster-layer-c", "vector-layer-b"]);
    }

    #[test]
    fn toggling_a_map_closes_the_narrative() {
        let cat = catalog();
        let mut s = ready_session();
        let narrative = Narrative::from_json_str(NARRATIVE).expect("narrative");
        block_on(s.open_narrative(&cat, narrative)).expect("open");

        block_on(s.select_map(&cat, "b", false)).expect("b");
        assert_eq!(s.mode(), Mode::Browse);
        assert!(s.footnote("shore-fn-0").is_none());
        assert_eq!(order(&s), vec!["vector-layer-b"]);
    }

    #[test]
    fn narrative_before_map_ready_is_flushed_on_ready() {
        let cat = catalog();
        let mut s = Session::new(RecordingSurface::new(), SessionConfig::default());
        let narrative = Narrative::from_json_str(NARRATIVE).expect("narrative");
        assert_eq!(block_on(s.open_narrative(&cat, narrative)), Ok(None));
        assert!(s.view().surface().calls().is_empty());

        s.on_map_ready();
        let calls: Vec<String> = s.view().surface().calls().iter().map(|c| c.to_string()).collect();
        let add = calls.iter().position(|c| c == "add-layer raster-layer-a").expect("added");
        let fly = calls.iter().position(|c| c.starts_with("fly-to")).expect("flew");
        assert!(add < fly);
    }

    #[test]
    fn config_loads_partial_json() {
        let cfg = SessionConfig::from_json_str(
            r#"{"camera": {"panel_side": "right"}, "activation": {"threshold": 0.75}}"#,
        )
        .expect("config");
        assert_eq!(cfg.activation.threshold, 0.75);
        assert_eq!(cfg.camera.base_padding, 40.0);
        assert_eq!(cfg.view.default_zoom, 14.0);
        assert!(SessionConfig::from_json_str("[]").is_err());
    }
}
