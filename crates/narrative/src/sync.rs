use catalog::{MapCatalog, MapRef, resolve_map_refs};
use layers::{CameraMove, OverlayDescriptor};
use runtime::{Generation, GenerationCounter};
use scene::{ActivationConfig, ChapterVisibility, IntersectionEntry};
use tracing::{debug, info};

use crate::{CameraConfig, Narrative, NarrativeError};

/// A chapter that just became active, before its maps are fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterActivation {
    pub chapter_id: String,
    pub generation: Generation,
    pub refs: Vec<MapRef>,
    pub camera: Option<CameraMove>,
}

impl ChapterActivation {
    pub async fn resolve<C: MapCatalog + ?Sized>(self, catalog: &C) -> ResolvedChapter {
        let overlays = resolve_map_refs(catalog, &self.refs).await;
        ResolvedChapter {
            chapter_id: self.chapter_id,
            generation: self.generation,
            overlays,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedChapter {
    pub chapter_id: String,
    pub generation: Generation,
    pub overlays: Vec<OverlayDescriptor>,
}

/// Tracks the open narrative and its active chapter.
///
/// Every activation advances a generation; a resolution finishing after a
/// newer activation (or after the narrative closed) is discarded.
#[derive(Debug, Default)]
pub struct ChapterSynchronizer {
    narrative: Option<Narrative>,
    visibility: ChapterVisibility,
    generations: GenerationCounter,
    camera: CameraConfig,
}

impl ChapterSynchronizer {
    pub fn new(activation: ActivationConfig, camera: CameraConfig) -> Self {
        Self {
            narrative: None,
            visibility: ChapterVisibility::new(activation),
            generations: GenerationCounter::new(),
            camera,
        }
    }

    pub fn narrative(&self) -> Option<&Narrative> {
        self.narrative.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.narrative.is_some()
    }

    pub fn active_chapter(&self) -> Option<&str> {
        self.visibility.active()
    }

    /// Opens `narrative` and activates its first chapter.
    pub fn open(&mut self, narrative: Narrative) -> Result<ChapterActivation, NarrativeError> {
        let first = narrative
            .first()
            .map(|c| c.id.clone())
            .ok_or_else(|| NarrativeError::NoChapters(narrative.id.clone()))?;
        info!(narrative = %narrative.id, chapters = narrative.chapters().len(), "narrative opened");
        self.visibility.reset();
        self.visibility
            .restrict_to(narrative.chapters().iter().map(|c| c.id.clone()));
        self.narrative = Some(narrative);
        self.activate(&first)
    }

    /// Closes the narrative; pending resolutions become stale.
    pub fn close(&mut self) -> Option<Narrative> {
        let closed = self.narrative.take()?;
        self.visibility.reset();
        self.generations.advance();
        info!(narrative = %closed.id, "narrative closed");
        Some(closed)
    }

    /// Feeds visibility notifications; returns an activation when the
    /// active chapter changed.
    pub fn observe(&mut self, entries: &[IntersectionEntry]) -> Option<ChapterActivation> {
        if self.narrative.is_none() {
            return None;
        }
        let chapter = self.visibility.observe(entries)?;
        match self.activate(&chapter) {
            Ok(activation) => Some(activation),
            Err(e) => {
                debug!("ignoring visibility signal: {e}");
                None
            }
        }
    }

    /// Makes `chapter_id` active regardless of visibility.
    pub fn activate(&mut self, chapter_id: &str) -> Result<ChapterActivation, NarrativeError> {
        let narrative = self.narrative.as_ref().ok_or(NarrativeError::NotActive)?;
        let chapter = narrative
            .chapter(chapter_id)
            .ok_or_else(|| NarrativeError::UnknownChapter(chapter_id.to_string()))?;
        let activation = ChapterActivation {
            chapter_id: chapter.id.clone(),
            generation: self.generations.advance(),
            refs: chapter.maps.clone(),
            camera: self.camera.move_for(chapter),
        };
        self.visibility.set_active(chapter_id);
        debug!(
            chapter = chapter_id,
            generation = activation.generation.0,
            maps = activation.refs.len(),
            "chapter activated"
        );
        Ok(activation)
    }

    /// The overlays to show, or `None` when `resolved` is stale.
    pub fn accept(&self, resolved: ResolvedChapter) -> Option<Vec<OverlayDescriptor>> {
        if self.narrative.is_none() || !self.generations.is_current(resolved.generation) {
            debug!(chapter = %resolved.chapter_id, "dropping stale chapter resolution");
            return None;
        }
        Some(resolved.overlays)
    }
}

#[cfg(test)]
mod tests {
    use super::ChapterSynchronizer;
    use crate::{Chapter, Narrative, NarrativeError};
    use catalog::{InMemoryMapCatalog, MapRef};
    use foundation::LngLat;
    use layers::CameraMove;
    use scene::IntersectionEntry;

    fn narrative() -> Narrative {
        let chapter = |id: &str, order: i64, maps: Vec<MapRef>| Chapter {
            id: id.to_string(),
            order,
            maps,
            center: Some(LngLat::new(order as f64, 0.0)),
            ..Chapter::default()
        };
        Narrative::new(
            "n",
            "N",
            [
                chapter("one", 1, vec![MapRef::new("a", 1.0)]),
                chapter("two", 2, vec![MapRef::new("b", 0.5), MapRef::new("missing", 1.0)]),
            ],
        )
    }

    fn catalog() -> InMemoryMapCatalog {
        InMemoryMapCatalog::from_json_str(
            r#"[
                {"id": "a", "raster_image": "a.png", "image_bounds_coords": ["0,1", "1,1", "1,0", "0,0"]},
                {"id": "b", "vector_points": [{"coordinates": "0.5,0.5"}]}
            ]"#,
        )
        .expect("catalog")
    }

    #[test]
    fn opening_activates_first_chapter() {
        let mut sync = ChapterSynchronizer::default();
        let a = sync.open(narrative()).expect("activation");
        assert_eq!(a.chapter_id, "one");
        assert_eq!(sync.active_chapter(), Some("one"));
        assert_eq!(
            a.camera,
            Some(CameraMove::FlyTo {
                center: LngLat::new(1.0, 0.0),
                zoom: None
            })
        );
    }

    #[test]
    fn empty_narrative_is_refused() {
        let mut sync = ChapterSynchronizer::default();
        assert_eq!(
            sync.open(Narrative::new("empty", "", [])),
            Err(NarrativeError::NoChapters("empty".to_string()))
        );
        assert!(!sync.is_active());
    }

    #[test]
    fn visibility_drives_activation_and_filters_unresolved() {
        let mut sync = ChapterSynchronizer::default();
        sync.open(narrative()).expect("open");
        let a = sync
            .observe(&[IntersectionEntry::new("two", 1.0)])
            .expect("chapter two");
        let resolved = pollster::block_on(a.resolve(&catalog()));
        let overlays = sync.accept(resolved).expect("current");
        assert_eq!(overlays.len(), 1);
        assert_eq!(overlays[0].id.as_str(), "b");
        assert_eq!(overlays[0].opacity, 0.5);
    }

    #[test]
    fn stale_resolution_is_dropped() {
        let mut sync = ChapterSynchronizer::default();
        let first = sync.open(narrative()).expect("open");
        let second = sync.activate("two").expect("two");

        let late = pollster::block_on(first.resolve(&catalog()));
        assert!(sync.accept(late).is_none());
        let fresh = pollster::block_on(second.resolve(&catalog()));
        assert!(sync.accept(fresh).is_some());
    }

    #[test]
    fn closing_invalidates_pending_work() {
        let mut sync = ChapterSynchronizer::default();
        let pending = sync.open(narrative()).expect("open");
        assert!(sync.close().is_some());
        let resolved = pollster::block_on(pending.resolve(&catalog()));
        assert!(sync.accept(resolved).is_none());
        assert!(sync.observe(&[IntersectionEntry::new("two", 1.0)]).is_none());
        assert_eq!(sync.activate("two"), Err(NarrativeError::NotActive));
    }

    #[test]
    fn unknown_section_leaves_active_chapter_alone() {
        let mut sync = ChapterSynchronizer::default();
        sync.open(narrative()).expect("open");
        assert!(sync.observe(&[IntersectionEntry::new("epilogue", 1.0)]).is_none());
        assert_eq!(sync.active_chapter(), Some("one"));

        let a = sync
            .observe(&[
                IntersectionEntry::new("epilogue", 1.0),
                IntersectionEntry::new("two", 1.0),
            ])
            .expect("chapter two");
        assert_eq!(a.chapter_id, "two");
        assert_eq!(sync.active_chapter(), Some("two"));
    }
}
