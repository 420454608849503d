use std::collections::BTreeMap;

use catalog::MapRef;
use foundation::{LngLat, LngLatBounds};
use serde::{Deserialize, Serialize};

use crate::NarrativeError;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Chapter {
    /// Key of the chapter in the narrative document.
    #[serde(skip)]
    pub id: String,
    pub title: String,
    pub order: i64,
    /// Rich text; may embed `<footnote>` blocks, possibly entity-escaped.
    pub content: String,
    pub maps: Vec<MapRef>,
    pub bounds: Option<LngLatBounds>,
    pub center: Option<LngLat>,
    pub zoom: Option<f64>,
}

/// Where the camera should go when a chapter becomes active.
#[derive(Debug, Clone, PartialEq)]
pub enum ChapterViewHint {
    Bounds(LngLatBounds),
    Center { center: LngLat, zoom: Option<f64> },
}

impl Chapter {
    /// Explicit bounds win over center; unusable values count as absent.
    pub fn view_hint(&self) -> Option<ChapterViewHint> {
        if let Some(b) = self.bounds
            && b.sw.is_finite()
            && b.ne.is_finite()
        {
            return Some(ChapterViewHint::Bounds(b));
        }
        let center = self.center.filter(LngLat::is_finite)?;
        Some(ChapterViewHint::Center {
            center,
            zoom: self.zoom.filter(|z| z.is_finite()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawNarrative {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    chapters: BTreeMap<String, Chapter>,
}

/// A narrative with chapters in reading order: by `order`, then by id.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "RawNarrative")]
pub struct Narrative {
    pub id: String,
    pub title: String,
    chapters: Vec<Chapter>,
}

impl From<RawNarrative> for Narrative {
    fn from(raw: RawNarrative) -> Self {
        Self::new(
            raw.id,
            raw.title,
            raw.chapters.into_iter().map(|(id, chapter)| Chapter { id, ..chapter }),
        )
    }
}

impl Narrative {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        chapters: impl IntoIterator<Item = Chapter>,
    ) -> Self {
        let mut chapters: Vec<Chapter> = chapters.into_iter().collect();
        chapters.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        Self {
            id: id.into(),
            title: title.into(),
            chapters,
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, NarrativeError> {
        serde_json::from_str(raw).map_err(|e| NarrativeError::Parse(e.to_string()))
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn chapter(&self, id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == id)
    }

    pub fn first(&self) -> Option<&Chapter> {
        self.chapters.first()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }
}
