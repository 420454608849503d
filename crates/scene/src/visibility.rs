use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationConfig {
    /// Minimum visible fraction of a chapter section before it can activate.
    pub threshold: f64,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self { threshold: 0.9 }
    }
}

/// One intersection-observer notification for a chapter section.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry {
    pub chapter: String,
    pub ratio: f64,
    pub intersecting: bool,
}

impl IntersectionEntry {
    pub fn new(chapter: impl Into<String>, ratio: f64) -> Self {
        Self {
            chapter: chapter.into(),
            ratio,
            intersecting: ratio > 0.0,
        }
    }

    pub fn left(chapter: impl Into<String>) -> Self {
        Self {
            chapter: chapter.into(),
            ratio: 0.0,
            intersecting: false,
        }
    }
}

/// Picks the active chapter from visibility notifications.
///
/// Notifications only carry sections whose visibility changed, so the last
/// known ratio of every intersecting section is kept between batches.
#[derive(Debug, Clone, Default)]
pub struct ChapterVisibility {
    config: ActivationConfig,
    ratios: BTreeMap<String, f64>,
    active: Option<String>,
    // `None` accepts any section id.
    known: Option<BTreeSet<String>>,
}

impl ChapterVisibility {
    pub fn new(config: ActivationConfig) -> Self {
        Self {
            config,
            ratios: BTreeMap::new(),
            active: None,
            known: None,
        }
    }

    /// Only sections named here can become active; notifications for any
    /// other id are ignored until the next [`reset`](Self::reset).
    pub fn restrict_to<I, S>(&mut self, chapters: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known = Some(chapters.into_iter().map(Into::into).collect());
        self.ratios
            .retain(|c, _| self.known.as_ref().is_some_and(|k| k.contains(c)));
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Forces the active chapter (narrative activation picks the first one).
    pub fn set_active(&mut self, chapter: impl Into<String>) {
        self.active = Some(chapter.into());
    }

    pub fn reset(&mut self) {
        self.ratios.clear();
        self.active = None;
        self.known = None;
    }

    /// Folds a batch of notifications in and returns the newly active
    /// chapter, if the batch changed it.
    ///
    /// A chapter activates only when its ratio is at or above the threshold
    /// and strictly greater than every other intersecting section's ratio.
    pub fn observe(&mut self, entries: &[IntersectionEntry]) -> Option<String> {
        for e in entries {
            if !e.ratio.is_finite() {
                warn!(chapter = %e.chapter, "ignoring non-finite intersection ratio");
                continue;
            }
            if let Some(known) = &self.known
                && !known.contains(&e.chapter)
            {
                debug!(chapter = %e.chapter, "ignoring notification for unknown section");
                continue;
            }
            if e.intersecting {
                self.ratios.insert(e.chapter.clone(), e.ratio.clamp(0.0, 1.0));
            } else {
                self.ratios.remove(&e.chapter);
            }
        }

        let mut best: Option<(&String, f64)> = None;
        let mut tied = false;
        for (chapter, &ratio) in &self.ratios {
            match best {
                Some((_, r)) if ratio < r => {}
                Some((_, r)) if ratio == r => tied = true,
                _ => {
                    best = Some((chapter, ratio));
                    tied = false;
                }
            }
        }

        let (chapter, ratio) = best?;
        if tied || ratio < self.config.threshold {
            return None;
        }
        if self.active.as_deref() == Some(chapter.as_str()) {
            return None;
        }
        debug!(chapter = %chapter, ratio, "active chapter changed");
        let chapter = chapter.clone();
        self.active = Some(chapter.clone());
        Some(chapter)
    }
}
