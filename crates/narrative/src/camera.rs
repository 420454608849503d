use layers::{CameraMove, Padding};
use serde::{Deserialize, Serialize};

use crate::{Chapter, ChapterViewHint};

/// Side of the map covered by the fixed narrative panel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelSide {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Padding on every side when fitting chapter bounds, in pixels.
    pub base_padding: f64,
    /// Extra padding on the panel side.
    pub panel_padding: f64,
    pub panel_side: PanelSide,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            base_padding: 40.0,
            panel_padding: 420.0,
            panel_side: PanelSide::Left,
        }
    }
}

impl CameraConfig {
    pub fn fit_padding(&self) -> Padding {
        let mut p = Padding::uniform(self.base_padding);
        match self.panel_side {
            PanelSide::Left => p.left += self.panel_padding,
            PanelSide::Right => p.right += self.panel_padding,
        }
        p
    }

    /// Bounds → fit, else center → fly, else leave the camera alone.
    pub fn move_for(&self, chapter: &Chapter) -> Option<CameraMove> {
        Some(match chapter.view_hint()? {
            ChapterViewHint::Bounds(bounds) => CameraMove::FitBounds {
                bounds,
                padding: self.fit_padding(),
            },
            ChapterViewHint::Center { center, zoom } => CameraMove::FlyTo { center, zoom },
        })
    }
}
