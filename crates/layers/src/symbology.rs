use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Pin icons and popup styling for vector overlays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbologyConfig {
    pub icon_name: String,
    pub icon_asset: String,
    pub directional_icon_name: String,
    pub directional_icon_asset: String,
    pub icon_size: f64,
    pub popup_max_width_px: u32,
}

impl Default for SymbologyConfig {
    fn default() -> Self {
        Self {
            icon_name: "arrow-icon".to_string(),
            icon_asset: "pin.png".to_string(),
            directional_icon_name: "arrow-icon-directional".to_string(),
            directional_icon_asset: "pin-directional.png".to_string(),
            icon_size: 0.3,
            popup_max_width_px: 400,
        }
    }
}

impl SymbologyConfig {
    pub fn symbol_layout(&self) -> SymbolLayout {
        SymbolLayout {
            icon: self.icon_name.clone(),
            directional_icon: self.directional_icon_name.clone(),
            icon_size: self.icon_size,
        }
    }

    /// `(name, asset)` pairs registered on every readiness signal.
    pub fn icons(&self) -> [(&str, &str); 2] {
        [
            (self.icon_name.as_str(), self.icon_asset.as_str()),
            (
                self.directional_icon_name.as_str(),
                self.directional_icon_asset.as_str(),
            ),
        ]
    }
}

/// Layout of a pin layer: icon picked per feature by its `is_directional`
/// property, rotated by its `bearing`.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolLayout {
    pub icon: String,
    pub directional_icon: String,
    pub icon_size: f64,
}

impl SymbolLayout {
    pub fn to_style_json(&self) -> Value {
        json!({
            "icon-image": [
                "case",
                ["==", ["get", "is_directional"], true],
                self.directional_icon,
                self.icon,
            ],
            "icon-size": self.icon_size,
            "icon-rotate": ["get", "bearing"],
            "icon-allow-overlap": true,
            "icon-anchor": "center",
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PaintProperty {
    RasterOpacity,
    IconOpacity,
}

impl PaintProperty {
    pub fn name(self) -> &'static str {
        match self {
            PaintProperty::RasterOpacity => "raster-opacity",
            PaintProperty::IconOpacity => "icon-opacity",
        }
    }
}
