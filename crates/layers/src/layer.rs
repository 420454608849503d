use foundation::OverlayKey;

/// Name of a source registered on the render surface.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(pub String);

/// Name of a layer registered on the render surface.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(pub String);

impl SourceId {
    pub fn for_overlay(key: &OverlayKey) -> Self {
        Self(key.source_name())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl LayerId {
    pub fn for_overlay(key: &OverlayKey) -> Self {
        Self(key.layer_name())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
