use serde::{Deserialize, Serialize};

/// Catalog identifier of a selectable map overlay.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverlayId(String);

impl OverlayId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OverlayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OverlayId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for OverlayId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayKind {
    Raster,
    Vector,
}

impl OverlayKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OverlayKind::Raster => "raster",
            OverlayKind::Vector => "vector",
        }
    }
}

/// `{kind, id}` carried explicitly through reconciliation.
///
/// Surface handle names are derived from this key and never parsed back.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OverlayKey {
    pub kind: OverlayKind,
    pub id: OverlayId,
}

impl OverlayKey {
    pub fn new(kind: OverlayKind, id: OverlayId) -> Self {
        Self { kind, id }
    }

    pub fn source_name(&self) -> String {
        format!("{}-source-{}", self.kind.as_str(), self.id)
    }

    pub fn layer_name(&self) -> String {
        format!("{}-layer-{}", self.kind.as_str(), self.id)
    }
}

impl std::fmt::Display for OverlayKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::{OverlayId, OverlayKey, OverlayKind};

    #[test]
    fn handle_names_are_kind_scoped() {
        let r = OverlayKey::new(OverlayKind::Raster, OverlayId::new("a"));
        let v = OverlayKey::new(OverlayKind::Vector, OverlayId::new("a"));
        assert_eq!(r.source_name(), "raster-source-a");
        assert_eq!(r.layer_name(), "raster-layer-a");
        assert_ne!(r.layer_name(), v.layer_name());
        assert_ne!(r, v);
    }
}
