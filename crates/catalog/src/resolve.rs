use std::collections::BTreeMap;

use futures_util::future::join_all;
use layers::OverlayDescriptor;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::MapCatalog;

/// A chapter's reference to a catalog map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapRef {
    pub id: String,
    #[serde(rename = "opacityVal", default = "full_opacity")]
    pub opacity: f64,
}

fn full_opacity() -> f64 {
    1.0
}

impl MapRef {
    pub fn new(id: impl Into<String>, opacity: f64) -> Self {
        Self {
            id: id.into(),
            opacity,
        }
    }
}

/// Fetches every referenced map concurrently and builds the desired list.
///
/// Order follows `refs`. Missing, failed and undrawable references are
/// dropped with a warning. A repeated id keeps its first position and the
/// later reference's opacity.
pub async fn resolve_map_refs<C: MapCatalog + ?Sized>(
    catalog: &C,
    refs: &[MapRef],
) -> Vec<OverlayDescriptor> {
    let fetched = join_all(refs.iter().map(|r| catalog.fetch_map(&r.id))).await;

    let mut out: Vec<OverlayDescriptor> = Vec::with_capacity(refs.len());
    let mut index: BTreeMap<String, usize> = BTreeMap::new();
    for (r, result) in refs.iter().zip(fetched) {
        let record = match result {
            Ok(Some(record)) => record,
            Ok(None) => {
                warn!(map = %r.id, "dropping unresolved map reference");
                continue;
            }
            Err(e) => {
                warn!(map = %r.id, "dropping map reference: {e}");
                continue;
            }
        };
        let descriptor = match record.to_descriptor(r.opacity) {
            Ok(d) => d,
            Err(e) => {
                warn!(map = %r.id, "dropping map reference: {e}");
                continue;
            }
        };
        match index.get(&r.id) {
            Some(&at) => {
                warn!(map = %r.id, "map referenced twice, keeping the later reference");
                out[at] = descriptor;
            }
            None => {
                index.insert(r.id.clone(), out.len());
                out.push(descriptor);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{MapRef, resolve_map_refs};
    use crate::InMemoryMapCatalog;
    use pretty_assertions::assert_eq;

    fn catalog() -> InMemoryMapCatalog {
        InMemoryMapCatalog::from_json_str(
            r#"[
                {"id": "raster-a", "raster_image": "a.png",
                 "image_bounds_coords": ["0,1", "1,1", "1,0", "0,0"]},
                {"id": "pins-b", "vector_points": [{"coordinates": "0.5,0.5"}]},
                {"id": "empty"}
            ]"#,
        )
        .expect("catalog")
    }

    #[test]
    fn keeps_reference_order_and_opacity() {
        let refs = vec![MapRef::new("pins-b", 0.5), MapRef::new("raster-a", 1.0)];
        let out = pollster::block_on(resolve_map_refs(&catalog(), &refs));
        let got: Vec<(&str, f64)> = out.iter().map(|d| (d.id.as_str(), d.opacity)).collect();
        assert_eq!(got, vec![("pins-b", 0.5), ("raster-a", 1.0)]);
    }

    #[test]
    fn drops_missing_failing_and_undrawable_refs() {
        let mut catalog = catalog();
        catalog.mark_unavailable("pins-b");
        let refs = vec![
            MapRef::new("nope", 1.0),
            MapRef::new("pins-b", 1.0),
            MapRef::new("empty", 1.0),
            MapRef::new("raster-a", 0.3),
        ];
        let out = pollster::block_on(resolve_map_refs(&catalog, &refs));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id.as_str(), "raster-a");
    }

    #[test]
    fn repeated_reference_keeps_later_opacity() {
        let refs = vec![
            MapRef::new("raster-a", 0.2),
            MapRef::new("pins-b", 1.0),
            MapRef::new("raster-a", 0.9),
        ];
        let out = pollster::block_on(resolve_map_refs(&catalog(), &refs));
        let got: Vec<(&str, f64)> = out.iter().map(|d| (d.id.as_str(), d.opacity)).collect();
        assert_eq!(got, vec![("raster-a", 0.9), ("pins-b", 1.0)]);
    }

    #[test]
    fn opacity_val_defaults_to_one() {
        let r: MapRef = serde_json::from_str(r#"{"id": "x"}"#).expect("parse");
        assert_eq!(r.opacity, 1.0);
        let r: MapRef = serde_json::from_str(r#"{"id": "x", "opacityVal": 0.4}"#).expect("parse");
        assert_eq!(r.opacity, 0.4);
    }
}
