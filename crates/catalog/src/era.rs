use std::collections::BTreeSet;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{CatalogError, MapCatalog, MapRecord};

/// A named bundle of maps, listed inside an era.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapGroupRecord {
    pub id: String,
    pub title: String,
    pub years: String,
    pub description: String,
    pub map_ids: Vec<String>,
}

/// A period of the browse catalog as stored: map and group ids only.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EraRecord {
    pub id: String,
    pub title: String,
    pub years: String,
    pub description: String,
    pub order: i64,
    pub maps: Vec<String>,
    pub map_groups: Vec<String>,
    /// Map or group ids drawn indented under the previous entry.
    pub indented: Vec<String>,
}

impl EraRecord {
    /// Parses a JSON array of era records.
    pub fn list_from_json_str(raw: &str) -> Result<Vec<EraRecord>, CatalogError> {
        serde_json::from_str(raw).map_err(|e| CatalogError::Corrupt(e.to_string()))
    }
}

/// An era with its references resolved, ready for the browse panel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Era {
    pub id: String,
    pub title: String,
    pub years: String,
    pub description: String,
    pub maps: Vec<MapRecord>,
    pub map_groups: Vec<MapGroupRecord>,
    pub indented: BTreeSet<String>,
}

impl Era {
    pub fn is_indented(&self, id: &str) -> bool {
        self.indented.contains(id)
    }
}

/// Resolves every era's map and group ids concurrently.
///
/// Eras come back sorted by `(order, id)`. Ids that are missing or whose
/// fetch failed are dropped with a warning; the rest keep their listed order.
pub async fn resolve_eras<C: MapCatalog + ?Sized>(catalog: &C, mut eras: Vec<EraRecord>) -> Vec<Era> {
    eras.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
    let resolved = join_all(eras.into_iter().map(|era| resolve_era(catalog, era))).await;
    debug!(eras = resolved.len(), "browse catalog resolved");
    resolved
}

async fn resolve_era<C: MapCatalog + ?Sized>(catalog: &C, era: EraRecord) -> Era {
    let maps = join_all(era.maps.iter().map(|id| catalog.fetch_map(id))).await;
    let groups = join_all(era.map_groups.iter().map(|id| catalog.fetch_map_group(id))).await;

    Era {
        maps: keep_found(&era.id, "map", &era.maps, maps),
        map_groups: keep_found(&era.id, "map group", &era.map_groups, groups),
        indented: era.indented.into_iter().collect(),
        id: era.id,
        title: era.title,
        years: era.years,
        description: era.description,
    }
}

fn keep_found<T>(
    era: &str,
    what: &str,
    ids: &[String],
    fetched: Vec<Result<Option<T>, CatalogError>>,
) -> Vec<T> {
    ids.iter()
        .zip(fetched)
        .filter_map(|(id, result)| match result {
            Ok(Some(found)) => Some(found),
            Ok(None) => {
                warn!(era, id = %id, "dropping missing {what}");
                None
            }
            Err(e) => {
                warn!(era, id = %id, "dropping {what}: {e}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{EraRecord, resolve_eras};
    use crate::InMemoryMapCatalog;
    use pretty_assertions::assert_eq;

    fn catalog() -> InMemoryMapCatalog {
        let mut catalog = InMemoryMapCatalog::from_json_str(
            r#"[
                {"id": "harbor-1853", "title": "Harbor"},
                {"id": "plat-1870", "title": "Plat"},
                {"id": "fire-1906", "title": "Fire"}
            ]"#,
        )
        .expect("maps");
        catalog
            .insert_groups_json(
                r#"[{"id": "sanborn", "title": "Sanborn sheets", "map_ids": ["fire-1906"]}]"#,
            )
            .expect("groups");
        catalog
    }

    fn eras() -> Vec<EraRecord> {
        EraRecord::list_from_json_str(
            r#"[
                {"id": "modern", "title": "Modern", "order": 3, "maps": ["fire-1906"]},
                {"id": "gold-rush", "title": "Gold Rush", "order": 1,
                 "maps": ["plat-1870", "gone", "harbor-1853"],
                 "map_groups": ["sanborn", "no-such-group"],
                 "indented": ["harbor-1853"]},
                {"id": "american", "title": "American", "order": 1}
            ]"#,
        )
        .expect("eras")
    }

    #[test]
    fn eras_sorted_by_order_then_id() {
        let out = pollster::block_on(resolve_eras(&catalog(), eras()));
        let ids: Vec<&str> = out.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["american", "gold-rush", "modern"]);
        assert!(out[0].maps.is_empty() && out[0].map_groups.is_empty());
    }

    #[test]
    fn missing_ids_are_dropped_and_order_kept() {
        let out = pollster::block_on(resolve_eras(&catalog(), eras()));
        let gold = &out[1];
        let maps: Vec<&str> = gold.maps.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(maps, vec!["plat-1870", "harbor-1853"]);
        assert_eq!(gold.map_groups.len(), 1);
        assert_eq!(gold.map_groups[0].map_ids, vec!["fire-1906".to_string()]);
        assert!(gold.is_indented("harbor-1853"));
        assert!(!gold.is_indented("plat-1870"));
    }

    #[test]
    fn failed_fetch_drops_only_that_map() {
        let mut catalog = catalog();
        catalog.mark_unavailable("plat-1870");
        let out = pollster::block_on(resolve_eras(&catalog, eras()));
        let maps: Vec<&str> = out[1].maps.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(maps, vec!["harbor-1853"]);
        assert_eq!(out[2].maps.len(), 1);
    }

    #[test]
    fn malformed_era_list_is_corrupt() {
        assert!(EraRecord::list_from_json_str(r#"{"id": "x"}"#).is_err());
    }
}
