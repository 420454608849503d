use std::collections::{BTreeMap, BTreeSet};

pub mod era;
pub mod record;
pub mod resolve;

pub use era::*;
pub use record::*;
pub use resolve::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The collaborator could not be reached or answered with an error.
    Unavailable(String),
    Corrupt(String),
    /// The record exists but has nothing the map can draw.
    Unrenderable { id: String, reason: String },
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Unavailable(msg) => write!(f, "map catalog unavailable: {msg}"),
            CatalogError::Corrupt(msg) => write!(f, "map catalog data corrupt: {msg}"),
            CatalogError::Unrenderable { id, reason } => {
                write!(f, "map {id} cannot be drawn: {reason}")
            }
        }
    }
}

impl std::error::Error for CatalogError {}

/// Map-data collaborator.
///
/// `Ok(None)` means the id does not exist; errors are transport failures.
#[allow(async_fn_in_trait)]
pub trait MapCatalog {
    async fn fetch_map(&self, id: &str) -> Result<Option<MapRecord>, CatalogError>;

    async fn fetch_map_group(&self, id: &str) -> Result<Option<MapGroupRecord>, CatalogError>;
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryMapCatalog {
    records: BTreeMap<String, MapRecord>,
    groups: BTreeMap<String, MapGroupRecord>,
    unavailable: BTreeSet<String>,
}

impl InMemoryMapCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON array of records keyed by their `id`.
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let records = serde_json::from_str::<Vec<MapRecord>>(raw)
            .map_err(|e| CatalogError::Corrupt(e.to_string()))?;
        let mut catalog = Self::new();
        for record in records {
            if record.id.trim().is_empty() {
                return Err(CatalogError::Corrupt("map record without id".to_string()));
            }
            catalog.insert(record);
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, record: MapRecord) {
        self.records.insert(record.id.clone(), record);
    }

    /// Adds map groups from a JSON array, keyed by their `id`.
    pub fn insert_groups_json(&mut self, raw: &str) -> Result<(), CatalogError> {
        let groups = serde_json::from_str::<Vec<MapGroupRecord>>(raw)
            .map_err(|e| CatalogError::Corrupt(e.to_string()))?;
        if groups.iter().any(|g| g.id.trim().is_empty()) {
            return Err(CatalogError::Corrupt("map group without id".to_string()));
        }
        for group in groups {
            self.insert_group(group);
        }
        Ok(())
    }

    pub fn insert_group(&mut self, group: MapGroupRecord) {
        self.groups.insert(group.id.clone(), group);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&MapRecord> {
        self.records.get(id)
    }

    pub fn records(&self) -> impl Iterator<Item = &MapRecord> {
        self.records.values()
    }

    /// Makes every fetch of `id` (map or group) fail, for exercising error paths.
    pub fn mark_unavailable(&mut self, id: impl Into<String>) {
        self.unavailable.insert(id.into());
    }
}

impl MapCatalog for InMemoryMapCatalog {
    async fn fetch_map(&self, id: &str) -> Result<Option<MapRecord>, CatalogError> {
        if self.unavailable.contains(id) {
            return Err(CatalogError::Unavailable(format!("fetch of {id} failed")));
        }
        Ok(self.records.get(id).cloned())
    }

    async fn fetch_map_group(&self, id: &str) -> Result<Option<MapGroupRecord>, CatalogError> {
        if self.unavailable.contains(id) {
            return Err(CatalogError::Unavailable(format!("fetch of group {id} failed")));
        }
        Ok(self.groups.get(id).cloned())
    }
}
