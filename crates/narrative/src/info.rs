use catalog::MapRecord;

use crate::{FootnoteStore, transform};

/// Content of the "map information" modal.
#[derive(Debug, Clone, PartialEq)]
pub struct MapInfo {
    pub title: String,
    pub years: String,
    pub html: String,
    pub footnotes: FootnoteStore,
}

impl MapInfo {
    /// Description footnotes get ids scoped by the map id.
    pub fn from_record(record: &MapRecord) -> Self {
        let t = transform(&record.id, &record.description);
        let mut footnotes = FootnoteStore::new();
        footnotes.extend(t.records);
        Self {
            title: record.title.clone(),
            years: record.years.clone(),
            html: t.html,
            footnotes,
        }
    }
}
