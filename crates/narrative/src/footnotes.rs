//! Footnote extraction for chapter and map-description HTML.
//!
//! Authors embed notes as
//! `<footnote><text>shown inline</text><content>detail html</content></footnote>`,
//! often entity-escaped by the rich-text editor. Each block is replaced by an
//! interactive placeholder; the detail is kept aside in a [`FootnoteStore`]
//! and shown on demand.

use std::collections::BTreeMap;

use foundation::html::{decode_basic_entities, escape_html, strip_tags};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

use crate::Narrative;

static FOOTNOTE_RE: Lazy<Regex> = Lazy::new(|| block_pattern("footnote"));
static TEXT_RE: Lazy<Regex> = Lazy::new(|| block_pattern("text"));
static CONTENT_RE: Lazy<Regex> = Lazy::new(|| block_pattern("content"));

// Non-greedy, case-insensitive, spans newlines; attributes on the open tag are ignored.
fn block_pattern(tag: &str) -> Regex {
    Regex::new(&format!(r"(?is)<{tag}\b[^>]*>(.*?)</{tag}\s*>")).expect("static tag pattern")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FootnoteRecord {
    pub id: String,
    /// Tag-stripped and escaped; safe to inline.
    pub display_text: String,
    /// Raw detail HTML for the modal, never escaped.
    pub modal_html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedChapter {
    pub chapter_id: String,
    pub html: String,
    pub records: Vec<FootnoteRecord>,
}

/// Footnote id for the `ordinal`-th block (0-based) of a chapter.
pub fn footnote_id(chapter_id: &str, ordinal: usize) -> String {
    format!("{chapter_id}-fn-{ordinal}")
}

fn placeholder(id: &str, display_text: &str) -> String {
    format!(
        r#"<span class="footnote-ref" data-footnote-id="{}" role="button" tabindex="0">{}</span>"#,
        escape_html(id),
        display_text
    )
}

fn inner<'h>(re: &Regex, block: &'h str) -> Option<&'h str> {
    re.captures(block)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Decodes entities once, then swaps every footnote block for a placeholder.
///
/// Ids are `{chapter_id}-fn-{n}` with `n` counting from zero on every call,
/// so reruns over the same input are identical. Records come back in
/// document order, built in the same pass that writes the placeholders.
pub fn transform(chapter_id: &str, raw_html: &str) -> TransformedChapter {
    let decoded = decode_basic_entities(raw_html);
    let mut records: Vec<FootnoteRecord> = Vec::new();

    let html = FOOTNOTE_RE
        .replace_all(&decoded, |caps: &Captures<'_>| {
            let block = caps.get(1).map_or("", |m| m.as_str());
            let ordinal = records.len();
            let id = footnote_id(chapter_id, ordinal);

            let text = inner(&TEXT_RE, block)
                .map(|t| strip_tags(t).trim().to_string())
                .unwrap_or_default();
            let display_text = if text.is_empty() {
                format!("[{}]", ordinal + 1)
            } else {
                escape_html(&text)
            };
            let modal_html = inner(&CONTENT_RE, block)
                .map(|c| c.trim().to_string())
                .unwrap_or_default();

            let out = placeholder(&id, &display_text);
            records.push(FootnoteRecord {
                id,
                display_text,
                modal_html,
            });
            out
        })
        .into_owned();

    if !records.is_empty() {
        debug!(chapter = chapter_id, footnotes = records.len(), "extracted footnotes");
    }
    TransformedChapter {
        chapter_id: chapter_id.to_string(),
        html,
        records,
    }
}

/// Lookup from footnote id to record for one rendering pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FootnoteStore {
    records: BTreeMap<String, FootnoteRecord>,
}

impl FootnoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_chapters<'a>(chapters: impl IntoIterator<Item = &'a TransformedChapter>) -> Self {
        let mut store = Self::new();
        for chapter in chapters {
            store.extend(chapter.records.iter().cloned());
        }
        store
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = FootnoteRecord>) {
        for r in records {
            self.records.insert(r.id.clone(), r);
        }
    }

    pub fn get(&self, id: &str) -> Option<&FootnoteRecord> {
        self.records.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Every chapter of `narrative` in reading order, plus the store for all of them.
pub fn transform_narrative(narrative: &Narrative) -> (Vec<TransformedChapter>, FootnoteStore) {
    let chapters: Vec<TransformedChapter> = narrative
        .chapters()
        .iter()
        .map(|c| transform(&c.id, &c.content))
        .collect();
    let store = FootnoteStore::from_chapters(&chapters);
    (chapters, store)
}
