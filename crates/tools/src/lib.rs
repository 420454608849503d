//! Text reports behind the `storymap` binary.

use catalog::{EraRecord, InMemoryMapCatalog, MapRecord, resolve_eras};
use layers::{ApplyReport, RecordingSurface};
use narrative::{MapInfo, Narrative, NarrativeError, Session, SessionConfig, transform_narrative};
use scene::IntersectionEntry;

/// Transformed chapters in reading order, then the footnote store.
pub fn footnotes_report(narrative: &Narrative) -> Vec<String> {
    let (chapters, store) = transform_narrative(narrative);
    let mut out = Vec::new();
    for chapter in &chapters {
        out.push(format!("== {} ({} footnotes)", chapter.chapter_id, chapter.records.len()));
        out.push(chapter.html.clone());
    }
    out.push(format!("== store ({} records)", store.len()));
    for id in store.ids() {
        if let Some(r) = store.get(id) {
            out.push(format!("{id}\t{}\t{}", r.display_text, r.modal_html));
        }
    }
    out
}

fn summarize(report: Option<&ApplyReport>) -> String {
    match report {
        Some(r) => format!(
            "pass {}: +{} -{} ~{} skipped {}",
            r.pass,
            r.added.len(),
            r.removed.len(),
            r.updated.len(),
            r.skipped.len()
        ),
        None => "no pass".to_string(),
    }
}

/// Opens `narrative` on a recording surface, scrolls through every chapter
/// and lists the surface calls each step caused.
pub fn replay_report(
    catalog: &InMemoryMapCatalog,
    narrative: Narrative,
    config: SessionConfig,
) -> Result<Vec<String>, NarrativeError> {
    let chapter_ids: Vec<String> = narrative.chapters().iter().map(|c| c.id.clone()).collect();
    let mut session = Session::new(RecordingSurface::new(), config);
    let mut out = Vec::new();

    session.on_map_ready();
    session.view_mut().surface_mut().take_calls();

    let report = pollster::block_on(session.open_narrative(catalog, narrative))?;
    push_step(&mut out, &mut session, chapter_ids.first().map_or("", String::as_str), report.as_ref());

    for pair in chapter_ids.windows(2) {
        let entries = [IntersectionEntry::left(pair[0].as_str()), IntersectionEntry::new(pair[1].as_str(), 1.0)];
        let report = pollster::block_on(session.on_visibility(catalog, &entries));
        push_step(&mut out, &mut session, &pair[1], report.as_ref());
    }

    let events = session.view().reconciler().events().events().len();
    out.push(format!("== done: {} overlays on map, {events} trace events", session.view().reconciler().len()));
    Ok(out)
}

fn push_step(
    out: &mut Vec<String>,
    session: &mut Session<RecordingSurface>,
    chapter: &str,
    report: Option<&ApplyReport>,
) {
    out.push(format!("== chapter {chapter}: {}", summarize(report)));
    for call in session.view_mut().surface_mut().take_calls() {
        out.push(format!("  {call}"));
    }
}

/// The browse catalog: eras in order with their resolved maps and groups.
pub fn eras_report(catalog: &InMemoryMapCatalog, eras: Vec<EraRecord>) -> Vec<String> {
    let mut out = Vec::new();
    for era in pollster::block_on(resolve_eras(catalog, eras)) {
        out.push(format!("== {} ({})", era.title, era.years));
        let entries = era
            .maps
            .iter()
            .map(|m| (m.id.as_str(), m.title.as_str(), "map"))
            .chain(era.map_groups.iter().map(|g| (g.id.as_str(), g.title.as_str(), "group")));
        for (id, title, what) in entries {
            let indent = if era.is_indented(id) { "    " } else { "  " };
            out.push(format!("{indent}{what} {id}\t{title}"));
        }
    }
    out
}

pub fn map_info_report(record: &MapRecord) -> Vec<String> {
    let info = MapInfo::from_record(record);
    let mut out = vec![format!("== {} ({})", info.title, info.years), info.html];
    for id in info.footnotes.ids() {
        if let Some(r) = info.footnotes.get(id) {
            out.push(format!("{id}\t{}\t{}", r.display_text, r.modal_html));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{eras_report, footnotes_report, map_info_report, replay_report};
    use catalog::{EraRecord, InMemoryMapCatalog};
    use narrative::{Narrative, SessionConfig};
    use pretty_assertions::assert_eq;

    const MAPS: &str = r#"[
        {"id": "a", "title": "A", "years": "1853", "raster_image": "a.png",
         "description": "<p>Survey<footnote><text>src</text><content>USCS</content></footnote></p>",
         "image_bounds_coords": ["0,1", "1,1", "1,0", "0,0"]},
        {"id": "b", "vector_points": [{"coordinates": "0.5,0.5"}]}
    ]"#;

    const NARRATIVE: &str = r#"{
        "id": "n",
        "chapters": {
            "one": {"order": 0, "maps": [{"id": "a"}], "content": "x<footnote><text>t</text><content>c</content></footnote>"},
            "two": {"order": 1, "maps": [{"id": "b"}], "center": [0.5, 0.5]}
        }
    }"#;

    #[test]
    fn footnote_report_lists_store() {
        let n = Narrative::from_json_str(NARRATIVE).expect("narrative");
        let lines = footnotes_report(&n);
        assert_eq!(lines[0], "== one (1 footnotes)");
        assert_eq!(lines.last().map(String::as_str), Some("one-fn-0\tt\tc"));
    }

    #[test]
    fn replay_walks_every_chapter() {
        let catalog = InMemoryMapCatalog::from_json_str(MAPS).expect("maps");
        let n = Narrative::from_json_str(NARRATIVE).expect("narrative");
        let lines = replay_report(&catalog, n, SessionConfig::default()).expect("replay");

        assert_eq!(lines[0], "== chapter one: pass 1: +1 -0 ~0 skipped 0");
        assert!(lines.contains(&"  add-layer raster-layer-a".to_string()));
        let two = lines
            .iter()
            .position(|l| l.starts_with("== chapter two"))
            .expect("chapter two");
        assert_eq!(lines[two + 1], "  fly-to 0.5,0.5");
        assert_eq!(lines[two + 2], "  remove-layer raster-layer-a");
        assert!(lines.last().is_some_and(|l| l.starts_with("== done: 1 overlays")));
    }

    #[test]
    fn eras_list_resolved_maps_in_order() {
        let mut catalog = InMemoryMapCatalog::from_json_str(MAPS).expect("maps");
        catalog
            .insert_groups_json(r#"[{"id": "g", "title": "Group", "map_ids": ["a"]}]"#)
            .expect("groups");
        let eras = EraRecord::list_from_json_str(
            r#"[
                {"id": "late", "title": "Late", "years": "1900", "order": 2, "maps": ["b"]},
                {"id": "early", "title": "Early", "years": "1850", "order": 1,
                 "maps": ["a", "missing"], "map_groups": ["g"], "indented": ["g"]}
            ]"#,
        )
        .expect("eras");
        let lines = eras_report(&catalog, eras);
        assert_eq!(
            lines,
            vec![
                "== Early (1850)",
                "  map a\tA",
                "    group g\tGroup",
                "== Late (1900)",
                "  map b\t",
            ]
        );
    }

    #[test]
    fn map_info_transforms_description() {
        let catalog = InMemoryMapCatalog::from_json_str(MAPS).expect("maps");
        let lines = map_info_report(catalog.get("a").expect("a"));
        assert_eq!(lines[0], "== A (1853)");
        assert!(lines[1].contains("data-footnote-id=\"a-fn-0\""));
        assert_eq!(lines[2], "a-fn-0\tsrc\tUSCS");
    }
}
