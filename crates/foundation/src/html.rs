//! Minimal HTML text helpers shared by popups and footnotes.

fn decode_basic_entity(entity: &str) -> Option<char> {
    if entity.eq_ignore_ascii_case("amp") {
        Some('&')
    } else if entity.eq_ignore_ascii_case("lt") {
        Some('<')
    } else if entity.eq_ignore_ascii_case("gt") {
        Some('>')
    } else if entity.eq_ignore_ascii_case("quot") {
        Some('"')
    } else if entity == "#39" || entity.eq_ignore_ascii_case("apos") {
        Some('\'')
    } else {
        None
    }
}

/// Decodes the five standard entities exactly once.
///
/// The scan never re-examines its own output, so `&amp;lt;` becomes `&lt;`
/// and not `<`. Unknown entities are left untouched.
pub fn decode_basic_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        // Longest entity we decode is "quot"/"apos"; bound the lookahead.
        let decoded = tail
            .char_indices()
            .take(6)
            .find(|&(_, c)| c == ';')
            .and_then(|(semi, _)| decode_basic_entity(&tail[..semi]).map(|ch| (ch, semi)));
        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Escapes text for literal display inside HTML content or attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Drops everything between `<` and the next `>`.
///
/// An unterminated `<` keeps the remainder as text.
pub fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => rest = &rest[open + close + 1..],
            None => {
                out.push_str(&rest[open..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}
