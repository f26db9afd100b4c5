//! Table-of-contents extraction and heading anchor injection.
//!
//! Headings are found with a single permissive regex pass over the HTML,
//! then the document is rebuilt span by span so each `id` lands exactly on
//! the heading it belongs to, even when two headings share identical markup.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use slugpress_shared::HeadingEntry;

use crate::text::strip_markup;

/// A TOC is only built when a document has more headings than this.
pub const TOC_THRESHOLD: usize = 3;

/// Result of [`extract`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// The HTML with anchor ids injected (unchanged below the threshold).
    pub html: String,
    /// Headings in document order; empty below the threshold.
    pub toc: Vec<HeadingEntry>,
}

/// State of a heading's own `id` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
enum HeadingId {
    Missing,
    /// A non-blank id, reused as the anchor.
    Named(String),
    /// Byte span of a blank `id` attribute (`id=""`, `id`), rewritten in place.
    Blank(Range<usize>),
}

/// A heading found by the scan, located by byte offsets into the source.
#[derive(Debug, Clone)]
struct HeadingMatch {
    level: u8,
    /// Offset just past the tag name (`<h2` → start + 3).
    name_end: usize,
    id: HeadingId,
    text: String,
}

/// Scan `html` for `<h1>`..`<h6>` elements and inject anchor targets.
///
/// With more than [`TOC_THRESHOLD`] headings, heading `index` (0-based, in scan
/// order) gets `id="heading-<index>"` inserted right after its tag name and a
/// matching TOC entry. Headings that already carry a non-blank `id` keep it,
/// and the TOC entry points at the existing id instead. A blank `id` is
/// replaced where it stands.
#[instrument(skip_all, fields(len = html.len()))]
pub fn extract(html: &str) -> Extraction {
    let headings = scan_headings(html);

    if headings.len() <= TOC_THRESHOLD {
        debug!(heading_count = headings.len(), "below TOC threshold");
        return Extraction {
            html: html.to_string(),
            toc: Vec::new(),
        };
    }

    let mut rewritten = String::with_capacity(html.len() + headings.len() * 20);
    let mut cursor = 0;
    let mut toc = Vec::with_capacity(headings.len());

    for (index, heading) in headings.into_iter().enumerate() {
        let anchor_id = match heading.id {
            HeadingId::Named(id) => id,
            HeadingId::Missing => {
                let id = format!("heading-{index}");
                rewritten.push_str(&html[cursor..heading.name_end]);
                push_id_attr(&mut rewritten, " ", &id);
                cursor = heading.name_end;
                id
            }
            HeadingId::Blank(span) => {
                let id = format!("heading-{index}");
                rewritten.push_str(&html[cursor..span.start]);
                push_id_attr(&mut rewritten, "", &id);
                cursor = span.end;
                id
            }
        };

        toc.push(HeadingEntry {
            level: heading.level,
            text: heading.text,
            anchor_id,
        });
    }
    rewritten.push_str(&html[cursor..]);

    debug!(heading_count = toc.len(), "TOC built");

    Extraction {
        html: rewritten,
        toc,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn push_id_attr(out: &mut String, lead: &str, id: &str) {
    out.push_str(lead);
    out.push_str("id=\"");
    out.push_str(id);
    out.push('"');
}

/// Find every heading element in document order.
fn scan_headings(html: &str) -> Vec<HeadingMatch> {
    // Attributes must be whitespace-separated from the tag name, so `<header>`
    // and `<hr>` never match. Quoted values may contain `>`.
    static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?is)<h([1-6])((?:\s(?:[^>"']|"[^"]*"|'[^']*')*)?)>(.*?)</h[1-6]\s*>"#)
            .expect("valid regex")
    });

    HEADING_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let level = caps.get(1)?.as_str().parse::<u8>().ok()?;
            let inner = caps.get(3).map_or("", |m| m.as_str());

            let id = match caps.get(2) {
                Some(attrs) => match heading_id(attrs.as_str()) {
                    HeadingId::Blank(span) => {
                        HeadingId::Blank(attrs.start() + span.start..attrs.start() + span.end)
                    }
                    other => other,
                },
                None => HeadingId::Missing,
            };

            Some(HeadingMatch {
                level,
                name_end: whole.start() + 3,
                id,
                text: strip_markup(inner),
            })
        })
        .collect()
}

/// One attribute in a start tag, with byte offsets into the attribute string.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Attribute<'a> {
    name: &'a str,
    value: Option<&'a str>,
    span: Range<usize>,
}

/// Split a raw attribute string into attributes. Quoted values are taken
/// whole, so `=`, whitespace and `>` inside them never start a new attribute.
fn attributes(attrs: &str) -> Vec<Attribute<'_>> {
    let bytes = attrs.as_bytes();
    let len = bytes.len();
    let mut out = Vec::new();
    let mut i = 0;

    while i < len {
        while i < len && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        if i >= len {
            break;
        }

        let start = i;
        while i < len && !bytes[i].is_ascii_whitespace() && !matches!(bytes[i], b'=' | b'/') {
            i += 1;
        }
        if i == start {
            // Stray `=` with no name.
            i += 1;
            continue;
        }
        let name = &attrs[start..i];

        let mut j = i;
        while j < len && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        let mut value = None;
        if j < len && bytes[j] == b'=' {
            j += 1;
            while j < len && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < len && matches!(bytes[j], b'"' | b'\'') {
                let quote = bytes[j];
                let value_start = j + 1;
                let value_end = attrs[value_start..]
                    .bytes()
                    .position(|b| b == quote)
                    .map_or(len, |p| value_start + p);
                value = Some(&attrs[value_start..value_end]);
                i = (value_end + 1).min(len);
            } else {
                let value_start = j;
                while j < len && !bytes[j].is_ascii_whitespace() {
                    j += 1;
                }
                value = Some(&attrs[value_start..j]);
                i = j;
            }
        }

        out.push(Attribute {
            name,
            value,
            span: start..i,
        });
    }

    out
}

/// The heading's own `id`, if any. The first `id` attribute wins.
fn heading_id(attrs: &str) -> HeadingId {
    let Some(attr) = attributes(attrs)
        .into_iter()
        .find(|a| a.name.eq_ignore_ascii_case("id"))
    else {
        return HeadingId::Missing;
    };

    match attr.value.map(str::trim) {
        Some(value) if !value.is_empty() => HeadingId::Named(value.to_string()),
        _ => HeadingId::Blank(attr.span),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
