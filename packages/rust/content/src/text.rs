//! Plain-text views of HTML fragments.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

/// Strip all markup from an HTML fragment.
///
/// Entities are decoded, `<script>`/`<style>` bodies are dropped, block
/// boundaries become spaces and runs of whitespace collapse to a single space.
/// Inline markup joins without a gap (`Hel<b>lo</b>` reads `Hello`).
pub fn strip_markup(html: &str) -> String {
    static HIDDEN_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?is)<(?:script|style)\b[^>]*>.*?</(?:script|style)\s*>").expect("valid regex")
    });
    static BLOCK_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"(?i)</(?:p|div|h[1-6]|li|dt|dd|tr|td|th|blockquote|pre|section|article|header|footer)\s*>|<br\s*/?>",
        )
        .expect("valid regex")
    });

    let visible = HIDDEN_RE.replace_all(html, " ");
    let spaced = BLOCK_BREAK_RE.replace_all(&visible, " $0");
    let fragment = Html::parse_fragment(&spaced);
    let text: String = fragment.root_element().text().collect();
    collapse_whitespace(&text)
}

/// Return at most `max_chars` characters of `text`.
///
/// Counts Unicode scalar values, never splitting a character.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
