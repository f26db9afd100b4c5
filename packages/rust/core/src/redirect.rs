//! Open-redirect protection for caller-supplied redirect targets.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};
use url::Url;

/// Matches a leading URL scheme such as `https:` or `javascript:`.
static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("valid regex"));

/// Decide where a caller-supplied redirect may actually go.
///
/// The candidate is cleaned first (see [`clean_redirect_target`]). Relative
/// targets are always allowed. Absolute targets are allowed only when they
/// start with `site_origin` and parse to the same scheme, host and port;
/// anything else, including an empty candidate, yields `fallback`.
pub fn validate_redirect(candidate: &str, site_origin: &str, fallback: &str) -> String {
    let cleaned = clean_redirect_target(candidate);

    if cleaned.is_empty() {
        return fallback.to_string();
    }

    if !SCHEME_RE.is_match(&cleaned) {
        return cleaned;
    }

    if is_same_origin(&cleaned, site_origin) {
        debug!(target = %cleaned, "same-origin redirect allowed");
        cleaned
    } else {
        warn!(target = %cleaned, "rejected off-site redirect target");
        fallback.to_string()
    }
}

/// Normalize a redirect target before it is checked.
///
/// - trims surrounding whitespace
/// - drops ASCII control characters and `<`, `>`, `"`, `'`, `` ` ``
/// - turns `\` into `/`
/// - for relative targets, collapses repeated `/` and resolves `.`/`..`
///   segments in the path (so `//host/x` becomes `/host/x`)
pub fn clean_redirect_target(candidate: &str) -> String {
    let cleaned: String = candidate
        .trim()
        .chars()
        .filter(|c| !c.is_ascii_control() && !matches!(c, '<' | '>' | '"' | '\'' | '`'))
        .map(|c| if c == '\\' { '/' } else { c })
        .collect();

    if SCHEME_RE.is_match(&cleaned) {
        return cleaned;
    }

    let split_at = cleaned.find(['?', '#']).unwrap_or(cleaned.len());
    let (path, suffix) = cleaned.split_at(split_at);
    format!("{}{suffix}", normalize_path(path))
}

/// Collapse empty segments and resolve dot segments in a relative path.
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }

    let absolute = path.starts_with('/');
    let trailing = path.len() > 1 && (path.ends_with('/') || path.ends_with("/."));

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let mut out = segments.join("/");
    if absolute {
        out.insert(0, '/');
    }
    if trailing && !out.ends_with('/') {
        out.push('/');
    }
    if out.is_empty() && absolute {
        out.push('/');
    }
    out
}

/// Textual prefix check plus a parsed origin comparison, so that
/// `https://site.example.evil.test` does not pass for `https://site.example`.
fn is_same_origin(candidate: &str, site_origin: &str) -> bool {
    let origin = site_origin.trim_end_matches('/');
    if origin.is_empty() || !candidate.starts_with(origin) {
        return false;
    }

    match (Url::parse(candidate), Url::parse(origin)) {
        (Ok(target), Ok(site)) => target.origin() == site.origin(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE: &str = "https://mysite.example";

    #[test]
    fn rejects_foreign_absolute_url() {
        assert_eq!(validate_redirect("https://evil.example/x", SITE, "/login"), "/login");
    }

    #[test]
    fn allows_relative_path() {
        assert_eq!(validate_redirect("/dashboard", SITE, "/login"), "/dashboard");
    }

    #[test]
    fn allows_same_origin_absolute_url() {
        assert_eq!(
            validate_redirect("https://mysite.example/ok", SITE, "/login"),
            "https://mysite.example/ok"
        );
    }

    #[test]
    fn rejects_lookalike_host_sharing_the_prefix() {
        assert_eq!(
            validate_redirect("https://mysite.example.evil.test/x", SITE, "/login"),
            "/login"
        );
        assert_eq!(validate_redirect("https://mysite.example@evil.test/", SITE, "/login"), "/login");
    }

    #[test]
    fn rejects_other_schemes_and_ports() {
        assert_eq!(validate_redirect("javascript:alert(1)", SITE, "/login"), "/login");
        assert_eq!(validate_redirect("http://mysite.example/ok", SITE, "/login"), "/login");
        assert_eq!(validate_redirect("https://mysite.example:8443/ok", SITE, "/login"), "/login");
    }

    #[test]
    fn protocol_relative_targets_become_local_paths() {
        assert_eq!(validate_redirect("//evil.example/x", SITE, "/login"), "/evil.example/x");
        assert_eq!(validate_redirect("/\\evil.example", SITE, "/login"), "/evil.example");
    }

    #[test]
    fn empty_candidate_falls_back() {
        assert_eq!(validate_redirect("", SITE, "/login"), "/login");
        assert_eq!(validate_redirect("  \t ", SITE, "/login"), "/login");
    }

    #[test]
    fn cleaning_collapses_and_resolves_segments() {
        assert_eq!(clean_redirect_target("/a//b/./c/../d"), "/a/b/d");
        assert_eq!(clean_redirect_target("/../../etc"), "/etc");
        assert_eq!(clean_redirect_target("/docs/"), "/docs/");
        assert_eq!(clean_redirect_target("/"), "/");
        assert_eq!(clean_redirect_target("dashboard"), "dashboard");
    }

    #[test]
    fn cleaning_keeps_query_and_fragment() {
        assert_eq!(
            clean_redirect_target("//a//b?next=//x#top"),
            "/a/b?next=//x#top"
        );
    }

    #[test]
    fn cleaning_strips_unsafe_characters() {
        assert_eq!(clean_redirect_target(" /pa<th>\"x\n "), "/pathx");
        assert_eq!(clean_redirect_target("\t/\t/evil.example"), "/evil.example");
    }

    #[test]
    fn backslash_scheme_tricks_are_rejected() {
        assert_eq!(validate_redirect("https:\\\\evil.example", SITE, "/login"), "/login");
    }

    #[test]
    fn trailing_slash_on_origin_is_ignored() {
        assert_eq!(
            validate_redirect("https://mysite.example/ok", "https://mysite.example/", "/login"),
            "https://mysite.example/ok"
        );
    }
}
