//! Core domain types for slugpress pages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// PageId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for page identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(pub Uuid);

impl PageId {
    /// Generate a new time-sortable page identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for PageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PageId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// PageRecord
// ---------------------------------------------------------------------------

/// A persisted content page, keyed by its unique slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Stable unique identifier.
    pub id: PageId,
    /// URL-safe lookup key, unique across pages.
    pub slug: String,
    /// Display title.
    pub title: String,
    /// Optional `<title>` override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    /// HTML body.
    pub content: String,
    /// Optional meta description override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    /// Inactive pages never resolve.
    pub is_active: bool,
    /// Number of successful resolutions.
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// View model
// ---------------------------------------------------------------------------

/// One heading discovered in page content, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingEntry {
    /// Heading level, 1 through 6.
    pub level: u8,
    /// Heading text with nested markup stripped.
    pub text: String,
    /// In-page anchor target (`heading-<index>` unless the heading already had an id).
    pub anchor_id: String,
}

/// A social-share link for a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLink {
    /// Network label (e.g. `twitter`).
    pub network: String,
    /// Fully-encoded share intent URL.
    pub url: String,
}

/// Render-ready projection of a [`PageRecord`]. Derived on every resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageViewModel {
    pub slug: String,
    pub title: String,
    pub effective_meta_title: String,
    pub effective_meta_description: String,
    /// Content with anchor ids injected into its headings.
    pub renderable_content: String,
    /// Empty unless the content has more than three headings.
    pub table_of_contents: Vec<HeadingEntry>,
    /// Canonical public URL of the page.
    pub share_url: String,
    pub share_links: Vec<ShareLink>,
    pub view_count: u64,
}

// ---------------------------------------------------------------------------
// CallerContext
// ---------------------------------------------------------------------------

/// Who is making a request, as far as maintenance gating is concerned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallerContext {
    /// Privileged callers see the site even while maintenance mode is on.
    pub privileged: bool,
}

impl CallerContext {
    pub fn anonymous() -> Self {
        Self { privileged: false }
    }

    pub fn privileged() -> Self {
        Self { privileged: true }
    }
}
