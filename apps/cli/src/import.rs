//! Page import files.
//!
//! Two formats are accepted, chosen by extension:
//!
//! - `.json`: a top-level array of page objects
//! - `.toml`: a `[[pages]]` array of tables

use std::path::Path;

use chrono::Utc;
use color_eyre::eyre::{Result, eyre};
use serde::Deserialize;

use slugpress_shared::{PageId, PageRecord};

/// One page as written in an import file.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PageInput {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct TomlPages {
    #[serde(default)]
    pages: Vec<PageInput>,
}

impl PageInput {
    /// Build a fresh record. On upsert the store keeps an existing row's id,
    /// view count and creation time.
    pub(crate) fn into_record(self) -> PageRecord {
        let now = Utc::now();
        PageRecord {
            id: PageId::new(),
            slug: self.slug.trim().to_string(),
            title: self.title,
            meta_title: self.meta_title.filter(|t| !t.trim().is_empty()),
            content: self.content,
            meta_description: self.meta_description.filter(|d| !d.trim().is_empty()),
            is_active: self.is_active,
            view_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Read and parse an import file.
pub(crate) fn read_pages(path: &Path) -> Result<Vec<PageInput>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| eyre!("cannot read '{}': {e}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    parse_pages(&raw, ext.as_deref())
        .map_err(|e| eyre!("invalid import file '{}': {e}", path.display()))
}

fn parse_pages(raw: &str, ext: Option<&str>) -> Result<Vec<PageInput>> {
    let pages = match ext {
        Some("json") => serde_json::from_str::<Vec<PageInput>>(raw)?,
        Some("toml") => toml::from_str::<TomlPages>(raw)?.pages,
        other => {
            return Err(eyre!(
                "unsupported extension {:?}: expected .json or .toml",
                other.unwrap_or("")
            ));
        }
    };

    if let Some(blank) = pages.iter().position(|p| p.slug.trim().is_empty()) {
        return Err(eyre!("page #{} has an empty slug", blank + 1));
    }
    Ok(pages)
}
