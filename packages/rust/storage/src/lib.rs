//! libSQL storage layer for pages and site settings.
//!
//! The [`Storage`] struct wraps a local libSQL database and implements
//! [`ContentStore`] for the page resolver.
//!
//! **Access rules:**
//! - `serve`, `resolve` and `page import`: read-write via [`Storage::open`]
//! - `page list` and `settings list`: read-only via [`Storage::open_readonly`]

mod migrations;

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database, params};
use tracing::instrument;

use slugpress_shared::{ContentStore, PageId, PageRecord, Result, SlugpressError};

/// Column list shared by every page query, in [`row_to_page`] order.
const PAGE_COLUMNS: &str = "id, slug, title, meta_title, content, meta_description, is_active, view_count, created_at, updated_at";

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| SlugpressError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(SlugpressError::storage)?;

        let conn = db.connect().map_err(SlugpressError::storage)?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SlugpressError::NotFound(format!(
                "database {}",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(SlugpressError::storage)?;

        let conn = db.connect().map_err(SlugpressError::storage)?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        SlugpressError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(SlugpressError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Page operations
    // -----------------------------------------------------------------------

    /// Fetch the active page whose slug matches exactly.
    #[instrument(skip(self))]
    pub async fn find_active_page(&self, slug: &str) -> Result<Option<PageRecord>> {
        let sql = format!("SELECT {PAGE_COLUMNS} FROM pages WHERE slug = ?1 AND is_active = 1");
        let mut rows = self
            .conn
            .query(&sql, params![slug])
            .await
            .map_err(SlugpressError::storage)?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_page(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(SlugpressError::storage(e)),
        }
    }

    /// Fetch a page by slug regardless of its active flag.
    pub async fn get_page_by_slug(&self, slug: &str) -> Result<Option<PageRecord>> {
        let sql = format!("SELECT {PAGE_COLUMNS} FROM pages WHERE slug = ?1");
        let mut rows = self
            .conn
            .query(&sql, params![slug])
            .await
            .map_err(SlugpressError::storage)?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_page(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(SlugpressError::storage(e)),
        }
    }

    /// Add one to a page's view count.
    ///
    /// The increment happens inside a single `UPDATE`, so concurrent callers
    /// never lose counts.
    #[instrument(skip(self), fields(page_id = %id))]
    pub async fn bump_view_count(&self, id: &PageId) -> Result<()> {
        self.check_writable()?;
        let changed = self
            .conn
            .execute(
                "UPDATE pages SET view_count = view_count + 1 WHERE id = ?1",
                params![id.to_string()],
            )
            .await
            .map_err(SlugpressError::storage)?;

        if changed == 0 {
            return Err(SlugpressError::NotFound(format!("page {id}")));
        }
        Ok(())
    }

    /// Upsert a page (insert, or update on conflict by `slug`).
    ///
    /// An update keeps the stored `id`, `view_count` and `created_at`.
    pub async fn upsert_page(&self, page: &PageRecord) -> Result<()> {
        self.check_writable()?;
        if page.slug.trim().is_empty() {
            return Err(SlugpressError::validation("page slug must not be empty"));
        }
        self.conn
            .execute(
                "INSERT INTO pages (id, slug, title, meta_title, content, meta_description, is_active, view_count, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(slug) DO UPDATE SET
                   title = excluded.title,
                   meta_title = excluded.meta_title,
                   content = excluded.content,
                   meta_description = excluded.meta_description,
                   is_active = excluded.is_active,
                   updated_at = excluded.updated_at",
                params![
                    page.id.to_string(),
                    page.slug.as_str(),
                    page.title.as_str(),
                    page.meta_title.as_deref(),
                    page.content.as_str(),
                    page.meta_description.as_deref(),
                    i64::from(page.is_active),
                    i64::try_from(page.view_count).unwrap_or(i64::MAX),
                    page.created_at.to_rfc3339(),
                    page.updated_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(SlugpressError::storage)?;
        Ok(())
    }

    /// List all pages, active or not, ordered by slug.
    pub async fn list_pages(&self) -> Result<Vec<PageRecord>> {
        let sql = format!("SELECT {PAGE_COLUMNS} FROM pages ORDER BY slug");
        let mut rows = self
            .conn
            .query(&sql, params![])
            .await
            .map_err(SlugpressError::storage)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(SlugpressError::storage)? {
            results.push(row_to_page(&row)?);
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Settings operations
    // -----------------------------------------------------------------------

    /// Get a single setting value.
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT value FROM settings WHERE key = ?1", params![key])
            .await
            .map_err(SlugpressError::storage)?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row.get::<String>(0).map_err(SlugpressError::storage)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(SlugpressError::storage(e)),
        }
    }

    /// Set a setting value (upserts).
    pub async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.check_writable()?;
        self.conn
            .execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .await
            .map_err(SlugpressError::storage)?;
        Ok(())
    }

    /// All settings as `(key, value)` pairs, ordered by key.
    pub async fn list_settings(&self) -> Result<Vec<(String, String)>> {
        let mut rows = self
            .conn
            .query("SELECT key, value FROM settings ORDER BY key", params![])
            .await
            .map_err(SlugpressError::storage)?;

        let mut results = Vec::new();
        while let Some(row) = rows.next().await.map_err(SlugpressError::storage)? {
            results.push((
                row.get::<String>(0).map_err(SlugpressError::storage)?,
                row.get::<String>(1).map_err(SlugpressError::storage)?,
            ));
        }
        Ok(results)
    }
}

#[async_trait]
impl ContentStore for Storage {
    async fn find_active_by_slug(&self, slug: &str) -> Result<Option<PageRecord>> {
        self.find_active_page(slug).await
    }

    async fn increment_view_count(&self, id: &PageId) -> Result<()> {
        self.bump_view_count(id).await
    }
}

/// Convert a database row (selected with [`PAGE_COLUMNS`]) to a [`PageRecord`].
fn row_to_page(row: &libsql::Row) -> Result<PageRecord> {
    let id: String = row.get(0).map_err(SlugpressError::storage)?;
    let view_count: i64 = row.get(7).map_err(SlugpressError::storage)?;
    Ok(PageRecord {
        id: id
            .parse()
            .map_err(|e| SlugpressError::parse(format!("invalid page id '{id}': {e}")))?,
        slug: row.get::<String>(1).map_err(SlugpressError::storage)?,
        title: row.get::<String>(2).map_err(SlugpressError::storage)?,
        meta_title: row.get::<Option<String>>(3).map_err(SlugpressError::storage)?,
        content: row.get::<String>(4).map_err(SlugpressError::storage)?,
        meta_description: row.get::<Option<String>>(5).map_err(SlugpressError::storage)?,
        is_active: row.get::<i64>(6).map_err(SlugpressError::storage)? != 0,
        view_count: u64::try_from(view_count).map_err(|_| {
            SlugpressError::parse(format!("negative view_count {view_count} for page '{id}'"))
        })?,
        created_at: parse_timestamp(&row.get::<String>(8).map_err(SlugpressError::storage)?)?,
        updated_at: parse_timestamp(&row.get::<String>(9).map_err(SlugpressError::storage)?)?,
    })
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SlugpressError::parse(format!("invalid date '{s}': {e}")))
}
