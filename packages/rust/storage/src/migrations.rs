//! SQL migration definitions for the slugpress database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Initial schema: pages, settings",
            sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Content pages, looked up by slug
CREATE TABLE IF NOT EXISTS pages (
    id               TEXT PRIMARY KEY,
    slug             TEXT NOT NULL UNIQUE,
    title            TEXT NOT NULL,
    meta_title       TEXT,
    content          TEXT NOT NULL DEFAULT '',
    meta_description TEXT,
    is_active        INTEGER NOT NULL DEFAULT 1,
    view_count       INTEGER NOT NULL DEFAULT 0,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

-- Site settings (key/value)
CREATE TABLE IF NOT EXISTS settings (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
        },
        Migration {
            version: 2,
            description: "Index active pages by slug",
            sql: r#"
CREATE INDEX IF NOT EXISTS idx_pages_slug_active ON pages(slug, is_active);

INSERT INTO schema_migrations (version) VALUES (2);
"#,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_are_strictly_ascending() {
        let versions: Vec<u32> = all_migrations().iter().map(|m| m.version).collect();
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(versions.first(), Some(&1));
    }

    #[test]
    fn each_migration_records_its_version() {
        for m in all_migrations() {
            let marker = format!("INSERT INTO schema_migrations (version) VALUES ({});", m.version);
            assert!(m.sql.contains(&marker), "migration {} does not record itself", m.version);
        }
    }
}
