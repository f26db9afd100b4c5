//! Shared types, error model, and configuration for slugpress.
//!
//! This crate is the foundation depended on by all other slugpress crates.
//! It provides:
//! - [`SlugpressError`]: the unified error type
//! - Domain types ([`PageRecord`], [`PageViewModel`], [`HeadingEntry`], [`CallerContext`])
//! - Configuration ([`AppConfig`], config loading) and site settings ([`SettingsMap`])
//! - The [`ContentStore`] and [`ErrorReporter`] seams

pub mod config;
pub mod error;
pub mod settings;
pub mod store;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DatabaseConfig, MaintenanceConfig, ServerConfig, SiteConfig, bypass_token,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{Result, SlugpressError};
pub use settings::{SettingsMap, SettingsProvider, is_truthy, keys};
pub use store::{ContentStore, ErrorReporter, TracingErrorReporter};
pub use types::{CallerContext, HeadingEntry, PageId, PageRecord, PageViewModel, ShareLink};
