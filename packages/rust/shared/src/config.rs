//! Application configuration for slugpress.
//!
//! User config lives at `~/.slugpress/slugpress.toml`.
//! CLI flags override config file values, which override defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, SlugpressError};
use crate::settings::keys;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "slugpress.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".slugpress";

// ---------------------------------------------------------------------------
// Config structs (matching slugpress.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Public site identity.
    #[serde(default)]
    pub site: SiteConfig,

    /// HTTP listener.
    #[serde(default)]
    pub server: ServerConfig,

    /// Content database.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Maintenance bypass.
    #[serde(default)]
    pub maintenance: MaintenanceConfig,

    /// Default site settings, overridden by the database `settings` table.
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Public origin, e.g. `https://example.com`. Used for share URLs and
    /// same-origin redirect checks.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Slug served at `/`.
    #[serde(default = "default_home_slug")]
    pub home_slug: String,

    /// Fallback target for rejected redirects.
    #[serde(default = "default_login_path")]
    pub login_path: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            home_slug: default_home_slug(),
            login_path: default_login_path(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".into()
}
fn default_home_slug() -> String {
    "home".into()
}
fn default_login_path() -> String {
    "/login".into()
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8080
}

/// `[database]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the libSQL database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "var/slugpress.db".into()
}

/// `[maintenance]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// Name of the env var holding the bypass token (never store the token itself).
    #[serde(default = "default_bypass_token_env")]
    pub bypass_token_env: String,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            bypass_token_env: default_bypass_token_env(),
        }
    }
}

fn default_bypass_token_env() -> String {
    "SLUGPRESS_ADMIN_TOKEN".into()
}

// ---------------------------------------------------------------------------
// Derived values
// ---------------------------------------------------------------------------

impl AppConfig {
    /// The site origin without a trailing slash, validated as an absolute URL.
    pub fn site_origin(&self) -> Result<String> {
        let raw = self.site.base_url.trim();
        let url = Url::parse(raw).map_err(|e| {
            SlugpressError::config(format!("site.base_url '{raw}' is not a valid URL: {e}"))
        })?;
        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(SlugpressError::config(format!(
                "site.base_url '{raw}' must be an absolute http(s) URL"
            )));
        }
        Ok(raw.trim_end_matches('/').to_string())
    }

    /// Database path as a `PathBuf`.
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.database.path)
    }
}

/// Read the maintenance bypass token from the configured env var.
///
/// Returns `None` when the variable is unset or empty, in which case no caller
/// is privileged.
pub fn bypass_token(config: &AppConfig) -> Option<String> {
    match std::env::var(&config.maintenance.bypass_token_env) {
        Ok(val) if !val.trim().is_empty() => Some(val.trim().to_string()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.slugpress/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SlugpressError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.slugpress/slugpress.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SlugpressError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        SlugpressError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Write a default config file at `path` (or the default location).
/// Returns the path to the created file.
pub fn init_config(path: Option<&Path>) -> Result<PathBuf> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| SlugpressError::io(dir, e))?;
    }

    let mut config = AppConfig::default();
    config.settings.insert(keys::SITE_NAME.into(), "My Site".into());
    config.settings.insert(keys::MAINTENANCE_MODE.into(), "false".into());
    let content =
        toml::to_string_pretty(&config).map_err(|e| SlugpressError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SlugpressError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
