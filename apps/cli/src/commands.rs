//! CLI command definitions, routing, and tracing setup.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use slugpress_core::{Outcome, PageResolver};
use slugpress_shared::{
    AppConfig, SettingsMap, TracingErrorReporter, bypass_token, config_file_path, init_config,
    load_config, load_config_from,
};
use slugpress_storage::Storage;
use slugpress_web::AppState;

use crate::import;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// slugpress: slug-addressed pages over HTTP.
#[derive(Parser)]
#[command(
    name = "slugpress",
    version,
    about = "Serve slug-addressed content pages and manage their store.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.slugpress/slugpress.toml).
    #[arg(long, global = true, env = "SLUGPRESS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Start the HTTP server.
    Serve {
        /// Bind host (overrides `server.host`).
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides `server.port`).
        #[arg(long)]
        port: Option<u16>,
    },

    /// Resolve one slug and print the outcome as JSON. Counts as a view.
    Resolve {
        /// Page slug.
        slug: String,
    },

    /// Page management.
    Page {
        #[command(subcommand)]
        action: PageAction,
    },

    /// Site settings stored in the database.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Page subcommands.
#[derive(Subcommand)]
pub(crate) enum PageAction {
    /// Insert or update pages from a .json or .toml file.
    Import {
        /// File to import.
        file: PathBuf,
    },
    /// List every page, active or not.
    List,
    /// Print one stored page as JSON, active or not. Does not count a view.
    Show {
        /// Page slug.
        slug: String,
    },
}

/// Settings subcommands.
#[derive(Subcommand)]
pub(crate) enum SettingsAction {
    /// Set one setting.
    Set { key: String, value: String },
    /// Print one stored setting.
    Get { key: String },
    /// List stored settings.
    List,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "slugpress=info",
        1 => "slugpress=debug,tower_http=debug",
        _ => "slugpress=trace,tower_http=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Serve { host, port } => cmd_serve(config_path, host, port).await,
        Command::Resolve { slug } => cmd_resolve(config_path, &slug).await,
        Command::Page { action } => match action {
            PageAction::Import { file } => cmd_page_import(config_path, &file).await,
            PageAction::List => cmd_page_list(config_path).await,
            PageAction::Show { slug } => cmd_page_show(config_path, &slug).await,
        },
        Command::Settings { action } => match action {
            SettingsAction::Set { key, value } => {
                cmd_settings_set(config_path, &key, &value).await
            }
            SettingsAction::Get { key } => cmd_settings_get(config_path, &key).await,
            SettingsAction::List => cmd_settings_list(config_path).await,
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path).await,
            ConfigAction::Show => cmd_config_show(config_path).await,
        },
    }
}

// ---------------------------------------------------------------------------
// Shared wiring
// ---------------------------------------------------------------------------

fn read_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Config defaults overlaid with the settings stored in the database.
async fn site_settings(config: &AppConfig, storage: &Storage) -> Result<SettingsMap> {
    let stored = storage.list_settings().await?;
    let settings = SettingsMap::from_defaults(&config.settings).overlay(stored);
    if settings.is_empty() {
        warn!("no site settings in config or database; using built-in defaults");
    } else {
        debug!(count = settings.len(), "site settings loaded");
    }
    Ok(settings)
}

async fn build_resolver(config: &AppConfig, storage: Storage) -> Result<PageResolver> {
    let origin = config.site_origin()?;
    let settings = site_settings(config, &storage).await?;
    Ok(PageResolver::new(
        Arc::new(storage),
        Arc::new(settings),
        Arc::new(TracingErrorReporter),
        origin,
    ))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_serve(config_path: Option<&Path>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = read_config(config_path)?;
    let storage = Storage::open(&config.database_path()).await?;
    let resolver = build_resolver(&config, storage).await?;

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr: SocketAddr = tokio::net::lookup_host((host.as_str(), port))
        .await
        .map_err(|e| eyre!("cannot resolve bind address '{host}:{port}': {e}"))?
        .next()
        .ok_or_else(|| eyre!("no address found for '{host}:{port}'"))?;

    let token = bypass_token(&config);
    if token.is_none() {
        warn!(
            env = %config.maintenance.bypass_token_env,
            "no maintenance bypass token set; nobody can bypass maintenance mode"
        );
    }

    let state = AppState {
        resolver,
        home_slug: config.site.home_slug.clone(),
        redirect_fallback: config.site.login_path.clone(),
        bypass_token: token,
    };

    println!("Serving {} on http://{addr}", config.site.base_url);
    slugpress_web::serve(addr, state).await?;
    Ok(())
}

async fn cmd_resolve(config_path: Option<&Path>, slug: &str) -> Result<()> {
    let config = read_config(config_path)?;
    let storage = Storage::open(&config.database_path()).await?;
    let resolver = build_resolver(&config, storage).await?;

    let outcome = resolver.resolve(slug).await;
    let status = outcome.status_code();
    let body = match outcome {
        Outcome::Found(view) => serde_json::json!({
            "status": status,
            "outcome": "found",
            "page": view,
        }),
        Outcome::NotFound => serde_json::json!({
            "status": status,
            "outcome": "not_found",
        }),
        Outcome::ServerError(reason) => serde_json::json!({
            "status": status,
            "outcome": "server_error",
            "reason": reason,
        }),
    };

    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

async fn cmd_page_import(config_path: Option<&Path>, file: &Path) -> Result<()> {
    let config = read_config(config_path)?;
    let pages = import::read_pages(file)?;
    let storage = Storage::open(&config.database_path()).await?;

    info!(file = %file.display(), count = pages.len(), "importing pages");

    let bar = ProgressBar::new(pages.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let total = pages.len();
    for input in pages {
        bar.set_message(input.slug.clone());
        let record = input.into_record();
        storage.upsert_page(&record).await?;
        bar.inc(1);
    }
    bar.finish_and_clear();

    println!();
    println!("  Imported {total} page(s)");
    println!("  Database: {}", config.database_path().display());
    println!();
    Ok(())
}

async fn cmd_page_list(config_path: Option<&Path>) -> Result<()> {
    let config = read_config(config_path)?;
    let storage = Storage::open_readonly(&config.database_path()).await?;
    let pages = storage.list_pages().await?;

    if pages.is_empty() {
        println!("No pages.");
        return Ok(());
    }

    println!("{:<32} {:<8} {:>8}  TITLE", "SLUG", "ACTIVE", "VIEWS");
    for page in &pages {
        println!(
            "{:<32} {:<8} {:>8}  {}",
            page.slug,
            if page.is_active { "yes" } else { "no" },
            page.view_count,
            page.title
        );
    }
    Ok(())
}

async fn cmd_page_show(config_path: Option<&Path>, slug: &str) -> Result<()> {
    let config = read_config(config_path)?;
    let storage = Storage::open_readonly(&config.database_path()).await?;
    let page = storage
        .get_page_by_slug(slug)
        .await?
        .ok_or_else(|| eyre!("no page with slug '{slug}'"))?;
    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}

async fn cmd_settings_get(config_path: Option<&Path>, key: &str) -> Result<()> {
    let config = read_config(config_path)?;
    let storage = Storage::open_readonly(&config.database_path()).await?;
    match storage.get_setting(key.trim()).await? {
        Some(value) => println!("{value}"),
        None => return Err(eyre!("setting '{key}' is not stored")),
    }
    Ok(())
}

async fn cmd_settings_set(config_path: Option<&Path>, key: &str, value: &str) -> Result<()> {
    let key = key.trim();
    if key.is_empty() {
        return Err(eyre!("setting key must not be empty"));
    }
    let config = read_config(config_path)?;
    let storage = Storage::open(&config.database_path()).await?;
    storage.set_setting(key, value).await?;
    info!(key, "setting stored");
    println!("{key} = {value}");
    Ok(())
}

async fn cmd_settings_list(config_path: Option<&Path>) -> Result<()> {
    let config = read_config(config_path)?;
    let storage = Storage::open_readonly(&config.database_path()).await?;
    let settings = storage.list_settings().await?;

    if settings.is_empty() {
        println!("No stored settings.");
        return Ok(());
    }
    for (key, value) in settings {
        println!("{key} = {value}");
    }
    Ok(())
}

async fn cmd_config_init(config_path: Option<&Path>) -> Result<()> {
    let path = init_config(config_path)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = read_config(config_path)?;
    let source = match config_path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };
    println!("# {}", source.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
