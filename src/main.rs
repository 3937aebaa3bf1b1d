use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use coaching_server::catalog::{seed_demo_catalog, SqliteCatalogStore};
use coaching_server::config;
use coaching_server::content::SqliteContentStore;
use coaching_server::server::{run_server, ServerState};
use coaching_server::server_store::SqliteServerStore;
use coaching_server::user::SqliteUserStore;

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

fn parse_dir(s: &str) -> Result<PathBuf, String> {
    let path = parse_path(s)?;
    if !path.exists() {
        return Err(format!("Directory does not exist: {}", s));
    }
    if !path.is_dir() {
        return Err(format!("Path is not a directory: {}", s));
    }
    Ok(path)
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory containing database files (user.db, catalog.db, content.db,
    /// server.db). Can also be specified in config file.
    #[clap(long, value_parser = parse_dir)]
    pub db_dir: Option<PathBuf>,

    /// Directory where uploaded files are stored and served from.
    /// Defaults to <db_dir>/uploads.
    #[clap(long, value_parser = parse_path)]
    pub uploads_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// Do not seed the catalog with sample content when it is empty.
    #[clap(long, default_value_t = false)]
    pub skip_seeding: bool,
}

impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_dir: args.db_dir.clone(),
            uploads_dir: args.uploads_dir.clone(),
            port: args.port,
            skip_seeding: args.skip_seeding,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .init();

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  db_dir: {:?}", app_config.db_dir);
    info!("  uploads_dir: {:?}", app_config.uploads_dir);
    info!("  port: {}", app_config.port);

    let user_store = Arc::new(SqliteUserStore::new(app_config.user_db_path())?);
    let catalog_store = Arc::new(SqliteCatalogStore::new(app_config.catalog_db_path())?);
    let content_store = Arc::new(SqliteContentStore::new(app_config.content_db_path())?);
    let server_store = Arc::new(SqliteServerStore::new(app_config.server_db_path())?);

    if !app_config.skip_seeding {
        seed_demo_catalog(catalog_store.as_ref())?;
    }

    std::fs::create_dir_all(&app_config.uploads_dir)?;

    let state = ServerState {
        start_time: Instant::now(),
        user_store,
        catalog_store,
        content_store,
        server_store,
        uploads_dir: app_config.uploads_dir.clone(),
    };

    tokio::select! {
        result = run_server(state, app_config.port) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
            Ok(())
        }
    }
}
