use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use backoffice_api::config::AppConfig;
use backoffice_api::database::{MemoryStore, PgStore, TableStore};
use backoffice_api::registry::TableRegistry;
use backoffice_api::{router, AppState};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "backoffice-api")]
#[command(about = "Admin back office over a relational store")]
#[command(version)]
struct Args {
    #[arg(long, help = "Port to listen on (overrides PORT / SERVER_PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Address to bind (overrides SERVER_HOST)")]
    host: Option<String>,

    #[arg(long, help = "Serve from an in-memory store instead of PostgreSQL")]
    memory: bool,

    #[arg(long, value_name = "YAML", help = "Seed rows for the in-memory store")]
    fixtures: Option<PathBuf>,

    #[arg(long, value_name = "YAML", help = "Table definitions replacing the built-in registry")]
    tables: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL and friends are picked up
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = AppConfig::from_env();
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }
    tracing::info!("Starting backoffice API in {:?} mode", config.environment);

    let registry = match &args.tables {
        Some(path) => TableRegistry::from_path(path)
            .with_context(|| format!("loading table definitions from {}", path.display()))?,
        None => TableRegistry::builtin().context("loading built-in table definitions")?,
    };
    tracing::info!("Registered {} tables", registry.len());

    let mut pg_store: Option<Arc<PgStore>> = None;
    let store: Arc<dyn TableStore> = if args.memory || args.fixtures.is_some() {
        let store = match &args.fixtures {
            Some(path) => MemoryStore::from_path(path)
                .with_context(|| format!("loading fixtures from {}", path.display()))?,
            None => MemoryStore::new(),
        };
        tracing::info!("Using in-memory store");
        Arc::new(store)
    } else {
        let pg = Arc::new(
            PgStore::connect(&config.database, &config.pagination)
                .await
                .context("connecting to PostgreSQL")?,
        );
        pg_store = Some(pg.clone());
        pg
    };

    let bind_addr = config.bind_address();
    let state = AppState::new(config, registry, store).context("compiling templates")?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Backoffice API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(pg) = pg_store {
        pg.close().await;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
