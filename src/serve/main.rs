//! Admin boundary lookup server.
//!
//! Serves admin areas by id, code, level and parent over HTTP, and filters
//! coordinate batches by boundary.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cypress_boundaries::api::{self, AppState};
use cypress_boundaries::cache::{KeyValueCache, MemoryCache, SledCache};
use cypress_boundaries::config::{CacheBackend, Config, StoreBackend};
use cypress_boundaries::pip::MemoryStore;
use cypress_boundaries::repository::{AdminAreaRepository, CachedRepository, SpatialRepository};
use cypress_boundaries::store::SpatialStore;

#[derive(Parser, Debug)]
#[command(name = "serve")]
#[command(about = "Administrative boundary lookup server")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(short, long, env = "LISTEN_ADDR")]
    listen: Option<String>,

    /// GeoJSON boundary export (selects the memory store)
    #[arg(long)]
    boundaries: Option<PathBuf>,

    /// PostGIS connection URL (selects the postgis store)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Cache backend: disabled, memory or sled
    #[arg(long)]
    cache: Option<CacheBackend>,

    /// Log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(listen) = self.listen {
            config.server.listen = listen;
        }
        if let Some(path) = self.boundaries {
            config.store.backend = StoreBackend::Memory;
            config.store.boundaries_file = Some(path);
        }
        if let Some(url) = self.database_url {
            config.store.backend = StoreBackend::Postgis;
            config.store.database_url = Some(url);
        }
        if let Some(cache) = self.cache {
            config.cache.backend = cache;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("Invalid log filter")?;
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = args.into_config()?;

    info!("Cypress Boundary Server");

    let store = open_store(&config).await?;
    info!("Spatial store: {}", store.name());

    let cache = open_cache(&config)?;
    match &cache {
        Some(cache) => info!(
            "Cache: {} (timeout {}ms)",
            cache.name(),
            config.cache.timeout_ms
        ),
        None => info!("Cache: disabled"),
    }

    let repository: Arc<dyn AdminAreaRepository> = Arc::new(
        CachedRepository::new(SpatialRepository::new(store.clone()), cache)
            .with_timeout(config.cache.timeout()),
    );

    let app = api::router(AppState::new(repository, store), &config.server);

    info!("Starting server on {}", config.server.listen);

    let listener = tokio::net::TcpListener::bind(&config.server.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen))?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn open_store(config: &Config) -> Result<Arc<dyn SpatialStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            let path = config
                .store
                .boundaries_file
                .as_ref()
                .context("store.boundaries_file is not set")?;
            let store = MemoryStore::open(path)?;
            info!("Loaded {} boundaries", store.table().len());
            Ok(Arc::new(store))
        }
        #[cfg(feature = "postgis")]
        StoreBackend::Postgis => {
            let url = config
                .store
                .database_url
                .as_deref()
                .context("store.database_url is not set")?;
            let store = cypress_boundaries::store::PostgisStore::new(
                url,
                config.store.max_connections,
            )
            .await
            .context("Failed to connect to PostGIS")?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "postgis"))]
        StoreBackend::Postgis => {
            anyhow::bail!("this build does not include the postgis store (enable the `postgis` feature)")
        }
    }
}

fn open_cache(config: &Config) -> Result<Option<Arc<dyn KeyValueCache>>> {
    let cache: Arc<dyn KeyValueCache> = match config.cache.backend {
        CacheBackend::Disabled => return Ok(None),
        CacheBackend::Memory => Arc::new(MemoryCache::new()),
        CacheBackend::Sled => {
            let path = config
                .cache
                .path
                .as_ref()
                .context("cache.path is not set")?;
            Arc::new(SledCache::open(path).context("Failed to open sled cache")?)
        }
    };
    Ok(Some(cache))
}
