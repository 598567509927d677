use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tokio::sync::watch;

use stockdb_backend::app;
use stockdb_backend::config::{AppConfig, ProviderKind, StorageBackend};
use stockdb_backend::external::alphavantage::AlphaVantageProvider;
use stockdb_backend::external::price_provider::PriceProvider;
use stockdb_backend::external::synthetic::SyntheticPriceProvider;
use stockdb_backend::logging::{init_logging, LoggingConfig};
use stockdb_backend::services::catalog_service;
use stockdb_backend::services::ingestion_service::IngestionEngine;
use stockdb_backend::services::job_scheduler_service::{JobContext, JobSchedulerService};
use stockdb_backend::services::rate_limiter::RateLimiter;
use stockdb_backend::state::AppState;
use stockdb_backend::store::{Catalog, MemoryStore, PgStore, PriceStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env())
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    let config = AppConfig::from_env().context("invalid configuration")?;

    let (catalog, prices): (Arc<dyn Catalog>, Arc<dyn PriceStore>) = match config.storage {
        StorageBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set")?;
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await
                .context("failed to connect to Postgres")?;
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("failed to run database migrations")?;
            tracing::info!("🗄️ Using Postgres storage");
            let store = PgStore::new(pool);
            (Arc::new(store.clone()), Arc::new(store))
        }
        StorageBackend::Memory => {
            tracing::info!("🗄️ Using in-memory storage (data is lost on exit)");
            let store = MemoryStore::new();
            (Arc::new(store.clone()), Arc::new(store))
        }
    };

    let (provider, rate_limiter): (Arc<dyn PriceProvider>, RateLimiter) = match config.provider {
        ProviderKind::AlphaVantage => {
            tracing::info!("📊 Using price provider: Alpha Vantage");
            let api_key = config
                .alphavantage_api_key
                .clone()
                .context("ALPHAVANTAGE_API_KEY must be set")?;
            (
                Arc::new(AlphaVantageProvider::new(
                    config.alphavantage_api_url.clone(),
                    api_key,
                )),
                RateLimiter::new(1, config.provider_request_delay),
            )
        }
        ProviderKind::Synthetic => {
            tracing::info!("📊 Using price provider: synthetic random walk");
            (Arc::new(SyntheticPriceProvider::default()), RateLimiter::unlimited())
        }
    };

    let ingestion = IngestionEngine::new(
        catalog.clone(),
        prices.clone(),
        provider,
        Arc::new(rate_limiter),
    );

    let report = catalog_service::bootstrap_catalog(catalog.as_ref(), &config.bootstrap())
        .await
        .context("failed to bootstrap catalog")?;
    tracing::info!(
        "📚 Catalog ready ({} instruments created, {} failed)",
        report.instruments_created.len(),
        report.instruments_failed.len()
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut scheduler = if config.scheduler_enabled {
        let context = JobContext {
            ingestion: ingestion.clone(),
            tickers: Arc::new(config.tickers.clone()),
            intraday_interval: config.intraday_interval,
            shutdown: shutdown_rx,
        };
        let mut scheduler = JobSchedulerService::new(context, config.schedule()).await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("⏸️ Job scheduler disabled");
        None
    };

    let state = AppState {
        catalog,
        prices,
        ingestion,
        intraday_interval: config.intraday_interval,
    };
    let cors = app::cors_layer(&config.cors_allowed_origin)
        .context("invalid CORS_ALLOWED_ORIGIN")?;
    let app = app::create_app(state).layer(cors);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("🚀 stockdb backend running at http://{}/", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Raise the flag before stop() so a running sweep ends after its current ticker
    let _ = shutdown_tx.send(true);
    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.stop().await?;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("🛑 Shutdown signal received");
}
