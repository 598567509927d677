use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{CreateExchange, CreateInstrument, Exchange, Instrument};
use crate::store::Catalog;

pub async fn list_exchanges(catalog: &dyn Catalog) -> Result<Vec<Exchange>, AppError> {
    Ok(catalog.list_exchanges().await?)
}

pub async fn create_exchange(
    catalog: &dyn Catalog,
    new: &CreateExchange,
) -> Result<Exchange, AppError> {
    new.validate()?;
    Ok(catalog.create_exchange(new).await?)
}

pub async fn list_instruments(catalog: &dyn Catalog) -> Result<Vec<Instrument>, AppError> {
    Ok(catalog.list_instruments().await?)
}

pub async fn list_instruments_by_exchange(
    catalog: &dyn Catalog,
    exchange_id: Uuid,
) -> Result<Vec<Instrument>, AppError> {
    if catalog.get_exchange(exchange_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Exchange {} not found", exchange_id)));
    }
    Ok(catalog.list_instruments_by_exchange(exchange_id).await?)
}

pub async fn create_instrument(
    catalog: &dyn Catalog,
    new: &CreateInstrument,
) -> Result<Instrument, AppError> {
    new.validate()?;
    Ok(catalog.create_instrument(new).await?)
}

#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub exchange: CreateExchange,
    pub tickers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BootstrapReport {
    pub exchange_created: bool,
    pub instruments_created: Vec<String>,
    pub instruments_failed: Vec<String>,
}

/// Makes sure the default exchange and every configured ticker exist.
///
/// Safe to run on every start: existing rows are found through side-effect free
/// lookups and left alone. A ticker that cannot be created is logged and
/// skipped; only a failure to obtain the exchange aborts the bootstrap.
pub async fn bootstrap_catalog(
    catalog: &dyn Catalog,
    config: &BootstrapConfig,
) -> Result<BootstrapReport, AppError> {
    info!("Bootstrapping catalog for {} tickers", config.tickers.len());
    let mut report = BootstrapReport::default();

    let exchange = match catalog.find_exchange_by_mic(&config.exchange.mic).await? {
        Some(existing) => existing,
        None => {
            let created = create_exchange(catalog, &config.exchange).await?;
            info!("Created default exchange: {} ({})", created.name, created.mic);
            report.exchange_created = true;
            created
        }
    };

    for ticker in &config.tickers {
        match ensure_instrument(catalog, exchange.id, ticker).await {
            Ok(true) => {
                info!("Created instrument: {}", ticker);
                report.instruments_created.push(ticker.clone());
            }
            Ok(false) => {}
            Err(e) => {
                error!("Error initializing instrument {}: {}", ticker, e);
                report.instruments_failed.push(ticker.clone());
            }
        }
    }

    Ok(report)
}

// Returns whether a new instrument was created.
async fn ensure_instrument(
    catalog: &dyn Catalog,
    exchange_id: Uuid,
    ticker: &str,
) -> Result<bool, AppError> {
    if catalog.resolve_ticker(ticker).await?.is_some() {
        return Ok(false);
    }
    create_instrument(catalog, &CreateInstrument::placeholder(exchange_id, ticker)).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PLACEHOLDER_KIND;
    use crate::store::MemoryStore;

    fn config(tickers: &[&str]) -> BootstrapConfig {
        BootstrapConfig {
            exchange: CreateExchange {
                mic: "XNAS".into(),
                name: "NASDAQ".into(),
                currency: "USD".into(),
                timezone: "America/New_York".into(),
            },
            tickers: tickers.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_bootstrap_creates_exchange_and_placeholders() {
        let store = MemoryStore::new();
        let report = bootstrap_catalog(&store, &config(&["AAPL", "IBM"])).await.unwrap();

        assert!(report.exchange_created);
        assert_eq!(report.instruments_created, vec!["AAPL", "IBM"]);

        let aapl = store.resolve_ticker("AAPL").await.unwrap().unwrap();
        assert_eq!(aapl.name, "AAPL Inc.");
        assert_eq!(aapl.kind, PLACEHOLDER_KIND);
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let store = MemoryStore::new();
        bootstrap_catalog(&store, &config(&["AAPL", "IBM"])).await.unwrap();
        let second = bootstrap_catalog(&store, &config(&["AAPL", "IBM", "MSFT"]))
            .await
            .unwrap();

        assert!(!second.exchange_created);
        assert_eq!(second.instruments_created, vec!["MSFT"]);
        assert_eq!(store.list_exchanges().await.unwrap().len(), 1);
        assert_eq!(store.list_instruments().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_bootstrap_keeps_existing_instrument_fields() {
        let store = MemoryStore::new();
        let exchange = store.create_exchange(&config(&[]).exchange).await.unwrap();
        store
            .create_instrument(&CreateInstrument {
                exchange_id: exchange.id,
                ticker: "NFLX".into(),
                name: "Netflix, Inc.".into(),
                kind: "Common Stock".into(),
            })
            .await
            .unwrap();

        let report = bootstrap_catalog(&store, &config(&["NFLX"])).await.unwrap();
        assert!(report.instruments_created.is_empty());
        let nflx = store.resolve_ticker("NFLX").await.unwrap().unwrap();
        assert_eq!(nflx.name, "Netflix, Inc.");
    }

    #[tokio::test]
    async fn test_bootstrap_continues_past_bad_ticker() {
        let store = MemoryStore::new();
        let report = bootstrap_catalog(&store, &config(&["AAPL", "  ", "IBM"])).await.unwrap();
        assert_eq!(report.instruments_failed.len(), 1);
        assert_eq!(report.instruments_created, vec!["AAPL", "IBM"]);
    }

    #[tokio::test]
    async fn test_listing_symbols_of_unknown_exchange() {
        let store = MemoryStore::new();
        let err = list_instruments_by_exchange(&store, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
