use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::external::price_provider::PriceProvider;
use crate::models::{
    DailyBarSample, Instrument, IntradayBarSample, IntradayInterval, NewDailyBar, NewIntradayBar,
};
use crate::services::rate_limiter::RateLimiter;
use crate::store::{Catalog, PriceStore};

/// Fetches bars for one ticker and merges them into the price store.
///
/// Merging is an upsert per bar: re-ingesting a batch leaves the store as it
/// was after the first run, and a bar reported again with new values replaces
/// the stored values while keeping the record's id.
///
/// Failure policy:
/// - unknown ticker: `AppError::InstrumentNotFound`, no provider call is made
/// - provider error: logged, reported as zero bars processed
/// - store error: the rest of the batch is abandoned and the error returned;
///   bars already written stay written
///
/// Nothing is retried here.
#[derive(Clone)]
pub struct IngestionEngine {
    catalog: Arc<dyn Catalog>,
    prices: Arc<dyn PriceStore>,
    provider: Arc<dyn PriceProvider>,
    rate_limiter: Arc<RateLimiter>,
}

impl IngestionEngine {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        prices: Arc<dyn PriceStore>,
        provider: Arc<dyn PriceProvider>,
        rate_limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            catalog,
            prices,
            provider,
            rate_limiter,
        }
    }

    async fn resolve(&self, ticker: &str) -> Result<Instrument, AppError> {
        self.catalog
            .resolve_ticker(ticker)
            .await?
            .ok_or_else(|| AppError::InstrumentNotFound(ticker.to_string()))
    }

    /// Fetch daily bars for `ticker` and merge them. Returns the number of bars processed.
    pub async fn fetch_and_store_daily(&self, ticker: &str) -> Result<usize, AppError> {
        let instrument = self.resolve(ticker).await?;

        let fetched = {
            let _permit = self.rate_limiter.acquire().await;
            self.provider.fetch_daily(ticker).await
        };

        let samples = match fetched {
            Ok(samples) => samples,
            Err(e) => {
                warn!("Daily fetch for {} returned no usable data: {}", ticker, e);
                return Ok(0);
            }
        };

        self.merge_daily(instrument.id, &samples).await.map_err(|e| {
            error!("Failed to store daily bars for {}: {}", ticker, e);
            e
        })
    }

    /// Fetch intraday bars sampled at `interval` for `ticker` and merge them.
    pub async fn fetch_and_store_intraday(
        &self,
        ticker: &str,
        interval: IntradayInterval,
    ) -> Result<usize, AppError> {
        let instrument = self.resolve(ticker).await?;

        let fetched = {
            let _permit = self.rate_limiter.acquire().await;
            self.provider.fetch_intraday(ticker, interval).await
        };

        let samples = match fetched {
            Ok(samples) => samples,
            Err(e) => {
                warn!(
                    "Intraday ({}) fetch for {} returned no usable data: {}",
                    interval, ticker, e
                );
                return Ok(0);
            }
        };

        self.merge_intraday(instrument.id, &samples).await.map_err(|e| {
            error!("Failed to store intraday bars for {}: {}", ticker, e);
            e
        })
    }

    /// Upserts each sample in order, stopping at the first store failure.
    pub async fn merge_daily(
        &self,
        instrument_id: Uuid,
        samples: &[DailyBarSample],
    ) -> Result<usize, AppError> {
        let mut count = 0;
        for sample in samples {
            let bar = NewDailyBar::from_sample(instrument_id, sample);
            self.prices.upsert_daily(&bar).await?;
            count += 1;
        }
        info!("Merged {} daily bars for instrument {}", count, instrument_id);
        Ok(count)
    }

    pub async fn merge_intraday(
        &self,
        instrument_id: Uuid,
        samples: &[IntradayBarSample],
    ) -> Result<usize, AppError> {
        let mut count = 0;
        for sample in samples {
            let bar = NewIntradayBar::from_sample(instrument_id, sample);
            self.prices.upsert_intraday(&bar).await?;
            count += 1;
        }
        info!("Merged {} intraday bars for instrument {}", count, instrument_id);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::price_provider::PriceProviderError;
    use crate::external::scripted::ScriptedPriceProvider;
    use crate::models::{CreateExchange, CreateInstrument};
    use crate::store::MemoryStore;
    use chrono::NaiveDate;

    async fn engine_with(
        provider: Arc<ScriptedPriceProvider>,
        tickers: &[&str],
    ) -> (IngestionEngine, MemoryStore) {
        let store = MemoryStore::new();
        let exchange = store
            .create_exchange(&CreateExchange {
                mic: "XNAS".into(),
                name: "NASDAQ".into(),
                currency: "USD".into(),
                timezone: "America/New_York".into(),
            })
            .await
            .unwrap();
        for ticker in tickers {
            store
                .create_instrument(&CreateInstrument::placeholder(exchange.id, ticker))
                .await
                .unwrap();
        }
        let engine = IngestionEngine::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            provider,
            Arc::new(RateLimiter::unlimited()),
        );
        (engine, store)
    }

    fn sample(day: u32, close: f64) -> DailyBarSample {
        DailyBarSample {
            date: NaiveDate::from_ymd_opt(2024, 2, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            adjusted_close: close,
            volume: 1_000,
        }
    }

    #[tokio::test]
    async fn test_unknown_ticker_is_rejected_before_fetching() {
        let provider = Arc::new(ScriptedPriceProvider::new());
        let (engine, _) = engine_with(provider.clone(), &[]).await;

        let err = engine.fetch_and_store_daily("NOPE").await.unwrap_err();
        assert!(matches!(err, AppError::InstrumentNotFound(t) if t == "NOPE"));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_counts_as_zero() {
        let provider = Arc::new(ScriptedPriceProvider::new());
        provider.set_daily("IBM", Err(PriceProviderError::RateLimited));
        let (engine, _) = engine_with(provider, &["IBM"]).await;

        assert_eq!(engine.fetch_and_store_daily("IBM").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_count_includes_overwritten_bars() {
        let provider = Arc::new(ScriptedPriceProvider::new());
        provider.set_daily("IBM", Ok(vec![sample(1, 10.0), sample(2, 11.0)]));
        let (engine, store) = engine_with(provider, &["IBM"]).await;

        assert_eq!(engine.fetch_and_store_daily("IBM").await.unwrap(), 2);
        assert_eq!(engine.fetch_and_store_daily("IBM").await.unwrap(), 2);

        let instrument = store.resolve_ticker("IBM").await.unwrap().unwrap();
        assert_eq!(store.list_daily(instrument.id).await.unwrap().len(), 2);
    }
}
