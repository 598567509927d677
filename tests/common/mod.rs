#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use stockdb_backend::external::scripted::ScriptedPriceProvider;
use stockdb_backend::models::{
    CreateExchange, CreateInstrument, DailyBar, DailyBarSample, Instrument, IntradayBar,
    IntradayBarSample, NewDailyBar, NewIntradayBar,
};
use stockdb_backend::services::ingestion_service::IngestionEngine;
use stockdb_backend::services::rate_limiter::RateLimiter;
use stockdb_backend::store::{Catalog, MemoryStore, PriceStore, StoreError};

pub fn nasdaq() -> CreateExchange {
    CreateExchange {
        mic: "XNAS".to_string(),
        name: "NASDAQ".to_string(),
        currency: "USD".to_string(),
        timezone: "America/New_York".to_string(),
    }
}

/// Memory store with the NASDAQ exchange and one placeholder instrument per ticker.
pub async fn seeded_store(tickers: &[&str]) -> (MemoryStore, Vec<Instrument>) {
    let store = MemoryStore::new();
    let exchange = store.create_exchange(&nasdaq()).await.unwrap();
    let mut instruments = Vec::new();
    for ticker in tickers {
        instruments.push(
            store
                .create_instrument(&CreateInstrument::placeholder(exchange.id, ticker))
                .await
                .unwrap(),
        );
    }
    (store, instruments)
}

pub fn engine(
    catalog: Arc<dyn Catalog>,
    prices: Arc<dyn PriceStore>,
    provider: Arc<ScriptedPriceProvider>,
) -> IngestionEngine {
    IngestionEngine::new(catalog, prices, provider, Arc::new(RateLimiter::unlimited()))
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn timestamp(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

pub fn daily_sample(day: &str, close: f64, volume: i64) -> DailyBarSample {
    DailyBarSample {
        date: date(day),
        open: close - 0.5,
        high: close + 1.0,
        low: close - 1.0,
        close,
        adjusted_close: close,
        volume,
    }
}

pub fn intraday_sample(at: &str, close: f64, volume: i64) -> IntradayBarSample {
    IntradayBarSample {
        timestamp: timestamp(at),
        open: close,
        high: close + 0.1,
        low: close - 0.1,
        close,
        volume,
    }
}

/// Price store that delegates to a `MemoryStore` but refuses writes for one
/// instrument once `fail_after` of its bars have been written.
pub struct FlakyStore {
    inner: MemoryStore,
    failing_instrument: Uuid,
    fail_after: usize,
    writes: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore, failing_instrument: Uuid, fail_after: usize) -> Self {
        Self {
            inner,
            failing_instrument,
            fail_after,
            writes: AtomicUsize::new(0),
        }
    }

    fn check(&self, instrument_id: Uuid) -> Result<(), StoreError> {
        if instrument_id != self.failing_instrument {
            return Ok(());
        }
        if self.writes.fetch_add(1, Ordering::SeqCst) >= self.fail_after {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl PriceStore for FlakyStore {
    async fn upsert_daily(&self, bar: &NewDailyBar) -> Result<Uuid, StoreError> {
        self.check(bar.instrument_id)?;
        self.inner.upsert_daily(bar).await
    }

    async fn upsert_intraday(&self, bar: &NewIntradayBar) -> Result<Uuid, StoreError> {
        self.check(bar.instrument_id)?;
        self.inner.upsert_intraday(bar).await
    }

    async fn list_daily(&self, instrument_id: Uuid) -> Result<Vec<DailyBar>, StoreError> {
        self.inner.list_daily(instrument_id).await
    }

    async fn list_intraday(&self, instrument_id: Uuid) -> Result<Vec<IntradayBar>, StoreError> {
        self.inner.list_intraday(instrument_id).await
    }

    async fn find_daily_since(
        &self,
        instrument_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<DailyBar>, StoreError> {
        self.inner.find_daily_since(instrument_id, since).await
    }

    async fn find_intraday_since(
        &self,
        instrument_id: Uuid,
        since: NaiveDateTime,
    ) -> Result<Vec<IntradayBar>, StoreError> {
        self.inner.find_intraday_since(instrument_id, since).await
    }
}
