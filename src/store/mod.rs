//! Storage seams for the catalog and price history.
//!
//! Both traits are keyed by identity (UUID). Ticker resolution happens through
//! [`Catalog::resolve_ticker`] before any price operation is reached.
//!
//! - [`postgres::PgStore`] is the production implementation backed by sqlx.
//! - [`memory::MemoryStore`] keeps everything in process and backs tests and
//!   `STORAGE_BACKEND=memory` runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    CreateExchange, CreateInstrument, DailyBar, Exchange, Instrument, IntradayBar, NewDailyBar,
    NewIntradayBar,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("missing reference: {0}")]
    MissingReference(String),

    #[error("invalid bar: {0}")]
    InvalidBar(String),
}

#[async_trait]
pub trait Catalog: Send + Sync {
    async fn list_exchanges(&self) -> Result<Vec<Exchange>, StoreError>;

    async fn get_exchange(&self, id: Uuid) -> Result<Option<Exchange>, StoreError>;

    async fn find_exchange_by_mic(&self, mic: &str) -> Result<Option<Exchange>, StoreError>;

    /// Fails with [`StoreError::Conflict`] when the MIC is already registered.
    async fn create_exchange(&self, new: &CreateExchange) -> Result<Exchange, StoreError>;

    async fn list_instruments(&self) -> Result<Vec<Instrument>, StoreError>;

    async fn list_instruments_by_exchange(
        &self,
        exchange_id: Uuid,
    ) -> Result<Vec<Instrument>, StoreError>;

    async fn get_instrument(&self, id: Uuid) -> Result<Option<Instrument>, StoreError>;

    /// Fails with [`StoreError::MissingReference`] for an unknown exchange and
    /// [`StoreError::Conflict`] when the ticker already exists on that exchange.
    async fn create_instrument(&self, new: &CreateInstrument) -> Result<Instrument, StoreError>;

    /// Side-effect free lookup. When the same ticker is listed on several
    /// exchanges the earliest registered listing wins.
    async fn resolve_ticker(&self, ticker: &str) -> Result<Option<Instrument>, StoreError>;
}

#[async_trait]
pub trait PriceStore: Send + Sync {
    /// Inserts the bar, or overwrites the price fields of the bar already stored
    /// for `(instrument_id, date)`. Returns the id of the stored record, which is
    /// the existing id on overwrite.
    async fn upsert_daily(&self, bar: &NewDailyBar) -> Result<Uuid, StoreError>;

    /// Same contract as [`PriceStore::upsert_daily`], keyed on `(instrument_id, timestamp)`.
    async fn upsert_intraday(&self, bar: &NewIntradayBar) -> Result<Uuid, StoreError>;

    /// All daily bars for the instrument. No ordering guarantee.
    async fn list_daily(&self, instrument_id: Uuid) -> Result<Vec<DailyBar>, StoreError>;

    /// All intraday bars for the instrument. No ordering guarantee.
    async fn list_intraday(&self, instrument_id: Uuid) -> Result<Vec<IntradayBar>, StoreError>;

    /// Daily bars with `date >= since`. No ordering guarantee.
    async fn find_daily_since(
        &self,
        instrument_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<DailyBar>, StoreError>;

    /// Intraday bars with `timestamp >= since`. No ordering guarantee.
    async fn find_intraday_since(
        &self,
        instrument_id: Uuid,
        since: NaiveDateTime,
    ) -> Result<Vec<IntradayBar>, StoreError>;
}
