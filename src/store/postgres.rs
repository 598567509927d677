use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{catalog_queries, price_queries};
use crate::models::{
    CreateExchange, CreateInstrument, DailyBar, Exchange, Instrument, IntradayBar, NewDailyBar,
    NewIntradayBar,
};
use crate::store::{Catalog, PriceStore, StoreError};

/// Postgres-backed catalog and price store. Cheap to clone; the pool is shared.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// Translates constraint violations into the StoreError cases callers can act on.
fn classify(err: sqlx::Error, what: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Conflict(format!("{} already exists", what));
        }
        if db_err.is_check_violation() {
            return StoreError::InvalidBar(format!("{} violates a column constraint", what));
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::MissingReference(format!("{} references an unknown row", what));
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl Catalog for PgStore {
    async fn list_exchanges(&self) -> Result<Vec<Exchange>, StoreError> {
        Ok(catalog_queries::fetch_exchanges(&self.pool).await?)
    }

    async fn get_exchange(&self, id: Uuid) -> Result<Option<Exchange>, StoreError> {
        Ok(catalog_queries::fetch_exchange(&self.pool, id).await?)
    }

    async fn find_exchange_by_mic(&self, mic: &str) -> Result<Option<Exchange>, StoreError> {
        Ok(catalog_queries::fetch_exchange_by_mic(&self.pool, mic).await?)
    }

    async fn create_exchange(&self, new: &CreateExchange) -> Result<Exchange, StoreError> {
        catalog_queries::insert_exchange(&self.pool, new)
            .await
            .map_err(|e| classify(e, &format!("exchange with MIC {}", new.mic)))
    }

    async fn list_instruments(&self) -> Result<Vec<Instrument>, StoreError> {
        Ok(catalog_queries::fetch_instruments(&self.pool).await?)
    }

    async fn list_instruments_by_exchange(
        &self,
        exchange_id: Uuid,
    ) -> Result<Vec<Instrument>, StoreError> {
        Ok(catalog_queries::fetch_instruments_by_exchange(&self.pool, exchange_id).await?)
    }

    async fn get_instrument(&self, id: Uuid) -> Result<Option<Instrument>, StoreError> {
        Ok(catalog_queries::fetch_instrument(&self.pool, id).await?)
    }

    async fn create_instrument(&self, new: &CreateInstrument) -> Result<Instrument, StoreError> {
        catalog_queries::insert_instrument(&self.pool, new)
            .await
            .map_err(|e| {
                classify(
                    e,
                    &format!("instrument {} on exchange {}", new.ticker, new.exchange_id),
                )
            })
    }

    async fn resolve_ticker(&self, ticker: &str) -> Result<Option<Instrument>, StoreError> {
        Ok(catalog_queries::fetch_instrument_by_ticker(&self.pool, ticker).await?)
    }
}

#[async_trait]
impl PriceStore for PgStore {
    async fn upsert_daily(&self, bar: &NewDailyBar) -> Result<Uuid, StoreError> {
        price_queries::upsert_daily_bar(&self.pool, bar)
            .await
            .map_err(|e| classify(e, &format!("daily bar for instrument {}", bar.instrument_id)))
    }

    async fn upsert_intraday(&self, bar: &NewIntradayBar) -> Result<Uuid, StoreError> {
        price_queries::upsert_intraday_bar(&self.pool, bar)
            .await
            .map_err(|e| {
                classify(e, &format!("intraday bar for instrument {}", bar.instrument_id))
            })
    }

    async fn list_daily(&self, instrument_id: Uuid) -> Result<Vec<DailyBar>, StoreError> {
        Ok(price_queries::fetch_daily(&self.pool, instrument_id).await?)
    }

    async fn list_intraday(&self, instrument_id: Uuid) -> Result<Vec<IntradayBar>, StoreError> {
        Ok(price_queries::fetch_intraday(&self.pool, instrument_id).await?)
    }

    async fn find_daily_since(
        &self,
        instrument_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<DailyBar>, StoreError> {
        Ok(price_queries::fetch_daily_since(&self.pool, instrument_id, since).await?)
    }

    async fn find_intraday_since(
        &self,
        instrument_id: Uuid,
        since: NaiveDateTime,
    ) -> Result<Vec<IntradayBar>, StoreError> {
        Ok(price_queries::fetch_intraday_since(&self.pool, instrument_id, since).await?)
    }
}
