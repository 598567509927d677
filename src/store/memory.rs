use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::models::{
    CreateExchange, CreateInstrument, DailyBar, Exchange, Instrument, IntradayBar, NewDailyBar,
    NewIntradayBar,
};
use crate::store::{Catalog, PriceStore, StoreError};

/// In-process catalog and price store.
///
/// Bars live in `DashMap`s keyed by `(instrument_id, key)`; an upsert goes through
/// the entry API, which holds the shard lock for that key for the whole
/// check-then-write, so two writers can never create two records for one key.
/// Catalog rows are kept in registration order.
#[derive(Clone, Default)]
pub struct MemoryStore {
    exchanges: Arc<RwLock<Vec<Exchange>>>,
    instruments: Arc<RwLock<Vec<Instrument>>>,
    daily: Arc<DashMap<(Uuid, NaiveDate), DailyBar>>,
    intraday: Arc<DashMap<(Uuid, NaiveDateTime), IntradayBar>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_instrument(&self, instrument_id: Uuid) -> Result<(), StoreError> {
        if self.instruments.read().iter().any(|i| i.id == instrument_id) {
            Ok(())
        } else {
            Err(StoreError::MissingReference(format!(
                "instrument {} does not exist",
                instrument_id
            )))
        }
    }
}

#[async_trait]
impl Catalog for MemoryStore {
    async fn list_exchanges(&self) -> Result<Vec<Exchange>, StoreError> {
        Ok(self.exchanges.read().clone())
    }

    async fn get_exchange(&self, id: Uuid) -> Result<Option<Exchange>, StoreError> {
        Ok(self.exchanges.read().iter().find(|e| e.id == id).cloned())
    }

    async fn find_exchange_by_mic(&self, mic: &str) -> Result<Option<Exchange>, StoreError> {
        Ok(self.exchanges.read().iter().find(|e| e.mic == mic).cloned())
    }

    async fn create_exchange(&self, new: &CreateExchange) -> Result<Exchange, StoreError> {
        let mut exchanges = self.exchanges.write();
        if exchanges.iter().any(|e| e.mic == new.mic) {
            return Err(StoreError::Conflict(format!(
                "exchange with MIC {} already exists",
                new.mic
            )));
        }
        let exchange = Exchange::from_new(new);
        exchanges.push(exchange.clone());
        Ok(exchange)
    }

    async fn list_instruments(&self) -> Result<Vec<Instrument>, StoreError> {
        Ok(self.instruments.read().clone())
    }

    async fn list_instruments_by_exchange(
        &self,
        exchange_id: Uuid,
    ) -> Result<Vec<Instrument>, StoreError> {
        Ok(self
            .instruments
            .read()
            .iter()
            .filter(|i| i.exchange_id == exchange_id)
            .cloned()
            .collect())
    }

    async fn get_instrument(&self, id: Uuid) -> Result<Option<Instrument>, StoreError> {
        Ok(self.instruments.read().iter().find(|i| i.id == id).cloned())
    }

    async fn create_instrument(&self, new: &CreateInstrument) -> Result<Instrument, StoreError> {
        if !self.exchanges.read().iter().any(|e| e.id == new.exchange_id) {
            return Err(StoreError::MissingReference(format!(
                "exchange {} does not exist",
                new.exchange_id
            )));
        }

        let mut instruments = self.instruments.write();
        if instruments
            .iter()
            .any(|i| i.exchange_id == new.exchange_id && i.ticker == new.ticker)
        {
            return Err(StoreError::Conflict(format!(
                "instrument {} on exchange {} already exists",
                new.ticker, new.exchange_id
            )));
        }
        let instrument = Instrument::from_new(new);
        instruments.push(instrument.clone());
        Ok(instrument)
    }

    async fn resolve_ticker(&self, ticker: &str) -> Result<Option<Instrument>, StoreError> {
        Ok(self.instruments.read().iter().find(|i| i.ticker == ticker).cloned())
    }
}

#[async_trait]
impl PriceStore for MemoryStore {
    async fn upsert_daily(&self, bar: &NewDailyBar) -> Result<Uuid, StoreError> {
        bar.validate().map_err(StoreError::InvalidBar)?;
        self.ensure_instrument(bar.instrument_id)?;

        let id = match self.daily.entry((bar.instrument_id, bar.date)) {
            Entry::Occupied(mut existing) => {
                existing.get_mut().apply(bar);
                existing.get().id
            }
            Entry::Vacant(slot) => {
                let id = Uuid::new_v4();
                slot.insert(bar.clone().into_bar(id));
                id
            }
        };
        Ok(id)
    }

    async fn upsert_intraday(&self, bar: &NewIntradayBar) -> Result<Uuid, StoreError> {
        bar.validate().map_err(StoreError::InvalidBar)?;
        self.ensure_instrument(bar.instrument_id)?;

        let id = match self.intraday.entry((bar.instrument_id, bar.timestamp)) {
            Entry::Occupied(mut existing) => {
                existing.get_mut().apply(bar);
                existing.get().id
            }
            Entry::Vacant(slot) => {
                let id = Uuid::new_v4();
                slot.insert(bar.clone().into_bar(id));
                id
            }
        };
        Ok(id)
    }

    async fn list_daily(&self, instrument_id: Uuid) -> Result<Vec<DailyBar>, StoreError> {
        Ok(self
            .daily
            .iter()
            .filter(|entry| entry.key().0 == instrument_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn list_intraday(&self, instrument_id: Uuid) -> Result<Vec<IntradayBar>, StoreError> {
        Ok(self
            .intraday
            .iter()
            .filter(|entry| entry.key().0 == instrument_id)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn find_daily_since(
        &self,
        instrument_id: Uuid,
        since: NaiveDate,
    ) -> Result<Vec<DailyBar>, StoreError> {
        Ok(self
            .daily
            .iter()
            .filter(|entry| entry.key().0 == instrument_id && entry.key().1 >= since)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn find_intraday_since(
        &self,
        instrument_id: Uuid,
        since: NaiveDateTime,
    ) -> Result<Vec<IntradayBar>, StoreError> {
        Ok(self
            .intraday
            .iter()
            .filter(|entry| entry.key().0 == instrument_id && entry.key().1 >= since)
            .map(|entry| entry.value().clone())
            .collect())
    }
}
