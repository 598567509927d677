use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::{DailyBarSample, IntradayBarSample, IntradayInterval};

/// Replays canned responses per ticker and records every call it receives.
///
/// Tickers without a scripted response answer with
/// `BadResponse("no data scripted")`, which is what an unknown symbol looks
/// like from a real provider.
#[derive(Default)]
pub struct ScriptedPriceProvider {
    daily: Mutex<HashMap<String, Result<Vec<DailyBarSample>, PriceProviderError>>>,
    intraday: Mutex<HashMap<String, Result<Vec<IntradayBarSample>, PriceProviderError>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedPriceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_daily(&self, ticker: &str, response: Result<Vec<DailyBarSample>, PriceProviderError>) {
        self.daily.lock().insert(ticker.to_string(), response);
    }

    pub fn set_intraday(
        &self,
        ticker: &str,
        response: Result<Vec<IntradayBarSample>, PriceProviderError>,
    ) {
        self.intraday.lock().insert(ticker.to_string(), response);
    }

    /// Calls seen so far, as `daily:TICKER` or `intraday:TICKER:INTERVAL`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

fn unscripted<T>() -> Result<T, PriceProviderError> {
    Err(PriceProviderError::BadResponse("no data scripted".to_string()))
}

#[async_trait]
impl PriceProvider for ScriptedPriceProvider {
    async fn fetch_daily(&self, ticker: &str) -> Result<Vec<DailyBarSample>, PriceProviderError> {
        self.calls.lock().push(format!("daily:{}", ticker));
        self.daily.lock().get(ticker).cloned().unwrap_or_else(unscripted)
    }

    async fn fetch_intraday(
        &self,
        ticker: &str,
        interval: IntradayInterval,
    ) -> Result<Vec<IntradayBarSample>, PriceProviderError> {
        self.calls.lock().push(format!("intraday:{}:{}", ticker, interval));
        self.intraday.lock().get(ticker).cloned().unwrap_or_else(unscripted)
    }
}
