use async_trait::async_trait;
use thiserror::Error;

use crate::models::{DailyBarSample, IntradayBarSample, IntradayInterval};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PriceProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,
}

/// Source of OHLCV bars for a ticker.
///
/// Implementations report any transport, throttling or payload problem as an
/// error; the ingestion layer decides that such a failure means "no data".
#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn fetch_daily(&self, ticker: &str) -> Result<Vec<DailyBarSample>, PriceProviderError>;

    async fn fetch_intraday(
        &self,
        ticker: &str,
        interval: IntradayInterval,
    ) -> Result<Vec<IntradayBarSample>, PriceProviderError>;
}
