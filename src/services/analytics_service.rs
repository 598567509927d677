use chrono::{NaiveDate, NaiveDateTime};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{DailyBar, Instrument, IntradayBar, MovingAverage};
use crate::store::{Catalog, PriceStore};

async fn resolve(catalog: &dyn Catalog, ticker: &str) -> Result<Instrument, AppError> {
    catalog
        .resolve_ticker(ticker)
        .await?
        .ok_or_else(|| AppError::InstrumentNotFound(ticker.to_string()))
}

/// Arithmetic mean of the `window` most recent closes.
///
/// `average` is `None` when fewer than `window` daily bars are stored; a
/// partial average is never returned.
pub async fn simple_moving_average(
    catalog: &dyn Catalog,
    prices: &dyn PriceStore,
    ticker: &str,
    window: usize,
) -> Result<MovingAverage, AppError> {
    if window == 0 {
        return Err(AppError::Validation("window must be at least 1".to_string()));
    }

    let instrument = resolve(catalog, ticker).await?;
    let mut bars = prices.list_daily(instrument.id).await?;
    sort_daily_newest_first(&mut bars);

    let average = if bars.len() < window {
        info!(
            "Insufficient data for {}-bar SMA of {} ({} bars stored)",
            window,
            ticker,
            bars.len()
        );
        None
    } else {
        let sum: f64 = bars.iter().take(window).map(|b| b.close).sum();
        Some(sum / window as f64)
    };

    Ok(MovingAverage {
        ticker: ticker.to_string(),
        window,
        average,
    })
}

/// Daily bars dated on or after `since`, newest first.
pub async fn daily_since(
    catalog: &dyn Catalog,
    prices: &dyn PriceStore,
    ticker: &str,
    since: NaiveDate,
) -> Result<Vec<DailyBar>, AppError> {
    let instrument = resolve(catalog, ticker).await?;
    let mut bars = prices.find_daily_since(instrument.id, since).await?;
    sort_daily_newest_first(&mut bars);
    Ok(bars)
}

/// Intraday bars stamped on or after `since`, newest first (same order as
/// [`daily_since`]).
pub async fn intraday_since(
    catalog: &dyn Catalog,
    prices: &dyn PriceStore,
    ticker: &str,
    since: NaiveDateTime,
) -> Result<Vec<IntradayBar>, AppError> {
    let instrument = resolve(catalog, ticker).await?;
    let mut bars = prices.find_intraday_since(instrument.id, since).await?;
    bars.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(bars)
}

/// Every daily bar of an instrument, oldest first.
pub async fn daily_prices_for_instrument(
    catalog: &dyn Catalog,
    prices: &dyn PriceStore,
    instrument_id: Uuid,
) -> Result<Vec<DailyBar>, AppError> {
    if catalog.get_instrument(instrument_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Instrument {} not found",
            instrument_id
        )));
    }
    let mut bars = prices.list_daily(instrument_id).await?;
    bars.sort_by(|a, b| a.date.cmp(&b.date));
    Ok(bars)
}

fn sort_daily_newest_first(bars: &mut [DailyBar]) {
    bars.sort_by(|a, b| b.date.cmp(&a.date));
}
