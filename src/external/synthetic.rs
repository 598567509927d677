use async_trait::async_trait;
use chrono::{Datelike, Duration as ChronoDuration, NaiveTime, Timelike, Utc, Weekday};
use rand::Rng;

use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::{DailyBarSample, IntradayBarSample, IntradayInterval};

const DAILY_BARS: i64 = 100;
const INTRADAY_BARS: i64 = 100;

/// Random-walk bars for running the service without an API key
/// (`PRICE_PROVIDER=synthetic`). Never fails.
pub struct SyntheticPriceProvider {
    start_price: f64,
}

impl SyntheticPriceProvider {
    pub fn new(start_price: f64) -> Self {
        Self { start_price }
    }

    fn walk(&self, steps: usize, step_pct: f64) -> Vec<(f64, f64, f64, f64, i64)> {
        let mut rng = rand::rng();
        let mut current = self.start_price;
        (0..steps)
            .map(|_| {
                let open = current;
                current *= 1.0 + (rng.random::<f64>() - 0.5) * step_pct;
                let close = current;
                let high = open.max(close) * (1.0 + rng.random::<f64>() * step_pct / 4.0);
                let low = open.min(close) * (1.0 - rng.random::<f64>() * step_pct / 4.0);
                let volume = rng.random_range(10_000..5_000_000);
                (open, high, low, close, volume)
            })
            .collect()
    }
}

impl Default for SyntheticPriceProvider {
    fn default() -> Self {
        Self::new(100.0)
    }
}

#[async_trait]
impl PriceProvider for SyntheticPriceProvider {
    async fn fetch_daily(&self, _ticker: &str) -> Result<Vec<DailyBarSample>, PriceProviderError> {
        let today = Utc::now().date_naive();
        let dates: Vec<_> = (0..DAILY_BARS * 2)
            .map(|i| today - ChronoDuration::days(i))
            .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .take(DAILY_BARS as usize)
            .collect();

        let bars = self.walk(dates.len(), 0.02);
        Ok(dates
            .into_iter()
            .rev()
            .zip(bars)
            .map(|(date, (open, high, low, close, volume))| DailyBarSample {
                date,
                open,
                high,
                low,
                close,
                adjusted_close: close,
                volume,
            })
            .collect())
    }

    async fn fetch_intraday(
        &self,
        _ticker: &str,
        interval: IntradayInterval,
    ) -> Result<Vec<IntradayBarSample>, PriceProviderError> {
        let step = match interval {
            IntradayInterval::OneMinute => 1,
            IntradayInterval::FiveMinutes => 5,
            IntradayInterval::FifteenMinutes => 15,
            IntradayInterval::ThirtyMinutes => 30,
            IntradayInterval::SixtyMinutes => 60,
        };

        // Align to the interval so repeated fetches land on the same keys
        let now = Utc::now().naive_utc();
        let minute = now.minute() as i64 - now.minute() as i64 % step;
        let aligned = now.date().and_time(
            NaiveTime::from_hms_opt(now.hour(), minute as u32, 0).unwrap_or(NaiveTime::MIN),
        );

        let bars = self.walk(INTRADAY_BARS as usize, 0.002);
        Ok((0..INTRADAY_BARS)
            .rev()
            .map(|i| aligned - ChronoDuration::minutes(i * step))
            .zip(bars)
            .map(|(timestamp, (open, high, low, close, volume))| IntradayBarSample {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_synthetic_daily_has_unique_weekday_dates() {
        let provider = SyntheticPriceProvider::default();
        let bars = provider.fetch_daily("ANY").await.unwrap();
        assert_eq!(bars.len(), DAILY_BARS as usize);
        assert!(bars.windows(2).all(|w| w[0].date < w[1].date));
        assert!(bars.iter().all(|b| b.low <= b.high && b.volume >= 0));
    }

    #[tokio::test]
    async fn test_synthetic_intraday_is_aligned_to_interval() {
        let provider = SyntheticPriceProvider::default();
        let bars = provider
            .fetch_intraday("ANY", IntradayInterval::FifteenMinutes)
            .await
            .unwrap();
        assert_eq!(bars.len(), INTRADAY_BARS as usize);
        assert!(bars.iter().all(|b| b.timestamp.minute() % 15 == 0 && b.timestamp.second() == 0));
    }
}
