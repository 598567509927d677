use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// One end-of-day OHLCV record. Unique per (instrument_id, date).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct DailyBar {
    pub id: Uuid,
    pub instrument_id: Uuid,
    pub date: NaiveDate, // serialized as YYYY-MM-DD
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adjusted_close: f64,
    pub volume: i64,
}

/// A daily bar as returned by a price provider, before it is tied to an instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyBarSample {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adjusted_close: f64,
    pub volume: i64,
}

/// The write shape for a daily bar: everything but the identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewDailyBar {
    pub instrument_id: Uuid,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adjusted_close: f64,
    pub volume: i64,
}

impl NewDailyBar {
    pub fn from_sample(instrument_id: Uuid, sample: &DailyBarSample) -> Self {
        Self {
            instrument_id,
            date: sample.date,
            open: sample.open,
            high: sample.high,
            low: sample.low,
            close: sample.close,
            adjusted_close: sample.adjusted_close,
            volume: sample.volume,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.volume < 0 {
            return Err(format!("volume must be non-negative, got {}", self.volume));
        }
        let prices = [self.open, self.high, self.low, self.close, self.adjusted_close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err("prices must be finite numbers".to_string());
        }
        Ok(())
    }

    pub fn into_bar(self, id: Uuid) -> DailyBar {
        DailyBar {
            id,
            instrument_id: self.instrument_id,
            date: self.date,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            adjusted_close: self.adjusted_close,
            volume: self.volume,
        }
    }
}

impl DailyBar {
    /// Overwrites the mutable price fields, leaving identity and key untouched.
    pub fn apply(&mut self, update: &NewDailyBar) {
        self.open = update.open;
        self.high = update.high;
        self.low = update.low;
        self.close = update.close;
        self.adjusted_close = update.adjusted_close;
        self.volume = update.volume;
    }
}
