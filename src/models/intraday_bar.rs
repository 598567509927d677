use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::timestamp_format;

// One fixed-interval OHLCV record. The timestamp is exchange-local with no offset.
// Unique per (instrument_id, timestamp).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct IntradayBar {
    pub id: Uuid,
    pub instrument_id: Uuid,
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntradayBarSample {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewIntradayBar {
    pub instrument_id: Uuid,
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl NewIntradayBar {
    pub fn validate(&self) -> Result<(), String> {
        if self.volume < 0 {
            return Err(format!("volume must be non-negative, got {}", self.volume));
        }
        if [self.open, self.high, self.low, self.close].iter().any(|p| !p.is_finite()) {
            return Err("prices must be finite numbers".to_string());
        }
        Ok(())
    }

    pub fn from_sample(instrument_id: Uuid, sample: &IntradayBarSample) -> Self {
        Self {
            instrument_id,
            timestamp: sample.timestamp,
            open: sample.open,
            high: sample.high,
            low: sample.low,
            close: sample.close,
            volume: sample.volume,
        }
    }

    pub fn into_bar(self, id: Uuid) -> IntradayBar {
        IntradayBar {
            id,
            instrument_id: self.instrument_id,
            timestamp: self.timestamp,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}

impl IntradayBar {
    pub fn apply(&mut self, update: &NewIntradayBar) {
        self.open = update.open;
        self.high = update.high;
        self.low = update.low;
        self.close = update.close;
        self.volume = update.volume;
    }
}
