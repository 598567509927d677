use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const PLACEHOLDER_KIND: &str = "Common Stock";

// A tradable ticker listed on one exchange. The ticker is unique per exchange.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Instrument {
    pub id: Uuid,
    pub exchange_id: Uuid,
    pub ticker: String,
    pub name: String,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInstrument {
    pub exchange_id: Uuid,
    pub ticker: String,
    pub name: String,
    pub kind: String,
}

impl CreateInstrument {
    /// Builds the record created for a configured ticker that the catalog does not know yet.
    pub fn placeholder(exchange_id: Uuid, ticker: &str) -> Self {
        Self {
            exchange_id,
            ticker: ticker.to_string(),
            name: format!("{} Inc.", ticker),
            kind: PLACEHOLDER_KIND.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.ticker.trim().is_empty() {
            return Err("ticker must not be empty".to_string());
        }
        if self.name.trim().is_empty() {
            return Err("instrument name must not be empty".to_string());
        }
        Ok(())
    }
}

impl Instrument {
    pub fn from_new(new: &CreateInstrument) -> Self {
        Self {
            id: Uuid::new_v4(),
            exchange_id: new.exchange_id,
            ticker: new.ticker.clone(),
            name: new.name.clone(),
            kind: new.kind.clone(),
            created_at: Utc::now(),
        }
    }
}
