use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// A trading venue, identified by its ISO 10383 market identifier code.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Exchange {
    pub id: Uuid,
    pub mic: String,
    pub name: String,
    pub currency: String,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExchange {
    pub mic: String,
    pub name: String,
    pub currency: String,
    pub timezone: String,
}

impl CreateExchange {
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("mic", &self.mic),
            ("name", &self.name),
            ("currency", &self.currency),
            ("timezone", &self.timezone),
        ] {
            if value.trim().is_empty() {
                return Err(format!("exchange {} must not be empty", field));
            }
        }
        Ok(())
    }
}

impl Exchange {
    pub fn from_new(new: &CreateExchange) -> Self {
        Self {
            id: Uuid::new_v4(),
            mic: new.mic.clone(),
            name: new.name.clone(),
            currency: new.currency.clone(),
            timezone: new.timezone.clone(),
            created_at: Utc::now(),
        }
    }
}
