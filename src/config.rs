use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::external::alphavantage;
use crate::models::{CreateExchange, IntradayInterval};
use crate::services::catalog_service::BootstrapConfig;
use crate::services::job_scheduler_service::ScheduleConfig;

const DEFAULT_TICKERS: &str = "AAPL,IBM,GOOGL,MSFT,META,NFLX";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    AlphaVantage,
    Synthetic,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub provider: ProviderKind,
    pub alphavantage_api_url: String,
    pub alphavantage_api_key: Option<String>,
    pub tickers: Vec<String>,
    pub default_exchange: CreateExchange,
    pub daily_fetch_every: Duration,
    pub intraday_fetch_every: Duration,
    pub intraday_interval: IntradayInterval,
    pub provider_request_delay: Duration,
    pub scheduler_enabled: bool,
    pub run_jobs_on_startup: bool,
    pub cors_allowed_origin: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let storage = match get("STORAGE_BACKEND")
            .unwrap_or_else(|| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" => StorageBackend::Postgres,
            "memory" => StorageBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    key: "STORAGE_BACKEND",
                    message: format!("'{}' (expected postgres or memory)", other),
                })
            }
        };

        let database_url = get("DATABASE_URL");
        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let provider = match get("PRICE_PROVIDER")
            .unwrap_or_else(|| "alphavantage".to_string())
            .to_lowercase()
            .as_str()
        {
            "alphavantage" => ProviderKind::AlphaVantage,
            "synthetic" => ProviderKind::Synthetic,
            other => {
                return Err(ConfigError::Invalid {
                    key: "PRICE_PROVIDER",
                    message: format!("'{}' (expected alphavantage or synthetic)", other),
                })
            }
        };

        let alphavantage_api_key = get("ALPHAVANTAGE_API_KEY");
        if provider == ProviderKind::AlphaVantage && alphavantage_api_key.is_none() {
            return Err(ConfigError::Missing("ALPHAVANTAGE_API_KEY"));
        }

        let tickers: Vec<String> = get("TRACKED_TICKERS")
            .unwrap_or_else(|| DEFAULT_TICKERS.to_string())
            .split(',')
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty())
            .collect();

        let default_exchange = CreateExchange {
            mic: get("DEFAULT_EXCHANGE_MIC").unwrap_or_else(|| "XNAS".to_string()),
            name: get("DEFAULT_EXCHANGE_NAME").unwrap_or_else(|| "NASDAQ".to_string()),
            currency: get("DEFAULT_EXCHANGE_CURRENCY").unwrap_or_else(|| "USD".to_string()),
            timezone: get("DEFAULT_EXCHANGE_TIMEZONE")
                .unwrap_or_else(|| "America/New_York".to_string()),
        };

        Ok(Self {
            storage,
            database_url,
            database_max_connections: parse_or(&get, "DATABASE_MAX_CONNECTIONS", 10)?,
            bind_addr: parse_or(&get, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080)))?,
            provider,
            alphavantage_api_url: get("ALPHAVANTAGE_API_URL")
                .unwrap_or_else(|| alphavantage::DEFAULT_API_URL.to_string()),
            alphavantage_api_key,
            tickers,
            default_exchange,
            daily_fetch_every: Duration::from_secs(positive_secs(
                &get,
                "DAILY_FETCH_INTERVAL_SECS",
                12 * 60 * 60,
            )?),
            intraday_fetch_every: Duration::from_secs(positive_secs(
                &get,
                "INTRADAY_FETCH_INTERVAL_SECS",
                20 * 60,
            )?),
            intraday_interval: parse_or(&get, "INTRADAY_SAMPLING_INTERVAL", IntradayInterval::OneMinute)?,
            provider_request_delay: Duration::from_secs(parse_or(
                &get,
                "PROVIDER_REQUEST_DELAY_SECS",
                15u64,
            )?),
            scheduler_enabled: parse_or(&get, "SCHEDULER_ENABLED", true)?,
            run_jobs_on_startup: parse_or(&get, "RUN_JOBS_ON_STARTUP", true)?,
            cors_allowed_origin: get("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
        })
    }

    pub fn bootstrap(&self) -> BootstrapConfig {
        BootstrapConfig {
            exchange: self.default_exchange.clone(),
            tickers: self.tickers.clone(),
        }
    }

    pub fn schedule(&self) -> ScheduleConfig {
        ScheduleConfig {
            daily_every: self.daily_fetch_every,
            intraday_every: self.intraday_fetch_every,
            run_on_start: self.run_jobs_on_startup,
        }
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            message: format!("'{}': {}", raw, e),
        }),
    }
}

fn positive_secs<G>(get: &G, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let secs = parse_or(get, key, default)?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            key,
            message: "must be greater than zero".to_string(),
        });
    }
    Ok(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_match_reference_schedule() {
        let config = config_from(&[
            ("STORAGE_BACKEND", "memory"),
            ("PRICE_PROVIDER", "synthetic"),
        ])
        .unwrap();

        assert_eq!(config.tickers, vec!["AAPL", "IBM", "GOOGL", "MSFT", "META", "NFLX"]);
        assert_eq!(config.daily_fetch_every, Duration::from_secs(43_200));
        assert_eq!(config.intraday_fetch_every, Duration::from_secs(1_200));
        assert_eq!(config.provider_request_delay, Duration::from_secs(15));
        assert_eq!(config.intraday_interval, IntradayInterval::OneMinute);
        assert_eq!(config.default_exchange.mic, "XNAS");
        assert!(config.scheduler_enabled);
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let err = config_from(&[("PRICE_PROVIDER", "synthetic")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn test_alphavantage_requires_api_key() {
        let err = config_from(&[("STORAGE_BACKEND", "memory")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("ALPHAVANTAGE_API_KEY")));
    }

    #[test]
    fn test_tickers_are_normalized() {
        let config = config_from(&[
            ("STORAGE_BACKEND", "memory"),
            ("PRICE_PROVIDER", "synthetic"),
            ("TRACKED_TICKERS", " aapl, ,ibm "),
        ])
        .unwrap();
        assert_eq!(config.tickers, vec!["AAPL", "IBM"]);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = config_from(&[
            ("STORAGE_BACKEND", "memory"),
            ("PRICE_PROVIDER", "synthetic"),
            ("INTRADAY_SAMPLING_INTERVAL", "2min"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "INTRADAY_SAMPLING_INTERVAL", .. }));

        let err = config_from(&[
            ("STORAGE_BACKEND", "memory"),
            ("PRICE_PROVIDER", "synthetic"),
            ("DAILY_FETCH_INTERVAL_SECS", "0"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "DAILY_FETCH_INTERVAL_SECS", .. }));
    }
}
