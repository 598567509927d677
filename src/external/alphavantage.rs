use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::{DailyBarSample, IntradayBarSample, IntradayInterval};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub const DEFAULT_API_URL: &str = "https://www.alphavantage.co/query";

const DAILY_SERIES_KEY: &str = "Time Series (Daily)";

pub struct AlphaVantageProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl AlphaVantageProvider {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }

    async fn query(&self, params: &[(&str, &str)]) -> Result<Value, PriceProviderError> {
        let resp = self
            .client
            .get(&self.api_url)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(PriceProviderError::BadResponse(format!(
                "HTTP {}",
                resp.status()
            )));
        }

        resp.json::<Value>()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))
    }
}

// Field names as Alpha Vantage spells them; every value arrives as a string.
#[derive(Debug, Deserialize)]
struct AvBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

struct ParsedBar {
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
}

impl AvBar {
    fn parse(&self) -> Result<ParsedBar, PriceProviderError> {
        let volume = parse_field::<i64>("volume", &self.volume)?;
        if volume < 0 {
            return Err(PriceProviderError::Parse(format!(
                "negative volume {}",
                volume
            )));
        }
        Ok(ParsedBar {
            open: parse_field("open", &self.open)?,
            high: parse_field("high", &self.high)?,
            low: parse_field("low", &self.low)?,
            close: parse_field("close", &self.close)?,
            volume,
        })
    }
}

fn parse_field<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, PriceProviderError>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| PriceProviderError::Parse(format!("{} '{}': {}", name, raw, e)))
}

/// Pulls the named time series out of a response body, turning the provider's
/// in-band error payloads into errors.
fn extract_series(
    body: &Value,
    series_key: &str,
) -> Result<BTreeMap<String, AvBar>, PriceProviderError> {
    // Throttled: { "Note": "Thank you for using Alpha Vantage! ... 5 calls per minute ..." }
    if body.get("Note").is_some() {
        return Err(PriceProviderError::RateLimited);
    }

    // Newer throttle replies use "Information"; the same key also carries premium-only notices.
    if let Some(info) = body.get("Information").and_then(Value::as_str) {
        let lowered = info.to_lowercase();
        if lowered.contains("rate limit") || lowered.contains("call frequency") {
            return Err(PriceProviderError::RateLimited);
        }
        return Err(PriceProviderError::BadResponse(info.to_string()));
    }

    // Invalid: { "Error Message": "Invalid API call. ..." }
    if let Some(msg) = body.get("Error Message").and_then(Value::as_str) {
        return Err(PriceProviderError::BadResponse(msg.to_string()));
    }

    let series = body
        .get(series_key)
        .ok_or_else(|| PriceProviderError::BadResponse(format!("missing '{}'", series_key)))?;

    serde_json::from_value(series.clone()).map_err(|e| PriceProviderError::Parse(e.to_string()))
}

fn parse_daily(body: &Value) -> Result<Vec<DailyBarSample>, PriceProviderError> {
    let series = extract_series(body, DAILY_SERIES_KEY)?;

    // BTreeMap over zero-padded dates iterates oldest first
    series
        .iter()
        .map(|(date_str, bar)| {
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
                .map_err(|e| PriceProviderError::Parse(format!("date '{}': {}", date_str, e)))?;
            let parsed = bar.parse()?;
            Ok(DailyBarSample {
                date,
                open: parsed.open,
                high: parsed.high,
                low: parsed.low,
                close: parsed.close,
                // TIME_SERIES_DAILY carries no adjusted close
                adjusted_close: parsed.close,
                volume: parsed.volume,
            })
        })
        .collect()
}

fn parse_intraday(
    body: &Value,
    interval: IntradayInterval,
) -> Result<Vec<IntradayBarSample>, PriceProviderError> {
    let series_key = format!("Time Series ({})", interval);
    let series = extract_series(body, &series_key)?;

    series
        .iter()
        .map(|(ts_str, bar)| {
            let timestamp = NaiveDateTime::parse_from_str(ts_str, "%Y-%m-%d %H:%M:%S")
                .map_err(|e| {
                    PriceProviderError::Parse(format!("timestamp '{}': {}", ts_str, e))
                })?;
            let parsed = bar.parse()?;
            Ok(IntradayBarSample {
                timestamp,
                open: parsed.open,
                high: parsed.high,
                low: parsed.low,
                close: parsed.close,
                volume: parsed.volume,
            })
        })
        .collect()
}

#[async_trait]
impl PriceProvider for AlphaVantageProvider {
    async fn fetch_daily(&self, ticker: &str) -> Result<Vec<DailyBarSample>, PriceProviderError> {
        let body = self
            .query(&[("function", "TIME_SERIES_DAILY"), ("symbol", ticker)])
            .await?;
        parse_daily(&body)
    }

    async fn fetch_intraday(
        &self,
        ticker: &str,
        interval: IntradayInterval,
    ) -> Result<Vec<IntradayBarSample>, PriceProviderError> {
        let body = self
            .query(&[
                ("function", "TIME_SERIES_INTRADAY"),
                ("symbol", ticker),
                ("interval", interval.as_str()),
            ])
            .await?;
        parse_intraday(&body, interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bar(open: &str, close: &str, volume: &str) -> Value {
        json!({
            "1. open": open,
            "2. high": "200.0000",
            "3. low": "100.0000",
            "4. close": close,
            "5. volume": volume
        })
    }

    #[test]
    fn test_parse_daily_series() {
        let body = json!({
            "Meta Data": { "2. Symbol": "IBM" },
            "Time Series (Daily)": {
                "2024-01-03": bar("160.1000", "161.5000", "4100000"),
                "2024-01-02": bar("158.0000", "160.2000", "3900000")
            }
        });

        let samples = parse_daily(&body).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(samples[0].close, 160.2);
        assert_eq!(samples[0].adjusted_close, samples[0].close);
        assert_eq!(samples[1].volume, 4_100_000);
    }

    #[test]
    fn test_parse_intraday_uses_interval_key() {
        let body = json!({
            "Time Series (5min)": {
                "2024-01-03 15:55:00": bar("161.0", "161.2", "1200")
            }
        });

        let samples = parse_intraday(&body, IntradayInterval::FiveMinutes).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(
            samples[0].timestamp,
            NaiveDate::from_ymd_opt(2024, 1, 3)
                .unwrap()
                .and_hms_opt(15, 55, 0)
                .unwrap()
        );

        let err = parse_intraday(&body, IntradayInterval::OneMinute).unwrap_err();
        assert!(matches!(err, PriceProviderError::BadResponse(_)));
    }

    #[test]
    fn test_throttle_note_is_rate_limited() {
        let body = json!({ "Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute" });
        assert_eq!(parse_daily(&body).unwrap_err(), PriceProviderError::RateLimited);

        let body = json!({ "Information": "We have detected your API key and our standard API rate limit is 25 requests per day." });
        assert_eq!(parse_daily(&body).unwrap_err(), PriceProviderError::RateLimited);
    }

    #[test]
    fn test_error_message_is_bad_response() {
        let body = json!({ "Error Message": "Invalid API call." });
        assert_eq!(
            parse_daily(&body).unwrap_err(),
            PriceProviderError::BadResponse("Invalid API call.".to_string())
        );
    }

    #[test]
    fn test_unparseable_number_is_parse_error() {
        let body = json!({
            "Time Series (Daily)": { "2024-01-02": bar("n/a", "160.2", "10") }
        });
        assert!(matches!(parse_daily(&body).unwrap_err(), PriceProviderError::Parse(_)));

        let body = json!({
            "Time Series (Daily)": { "2024-01-02": bar("158.0", "160.2", "-5") }
        });
        assert!(matches!(parse_daily(&body).unwrap_err(), PriceProviderError::Parse(_)));
    }
}
