use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sampling interval for intraday bars, spelled the way the provider expects it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntradayInterval {
    #[default]
    #[serde(rename = "1min")]
    OneMinute,
    #[serde(rename = "5min")]
    FiveMinutes,
    #[serde(rename = "15min")]
    FifteenMinutes,
    #[serde(rename = "30min")]
    ThirtyMinutes,
    #[serde(rename = "60min")]
    SixtyMinutes,
}

impl IntradayInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntradayInterval::OneMinute => "1min",
            IntradayInterval::FiveMinutes => "5min",
            IntradayInterval::FifteenMinutes => "15min",
            IntradayInterval::ThirtyMinutes => "30min",
            IntradayInterval::SixtyMinutes => "60min",
        }
    }
}

impl fmt::Display for IntradayInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntradayInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1min" => Ok(IntradayInterval::OneMinute),
            "5min" => Ok(IntradayInterval::FiveMinutes),
            "15min" => Ok(IntradayInterval::FifteenMinutes),
            "30min" => Ok(IntradayInterval::ThirtyMinutes),
            "60min" => Ok(IntradayInterval::SixtyMinutes),
            other => Err(format!(
                "invalid intraday interval '{}': expected 1min, 5min, 15min, 30min or 60min",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_round_trips_through_its_token() {
        for token in ["1min", "5min", "15min", "30min", "60min"] {
            let interval: IntradayInterval = token.parse().unwrap();
            assert_eq!(interval.to_string(), token);
        }
    }

    #[test]
    fn test_unknown_interval_rejected() {
        assert!("2min".parse::<IntradayInterval>().is_err());
        assert!("".parse::<IntradayInterval>().is_err());
    }

    #[test]
    fn test_default_is_one_minute() {
        assert_eq!(IntradayInterval::default(), IntradayInterval::OneMinute);
    }
}
