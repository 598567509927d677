use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::{DailyBar, IntradayBar, NewDailyBar, RefreshSummary};
use crate::services::analytics_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/prices", post(add_price))
        .route("/daily/:ticker", get(get_daily_since))
        .route("/daily/:ticker/refresh", post(refresh_daily))
        .route("/intraday/:ticker", get(get_intraday_since))
        .route("/intraday/:ticker/refresh", post(refresh_intraday))
}

#[derive(Debug, Deserialize)]
pub struct SinceParams {
    pub since: String,
}

pub fn parse_since_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::Validation(format!("Invalid since date '{}': expected yyyy-MM-dd", raw))
    })
}

pub fn parse_since_date_time(raw: &str) -> Result<NaiveDateTime, AppError> {
    let raw_trimmed = raw.trim();
    NaiveDateTime::parse_from_str(raw_trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw_trimmed, "%Y-%m-%dT%H:%M"))
        .map_err(|_| {
            AppError::Validation(format!(
                "Invalid since date-time '{}': expected yyyy-MM-ddTHH:mm:ss",
                raw
            ))
        })
}

/// POST /api/prices
///
/// Stores one daily bar. Goes through the same upsert as ingestion, so posting
/// a bar for an existing (instrument, date) overwrites it.
pub async fn add_price(
    State(state): State<AppState>,
    Json(payload): Json<NewDailyBar>,
) -> Result<(StatusCode, Json<DailyBar>), AppError> {
    info!(
        "POST /prices - Storing daily bar for {} on {}",
        payload.instrument_id, payload.date
    );
    payload.validate()?;

    if state.catalog.get_instrument(payload.instrument_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Instrument {} not found",
            payload.instrument_id
        )));
    }

    let id = state.prices.upsert_daily(&payload).await.map_err(|e| {
        error!("Failed to store daily bar for {}: {}", payload.instrument_id, e);
        AppError::from(e)
    })?;
    Ok((StatusCode::CREATED, Json(payload.into_bar(id))))
}

/// GET /api/daily/:ticker?since=yyyy-MM-dd
pub async fn get_daily_since(
    Path(ticker): Path<String>,
    Query(params): Query<SinceParams>,
    State(state): State<AppState>,
) -> Result<Json<Vec<DailyBar>>, AppError> {
    info!("GET /daily/{}?since={} - Getting daily prices", ticker, params.since);
    let since = parse_since_date(&params.since)?;
    let bars = analytics_service::daily_since(
        state.catalog.as_ref(),
        state.prices.as_ref(),
        &ticker,
        since,
    )
    .await?;
    Ok(Json(bars))
}

/// GET /api/intraday/:ticker?since=yyyy-MM-ddTHH:mm:ss
pub async fn get_intraday_since(
    Path(ticker): Path<String>,
    Query(params): Query<SinceParams>,
    State(state): State<AppState>,
) -> Result<Json<Vec<IntradayBar>>, AppError> {
    info!("GET /intraday/{}?since={} - Getting intraday prices", ticker, params.since);
    let since = parse_since_date_time(&params.since)?;
    let bars = analytics_service::intraday_since(
        state.catalog.as_ref(),
        state.prices.as_ref(),
        &ticker,
        since,
    )
    .await?;
    Ok(Json(bars))
}

pub async fn refresh_daily(
    Path(ticker): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<RefreshSummary>, AppError> {
    info!("POST /daily/{}/refresh - Fetching daily prices from provider", ticker);
    let processed = state
        .ingestion
        .fetch_and_store_daily(&ticker)
        .await
        .map_err(|e| {
            warn!("Daily refresh failed for {}: {}", ticker, e);
            e
        })?;
    Ok(Json(RefreshSummary {
        ticker,
        kind: "daily".to_string(),
        processed,
    }))
}

pub async fn refresh_intraday(
    Path(ticker): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<RefreshSummary>, AppError> {
    info!(
        "POST /intraday/{}/refresh - Fetching {} intraday prices from provider",
        ticker, state.intraday_interval
    );
    let processed = state
        .ingestion
        .fetch_and_store_intraday(&ticker, state.intraday_interval)
        .await
        .map_err(|e| {
            warn!("Intraday refresh failed for {}: {}", ticker, e);
            e
        })?;
    Ok(Json(RefreshSummary {
        ticker,
        kind: format!("intraday ({})", state.intraday_interval),
        processed,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_since_date_accepts_iso_local_date() {
        assert_eq!(
            parse_since_date("2024-01-03").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()
        );
        assert!(parse_since_date("03/01/2024").is_err());
        assert!(parse_since_date("2024-13-01").is_err());
    }

    #[test]
    fn test_since_date_time_accepts_iso_local_date_time() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 3)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(parse_since_date_time("2024-01-03T09:30:00").unwrap(), expected);
        assert_eq!(parse_since_date_time("2024-01-03T09:30").unwrap(), expected);
        assert!(parse_since_date_time("2024-01-03 09:30:00").is_err());
        assert!(parse_since_date_time("yesterday").is_err());
    }
}
