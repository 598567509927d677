use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::MovingAverage;
use crate::services::analytics_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/:ticker/sma", get(get_simple_moving_average))
}

#[derive(Debug, Deserialize)]
pub struct SmaParams {
    pub window: usize,
}

/// GET /api/analytics/:ticker/sma?window=N
///
/// `average` is null when fewer than N daily bars are stored.
pub async fn get_simple_moving_average(
    Path(ticker): Path<String>,
    Query(params): Query<SmaParams>,
    State(state): State<AppState>,
) -> Result<Json<MovingAverage>, AppError> {
    info!("GET /analytics/{}/sma?window={}", ticker, params.window);
    let sma = analytics_service::simple_moving_average(
        state.catalog.as_ref(),
        state.prices.as_ref(),
        &ticker,
        params.window,
    )
    .await?;
    Ok(Json(sma))
}
