use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{CreateInstrument, DailyBar, Instrument};
use crate::services::{analytics_service, catalog_service};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_symbols).post(create_symbol))
        .route("/:id/prices", get(get_symbol_prices))
}

pub async fn list_symbols(
    State(state): State<AppState>,
) -> Result<Json<Vec<Instrument>>, AppError> {
    info!("GET /symbols - Listing symbols");
    let instruments = catalog_service::list_instruments(state.catalog.as_ref()).await?;
    Ok(Json(instruments))
}

pub async fn create_symbol(
    State(state): State<AppState>,
    Json(payload): Json<CreateInstrument>,
) -> Result<(StatusCode, Json<Instrument>), AppError> {
    info!("POST /symbols - Creating symbol {}", payload.ticker);
    let instrument = catalog_service::create_instrument(state.catalog.as_ref(), &payload)
        .await
        .map_err(|e| {
            error!("Failed to create symbol {}: {}", payload.ticker, e);
            e
        })?;
    Ok((StatusCode::CREATED, Json(instrument)))
}

pub async fn get_symbol_prices(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Vec<DailyBar>>, AppError> {
    info!("GET /symbols/{}/prices - Getting daily prices", id);
    let bars = analytics_service::daily_prices_for_instrument(
        state.catalog.as_ref(),
        state.prices.as_ref(),
        id,
    )
    .await?;
    Ok(Json(bars))
}
