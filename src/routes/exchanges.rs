use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{CreateExchange, Exchange, Instrument};
use crate::services::catalog_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_exchanges).post(create_exchange))
        .route("/:id/symbols", get(list_exchange_symbols))
}

pub async fn list_exchanges(
    State(state): State<AppState>,
) -> Result<Json<Vec<Exchange>>, AppError> {
    info!("GET /exchanges - Listing exchanges");
    let exchanges = catalog_service::list_exchanges(state.catalog.as_ref()).await?;
    Ok(Json(exchanges))
}

pub async fn create_exchange(
    State(state): State<AppState>,
    Json(payload): Json<CreateExchange>,
) -> Result<(StatusCode, Json<Exchange>), AppError> {
    info!("POST /exchanges - Creating exchange {}", payload.mic);
    let exchange = catalog_service::create_exchange(state.catalog.as_ref(), &payload)
        .await
        .map_err(|e| {
            error!("Failed to create exchange {}: {}", payload.mic, e);
            e
        })?;
    Ok((StatusCode::CREATED, Json(exchange)))
}

pub async fn list_exchange_symbols(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Instrument>>, AppError> {
    info!("GET /exchanges/{}/symbols - Listing symbols", id);
    let instruments =
        catalog_service::list_instruments_by_exchange(state.catalog.as_ref(), id).await?;
    Ok(Json(instruments))
}
