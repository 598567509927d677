use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::{debug, warn};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(liveness))
        .route("/ready", get(readiness))
}

#[derive(Debug, Serialize)]
pub struct Readiness {
    pub storage: &'static str,
    pub exchanges: usize,
    pub instruments: usize,
}

async fn liveness() -> &'static str {
    "OK"
}

/// GET /health/ready
///
/// 503 while the catalog cannot be read.
async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<Readiness>) {
    let exchanges = state.catalog.list_exchanges().await;
    let instruments = state.catalog.list_instruments().await;

    match (exchanges, instruments) {
        (Ok(exchanges), Ok(instruments)) => {
            debug!(
                "GET /health/ready - {} exchanges, {} instruments",
                exchanges.len(),
                instruments.len()
            );
            (
                StatusCode::OK,
                Json(Readiness {
                    storage: "ok",
                    exchanges: exchanges.len(),
                    instruments: instruments.len(),
                }),
            )
        }
        (Err(e), _) | (_, Err(e)) => {
            warn!("GET /health/ready - catalog unavailable: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(Readiness {
                    storage: "unavailable",
                    exchanges: 0,
                    instruments: 0,
                }),
            )
        }
    }
}
