use http::header::{InvalidHeaderValue, CONTENT_TYPE};
use http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::routes::{analytics, exchanges, health, prices, symbols};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    let api = Router::<AppState>::new()
        .nest("/exchanges", exchanges::router())
        .nest("/symbols", symbols::router())
        .nest("/analytics", analytics::router())
        .merge(prices::router());

    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api", api)
        .with_state(state)
}

/// CORS policy for the dashboard front-end.
pub fn cors_layer(allowed_origin: &str) -> Result<CorsLayer, InvalidHeaderValue> {
    let origin = HeaderValue::from_str(allowed_origin)?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]))
}
