use std::sync::Arc;

use crate::services::ingestion_service::IngestionEngine;
use crate::store::{Catalog, PriceStore};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn Catalog>,
    pub prices: Arc<dyn PriceStore>,
    pub ingestion: IngestionEngine,
    pub intraday_interval: crate::models::IntradayInterval,
}
