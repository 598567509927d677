use serde::{Deserialize, Serialize};

// Result of a simple moving average query. `average` is None when fewer
// than `window` daily bars are stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovingAverage {
    pub ticker: String,
    pub window: usize,
    pub average: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefreshSummary {
    pub ticker: String,
    pub kind: String,
    pub processed: usize,
}
