pub mod analytics;
pub mod exchanges;
pub mod health;
pub mod prices;
pub mod symbols;
