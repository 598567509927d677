pub mod catalog_queries;
pub mod price_queries;
