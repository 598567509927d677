pub mod analytics_service;
pub mod catalog_service;
pub mod ingestion_service;
pub mod job_scheduler_service;
pub mod rate_limiter;
