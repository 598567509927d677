//! Background Jobs Module
//!
//! Periodic sweeps that pull bars from the price provider for every tracked
//! ticker. They are registered with the job scheduler service and executed on
//! fixed intervals.
//!
//! # Available Jobs
//!
//! - `price_refresh_job::refresh_daily_prices` - daily bars, every 12 hours by default
//! - `price_refresh_job::refresh_intraday_prices` - intraday bars, every 20 minutes by default
//!
//! # Job Architecture
//!
//! A sweep visits tickers in configuration order, one at a time. Provider calls
//! are paced by the shared rate limiter. A failing ticker is logged and counted,
//! and the sweep moves on to the next one. Sweeps are idempotent since every bar
//! is upserted by key.

pub mod price_refresh_job;
