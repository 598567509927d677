use std::fmt;

use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::IntradayInterval;
use crate::services::job_scheduler_service::{JobContext, JobResult};

#[derive(Debug, Clone, Copy)]
enum SweepKind {
    Daily,
    Intraday(IntradayInterval),
}

impl fmt::Display for SweepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepKind::Daily => f.write_str("daily"),
            SweepKind::Intraday(interval) => write!(f, "intraday ({})", interval),
        }
    }
}

/// Fetch and merge daily bars for every tracked ticker.
pub async fn refresh_daily_prices(ctx: JobContext) -> Result<JobResult, AppError> {
    Ok(sweep(&ctx, SweepKind::Daily).await)
}

/// Fetch and merge intraday bars, at the configured sampling interval, for every tracked ticker.
pub async fn refresh_intraday_prices(ctx: JobContext) -> Result<JobResult, AppError> {
    let kind = SweepKind::Intraday(ctx.intraday_interval);
    Ok(sweep(&ctx, kind).await)
}

// Never returns early on a ticker's error: each ticker is isolated from the others.
async fn sweep(ctx: &JobContext, kind: SweepKind) -> JobResult {
    info!("Starting scheduled {} price fetch for {} tickers", kind, ctx.tickers.len());

    let mut result = JobResult::default();

    for ticker in ctx.tickers.iter() {
        if ctx.is_shutting_down() {
            warn!("Shutdown requested, stopping {} sweep before {}", kind, ticker);
            result.interrupted = true;
            break;
        }

        let outcome = match kind {
            SweepKind::Daily => ctx.ingestion.fetch_and_store_daily(ticker).await,
            SweepKind::Intraday(interval) => {
                ctx.ingestion.fetch_and_store_intraday(ticker, interval).await
            }
        };

        match outcome {
            Ok(0) => {
                warn!("No {} records fetched for {}", kind, ticker);
                result.items_processed += 1;
                result.items_empty += 1;
            }
            Ok(count) => {
                info!("Fetched {} {} records for {}", count, kind, ticker);
                result.items_processed += 1;
                result.bars_ingested += count;
            }
            Err(e) => {
                error!("Error fetching {} data for {}: {}", kind, ticker, e);
                result.items_failed += 1;
            }
        }
    }

    info!(
        "Completed scheduled {} price fetch ({} ok, {} empty, {} failed, {} bars)",
        kind, result.items_processed, result.items_empty, result.items_failed, result.bars_ingested
    );
    result
}
