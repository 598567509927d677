use chrono::{NaiveDate, NaiveDateTime};
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use crate::models::{DailyBar, IntradayBar, NewDailyBar, NewIntradayBar};

// Each upsert is one statement, so a bar is either fully written or not at all.
// The unique constraint on the key decides insert vs overwrite; on overwrite the
// existing id survives and is returned.
pub async fn upsert_daily_bar(pool: &PgPool, bar: &NewDailyBar) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO daily_bars (id, instrument_id, date, open, high, low, close, adjusted_close, volume)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (instrument_id, date)
        DO UPDATE SET open = EXCLUDED.open,
                      high = EXCLUDED.high,
                      low = EXCLUDED.low,
                      close = EXCLUDED.close,
                      adjusted_close = EXCLUDED.adjusted_close,
                      volume = EXCLUDED.volume
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(bar.instrument_id)
    .bind(bar.date)
    .bind(bar.open)
    .bind(bar.high)
    .bind(bar.low)
    .bind(bar.close)
    .bind(bar.adjusted_close)
    .bind(bar.volume)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        error!(
            "Failed to upsert daily bar for instrument {} (date: {}): {}",
            bar.instrument_id, bar.date, e
        );
        e
    })
}

pub async fn upsert_intraday_bar(
    pool: &PgPool,
    bar: &NewIntradayBar,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO intraday_bars (id, instrument_id, timestamp, open, high, low, close, volume)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (instrument_id, timestamp)
        DO UPDATE SET open = EXCLUDED.open,
                      high = EXCLUDED.high,
                      low = EXCLUDED.low,
                      close = EXCLUDED.close,
                      volume = EXCLUDED.volume
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(bar.instrument_id)
    .bind(bar.timestamp)
    .bind(bar.open)
    .bind(bar.high)
    .bind(bar.low)
    .bind(bar.close)
    .bind(bar.volume)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        error!(
            "Failed to upsert intraday bar for instrument {} (timestamp: {}): {}",
            bar.instrument_id, bar.timestamp, e
        );
        e
    })
}

pub async fn fetch_daily(pool: &PgPool, instrument_id: Uuid) -> Result<Vec<DailyBar>, sqlx::Error> {
    sqlx::query_as::<_, DailyBar>(
        r#"
        SELECT id, instrument_id, date, open, high, low, close, adjusted_close, volume
        FROM daily_bars
        WHERE instrument_id = $1
        "#,
    )
    .bind(instrument_id)
    .fetch_all(pool)
    .await
}

pub async fn fetch_intraday(
    pool: &PgPool,
    instrument_id: Uuid,
) -> Result<Vec<IntradayBar>, sqlx::Error> {
    sqlx::query_as::<_, IntradayBar>(
        r#"
        SELECT id, instrument_id, timestamp, open, high, low, close, volume
        FROM intraday_bars
        WHERE instrument_id = $1
        "#,
    )
    .bind(instrument_id)
    .fetch_all(pool)
    .await
}

pub async fn fetch_daily_since(
    pool: &PgPool,
    instrument_id: Uuid,
    since: NaiveDate,
) -> Result<Vec<DailyBar>, sqlx::Error> {
    sqlx::query_as::<_, DailyBar>(
        r#"
        SELECT id, instrument_id, date, open, high, low, close, adjusted_close, volume
        FROM daily_bars
        WHERE instrument_id = $1 AND date >= $2
        "#,
    )
    .bind(instrument_id)
    .bind(since)
    .fetch_all(pool)
    .await
}

pub async fn fetch_intraday_since(
    pool: &PgPool,
    instrument_id: Uuid,
    since: NaiveDateTime,
) -> Result<Vec<IntradayBar>, sqlx::Error> {
    sqlx::query_as::<_, IntradayBar>(
        r#"
        SELECT id, instrument_id, timestamp, open, high, low, close, volume
        FROM intraday_bars
        WHERE instrument_id = $1 AND timestamp >= $2
        "#,
    )
    .bind(instrument_id)
    .bind(since)
    .fetch_all(pool)
    .await
}
