use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{CreateExchange, CreateInstrument, Exchange, Instrument};

pub async fn fetch_exchanges(pool: &PgPool) -> Result<Vec<Exchange>, sqlx::Error> {
    sqlx::query_as::<_, Exchange>(
        "SELECT id, mic, name, currency, timezone, created_at FROM exchanges ORDER BY created_at ASC",
    )
    .fetch_all(pool)
    .await
}

pub async fn fetch_exchange(pool: &PgPool, id: Uuid) -> Result<Option<Exchange>, sqlx::Error> {
    sqlx::query_as::<_, Exchange>(
        "SELECT id, mic, name, currency, timezone, created_at FROM exchanges WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_exchange_by_mic(
    pool: &PgPool,
    mic: &str,
) -> Result<Option<Exchange>, sqlx::Error> {
    sqlx::query_as::<_, Exchange>(
        "SELECT id, mic, name, currency, timezone, created_at FROM exchanges WHERE mic = $1",
    )
    .bind(mic)
    .fetch_optional(pool)
    .await
}

pub async fn insert_exchange(
    pool: &PgPool,
    new: &CreateExchange,
) -> Result<Exchange, sqlx::Error> {
    sqlx::query_as::<_, Exchange>(
        r#"
        INSERT INTO exchanges (id, mic, name, currency, timezone)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, mic, name, currency, timezone, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&new.mic)
    .bind(&new.name)
    .bind(&new.currency)
    .bind(&new.timezone)
    .fetch_one(pool)
    .await
}

pub async fn fetch_instruments(pool: &PgPool) -> Result<Vec<Instrument>, sqlx::Error> {
    sqlx::query_as::<_, Instrument>(
        "SELECT id, exchange_id, ticker, name, kind, created_at FROM instruments ORDER BY created_at ASC",
    )
    .fetch_all(pool)
    .await
}

pub async fn fetch_instruments_by_exchange(
    pool: &PgPool,
    exchange_id: Uuid,
) -> Result<Vec<Instrument>, sqlx::Error> {
    sqlx::query_as::<_, Instrument>(
        r#"
        SELECT id, exchange_id, ticker, name, kind, created_at
        FROM instruments
        WHERE exchange_id = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(exchange_id)
    .fetch_all(pool)
    .await
}

pub async fn fetch_instrument(pool: &PgPool, id: Uuid) -> Result<Option<Instrument>, sqlx::Error> {
    sqlx::query_as::<_, Instrument>(
        "SELECT id, exchange_id, ticker, name, kind, created_at FROM instruments WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_instrument_by_ticker(
    pool: &PgPool,
    ticker: &str,
) -> Result<Option<Instrument>, sqlx::Error> {
    sqlx::query_as::<_, Instrument>(
        r#"
        SELECT id, exchange_id, ticker, name, kind, created_at
        FROM instruments
        WHERE ticker = $1
        ORDER BY created_at ASC
        LIMIT 1
        "#,
    )
    .bind(ticker)
    .fetch_optional(pool)
    .await
}

pub async fn insert_instrument(
    pool: &PgPool,
    new: &CreateInstrument,
) -> Result<Instrument, sqlx::Error> {
    sqlx::query_as::<_, Instrument>(
        r#"
        INSERT INTO instruments (id, exchange_id, ticker, name, kind)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, exchange_id, ticker, name, kind, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.exchange_id)
    .bind(&new.ticker)
    .bind(&new.name)
    .bind(&new.kind)
    .fetch_one(pool)
    .await
}
