mod common;

use std::sync::Arc;

use stockdb_backend::errors::AppError;
use stockdb_backend::external::price_provider::PriceProviderError;
use stockdb_backend::external::scripted::ScriptedPriceProvider;
use stockdb_backend::models::IntradayInterval;
use stockdb_backend::store::PriceStore;

use common::{daily_sample, date, engine, intraday_sample, seeded_store, timestamp, FlakyStore};

#[tokio::test]
async fn test_reingesting_same_batch_is_idempotent() {
    let (store, instruments) = seeded_store(&["AAPL"]).await;
    let provider = Arc::new(ScriptedPriceProvider::new());
    provider.set_daily(
        "AAPL",
        Ok(vec![
            daily_sample("2024-01-02", 185.64, 82_488_700),
            daily_sample("2024-01-03", 184.25, 58_414_500),
        ]),
    );
    let engine = engine(Arc::new(store.clone()), Arc::new(store.clone()), provider);

    assert_eq!(engine.fetch_and_store_daily("AAPL").await.unwrap(), 2);
    let mut first = store.list_daily(instruments[0].id).await.unwrap();
    first.sort_by_key(|b| b.date);

    assert_eq!(engine.fetch_and_store_daily("AAPL").await.unwrap(), 2);
    let mut second = store.list_daily(instruments[0].id).await.unwrap();
    second.sort_by_key(|b| b.date);

    assert_eq!(first, second);
    assert_eq!(second.len(), 2);
}

#[tokio::test]
async fn test_corrected_bar_keeps_its_id() {
    let (store, instruments) = seeded_store(&["IBM"]).await;
    let provider = Arc::new(ScriptedPriceProvider::new());
    provider.set_daily("IBM", Ok(vec![daily_sample("2024-01-02", 163.0, 1_000)]));
    let engine = engine(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        provider.clone(),
    );

    engine.fetch_and_store_daily("IBM").await.unwrap();
    let original = store.list_daily(instruments[0].id).await.unwrap();

    provider.set_daily("IBM", Ok(vec![daily_sample("2024-01-02", 161.5, 2_000)]));
    engine.fetch_and_store_daily("IBM").await.unwrap();
    let corrected = store.list_daily(instruments[0].id).await.unwrap();

    assert_eq!(corrected.len(), 1);
    assert_eq!(corrected[0].id, original[0].id);
    assert_eq!(corrected[0].close, 161.5);
    assert_eq!(corrected[0].volume, 2_000);
}

#[tokio::test]
async fn test_duplicate_keys_in_one_batch_leave_one_record() {
    let (store, instruments) = seeded_store(&["MSFT"]).await;
    let provider = Arc::new(ScriptedPriceProvider::new());
    provider.set_intraday(
        "MSFT",
        Ok(vec![
            intraday_sample("2024-01-02 09:30:00", 370.0, 100),
            intraday_sample("2024-01-02 09:30:00", 371.0, 150),
            intraday_sample("2024-01-02 09:31:00", 372.0, 120),
        ]),
    );
    let engine = engine(Arc::new(store.clone()), Arc::new(store.clone()), provider);

    let processed = engine
        .fetch_and_store_intraday("MSFT", IntradayInterval::OneMinute)
        .await
        .unwrap();
    assert_eq!(processed, 3);

    let bars = store.list_intraday(instruments[0].id).await.unwrap();
    assert_eq!(bars.len(), 2);
    let first = bars
        .iter()
        .find(|b| b.timestamp == timestamp("2024-01-02 09:30:00"))
        .unwrap();
    // last write wins
    assert_eq!(first.close, 371.0);
}

#[tokio::test]
async fn test_unknown_ticker_never_reaches_provider() {
    let (store, _) = seeded_store(&["AAPL"]).await;
    let provider = Arc::new(ScriptedPriceProvider::new());
    let engine = engine(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        provider.clone(),
    );

    let err = engine.fetch_and_store_daily("ZZZZ").await.unwrap_err();
    assert!(matches!(err, AppError::InstrumentNotFound(t) if t == "ZZZZ"));
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_provider_failure_reports_zero_and_stores_nothing() {
    let (store, instruments) = seeded_store(&["NFLX"]).await;
    let provider = Arc::new(ScriptedPriceProvider::new());
    provider.set_daily(
        "NFLX",
        Err(PriceProviderError::RateLimited),
    );
    let engine = engine(Arc::new(store.clone()), Arc::new(store.clone()), provider);

    assert_eq!(engine.fetch_and_store_daily("NFLX").await.unwrap(), 0);
    assert!(store.list_daily(instruments[0].id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_store_failure_aborts_rest_of_batch() {
    let (store, instruments) = seeded_store(&["META"]).await;
    let flaky = FlakyStore::new(store.clone(), instruments[0].id, 2);
    let provider = Arc::new(ScriptedPriceProvider::new());
    provider.set_daily(
        "META",
        Ok(vec![
            daily_sample("2024-01-02", 346.29, 10),
            daily_sample("2024-01-03", 344.47, 11),
            daily_sample("2024-01-04", 347.12, 12),
            daily_sample("2024-01-05", 351.95, 13),
        ]),
    );
    let engine = engine(Arc::new(store.clone()), Arc::new(flaky), provider);

    let err = engine.fetch_and_store_daily("META").await.unwrap_err();
    assert!(matches!(err, AppError::Store(_)));

    // bars written before the failure stay written
    let stored = store.list_daily(instruments[0].id).await.unwrap();
    let mut dates: Vec<_> = stored.iter().map(|b| b.date).collect();
    dates.sort();
    assert_eq!(dates, vec![date("2024-01-02"), date("2024-01-03")]);
}

#[tokio::test]
async fn test_intraday_uses_requested_interval() {
    let (store, _) = seeded_store(&["GOOGL"]).await;
    let provider = Arc::new(ScriptedPriceProvider::new());
    provider.set_intraday("GOOGL", Ok(vec![]));
    let engine = engine(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        provider.clone(),
    );

    let processed = engine
        .fetch_and_store_intraday("GOOGL", IntradayInterval::FiveMinutes)
        .await
        .unwrap();
    assert_eq!(processed, 0);
    assert_eq!(provider.calls(), vec!["intraday:GOOGL:5min".to_string()]);
}
