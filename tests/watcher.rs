// tests/watcher.rs
//
// State-machine properties of the polling controller:
// - single-flight guard (concurrent triggers dropped, not queued)
// - error preserves previously fetched rows
// - absent credential short-circuits without a source call
// - scheduler ticks on the interval and stops after abort

use std::sync::Arc;
use std::time::Duration;

use fubon_rate_monitor::extract::{ExtractError, StaticSource};
use fubon_rate_monitor::model::{ErrorKind, ExchangeRate, FetchStatus, RateUpdate};
use fubon_rate_monitor::watch::{spawn_scheduler, RateWatcher, RefreshOutcome};

fn sample_update() -> RateUpdate {
    RateUpdate {
        timestamp: "2025-06-01 15:30".into(),
        rates: vec![ExchangeRate {
            currency: "美金".into(),
            currency_code: "USD".into(),
            cash_buy: "31.0".into(),
            cash_sell: "31.6".into(),
            spot_buy: "31.3".into(),
            spot_sell: "31.4".into(),
        }],
        source_url: "https://example.invalid/rates".into(),
        citations: vec![],
    }
}

#[tokio::test]
async fn concurrent_trigger_while_loading_is_dropped() {
    let source = Arc::new(
        StaticSource::ok(sample_update()).with_delay(Duration::from_millis(50)),
    );
    let watcher = Arc::new(RateWatcher::new(source.clone()));

    let first = watcher.clone();
    let second = watcher.clone();
    let (a, b) = tokio::join!(first.refresh(), async move {
        // Let the first trigger take the in-flight slot.
        tokio::time::sleep(Duration::from_millis(10)).await;
        second.refresh().await
    });

    assert_eq!(a, RefreshOutcome::Completed);
    assert_eq!(b, RefreshOutcome::AlreadyRunning);
    assert_eq!(source.calls(), 1, "only one extraction call may start");
    assert_eq!(watcher.snapshot().status, FetchStatus::Success);
}

#[tokio::test]
async fn failed_fetch_keeps_previous_rows_visible() {
    let source = Arc::new(StaticSource::ok(sample_update()));
    source.push(Err(ExtractError::Transport("connection reset".into())));
    let watcher = RateWatcher::new(source);

    watcher.refresh().await;
    assert_eq!(watcher.snapshot().status, FetchStatus::Success);

    watcher.refresh().await;
    let snap = watcher.snapshot();
    assert_eq!(snap.status, FetchStatus::Error);
    let err = snap.error.expect("error info");
    assert_eq!(err.kind, ErrorKind::Transport);
    assert!(err.message.contains("connection reset"));

    // Documented policy: stale data stays for display.
    let data = snap.data.expect("stale data preserved");
    assert_eq!(data.rates.len(), 1);
    assert_eq!(data.rates[0].currency_code, "USD");
}

#[tokio::test]
async fn recovery_after_error_replaces_data_wholesale() {
    let source = Arc::new(StaticSource::new(Err(ExtractError::EmptyResponse)));
    let mut fresh = sample_update();
    fresh.timestamp = "2025-06-01 16:00".into();
    source.push(Ok(fresh));
    let watcher = RateWatcher::new(source);

    watcher.refresh().await;
    assert_eq!(watcher.snapshot().status, FetchStatus::Error);

    watcher.refresh().await;
    let snap = watcher.snapshot();
    assert_eq!(snap.status, FetchStatus::Success);
    assert!(snap.error.is_none(), "error cleared on success");
    assert_eq!(snap.data.expect("data").timestamp, "2025-06-01 16:00");
}

#[tokio::test]
async fn missing_credential_short_circuits_without_source_call() {
    let source = Arc::new(StaticSource::ok(sample_update()).without_credential());
    let watcher = RateWatcher::new(source.clone());

    let outcome = watcher.refresh().await;
    assert_eq!(outcome, RefreshOutcome::NoCredential);
    assert_eq!(source.calls(), 0, "no network call may be attempted");

    let snap = watcher.snapshot();
    assert_eq!(snap.status, FetchStatus::Error);
    assert_eq!(snap.error.expect("error info").kind, ErrorKind::MissingCredential);
    assert!(snap.data.is_none());
}

#[tokio::test(start_paused = true)]
async fn scheduler_fires_once_per_interval_and_stops_on_abort() {
    let source = Arc::new(StaticSource::ok(sample_update()));
    let watcher = Arc::new(RateWatcher::new(source.clone()));

    let handle = spawn_scheduler(watcher.clone(), 60);

    // Virtual clock: ticks at t=0, 60 and 120.
    tokio::time::sleep(Duration::from_secs(150)).await;
    assert_eq!(source.calls(), 3);

    handle.abort();
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(source.calls(), 3, "no further fetches after teardown");
    assert_eq!(watcher.snapshot().status, FetchStatus::Success);
}

#[tokio::test(start_paused = true)]
async fn zero_interval_runs_the_mount_fetch_only() {
    let source = Arc::new(StaticSource::ok(sample_update()));
    let watcher = Arc::new(RateWatcher::new(source.clone()));

    let handle = spawn_scheduler(watcher.clone(), 0);
    handle.await.expect("one-shot scheduler task");
    assert_eq!(source.calls(), 1);

    tokio::time::sleep(Duration::from_secs(3600)).await;
    assert_eq!(source.calls(), 1, "polling stays disabled");
    // Manual refresh still works.
    assert_eq!(watcher.refresh().await, RefreshOutcome::Completed);
    assert_eq!(source.calls(), 2);
}
