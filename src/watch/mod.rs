// src/watch/mod.rs
//! Polling controller: owns the fetch state machine and the single-flight
//! guard. Everything downstream (page, JSON API, export) reads value
//! snapshots taken here.

pub mod scheduler;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};

use crate::extract::DynRateSource;
use crate::model::{ErrorInfo, FetchStatus, RateUpdate, Snapshot};

pub use scheduler::spawn_scheduler;

/// What happened to a refresh trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A fetch ran to completion (success or error; see the snapshot).
    Completed,
    /// Another fetch was in flight; this trigger was dropped, not queued.
    AlreadyRunning,
    /// The credential is statically absent; no network call was attempted.
    NoCredential,
}

#[derive(Debug)]
struct WatchState {
    status: FetchStatus,
    data: Option<RateUpdate>,
    error: Option<ErrorInfo>,
    last_attempt: Option<DateTime<Utc>>,
}

pub struct RateWatcher {
    source: DynRateSource,
    state: RwLock<WatchState>,
    in_flight: AtomicBool,
}

impl RateWatcher {
    pub fn new(source: DynRateSource) -> Self {
        Self {
            source,
            state: RwLock::new(WatchState {
                status: FetchStatus::Idle,
                data: None,
                error: None,
                last_attempt: None,
            }),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Run one fetch cycle. Triggers while a fetch is in flight are dropped,
    /// so at most one extraction call is outstanding at any time and results
    /// are never applied out of order.
    pub async fn refresh(&self) -> RefreshOutcome {
        if !self.source.credential_present() {
            let mut st = self.state.write().expect("watch state poisoned");
            st.status = FetchStatus::Error;
            st.error = Some(ErrorInfo {
                message: crate::extract::ExtractError::MissingCredential.to_string(),
                kind: crate::model::ErrorKind::MissingCredential,
            });
            return RefreshOutcome::NoCredential;
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return RefreshOutcome::AlreadyRunning;
        }

        {
            let mut st = self.state.write().expect("watch state poisoned");
            st.status = FetchStatus::Loading;
            st.error = None;
        }
        counter!("rate_fetch_total").increment(1);

        let result = self.source.fetch_latest().await;
        let now = Utc::now();

        {
            let mut st = self.state.write().expect("watch state poisoned");
            st.last_attempt = Some(now);
            match result {
                Ok(update) => {
                    gauge!("rate_rows").set(update.rates.len() as f64);
                    gauge!("rate_last_refresh_ts").set(now.timestamp() as f64);
                    st.status = FetchStatus::Success;
                    st.error = None;
                    // Replaced wholesale; no incremental merge.
                    st.data = Some(update);
                }
                Err(e) => {
                    counter!("rate_fetch_errors_total").increment(1);
                    tracing::warn!(target: "watch", error = %e, provider = self.source.name(), "rate fetch failed");
                    st.status = FetchStatus::Error;
                    st.error = Some(ErrorInfo {
                        message: e.to_string(),
                        kind: e.kind(),
                    });
                    // Stale rows stay visible under the error banner.
                }
            }
        }

        self.in_flight.store(false, Ordering::SeqCst);
        RefreshOutcome::Completed
    }

    pub fn snapshot(&self) -> Snapshot {
        let st = self.state.read().expect("watch state poisoned");
        Snapshot {
            status: st.status,
            data: st.data.clone(),
            error: st.error.clone(),
            last_attempt: st.last_attempt,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.source.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ExtractError, StaticSource};
    use crate::model::ErrorKind;
    use std::sync::Arc;

    fn sample_update() -> RateUpdate {
        RateUpdate {
            timestamp: "2025-06-01 15:30".into(),
            rates: vec![crate::model::ExchangeRate {
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
    async fn initial_state_is_idle_and_empty() {
        let watcher = RateWatcher::new(Arc::new(StaticSource::ok(sample_update())));
        let snap = watcher.snapshot();
        assert_eq!(snap.status, FetchStatus::Idle);
        assert!(snap.data.is_none());
        assert!(snap.error.is_none());
        assert!(snap.last_attempt.is_none());
    }

    #[tokio::test]
    async fn success_stores_update_and_records_attempt() {
        let watcher = RateWatcher::new(Arc::new(StaticSource::ok(sample_update())));
        assert_eq!(watcher.refresh().await, RefreshOutcome::Completed);
        let snap = watcher.snapshot();
        assert_eq!(snap.status, FetchStatus::Success);
        assert_eq!(snap.data.expect("data").rates.len(), 1);
        assert!(snap.error.is_none());
        assert!(snap.last_attempt.is_some());
    }

    #[tokio::test]
    async fn failure_sets_error_with_kind() {
        let watcher = RateWatcher::new(Arc::new(StaticSource::failing(ExtractError::Quota(
            "out of tokens".into(),
        ))));
        watcher.refresh().await;
        let snap = watcher.snapshot();
        assert_eq!(snap.status, FetchStatus::Error);
        let err = snap.error.expect("error info");
        assert_eq!(err.kind, ErrorKind::Quota);
        assert!(err.message.contains("out of tokens"));
    }
}
