// src/watch/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::watch::RateWatcher;

/// Spawn the automatic refresh loop. The first tick fires immediately (the
/// "on mount" fetch), then once per `interval_secs`. An interval of 0 runs
/// the initial fetch only and leaves further refreshes to the user.
///
/// Teardown is aborting the returned handle; an aborted task cannot touch
/// the watcher afterwards.
pub fn spawn_scheduler(watcher: Arc<RateWatcher>, interval_secs: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        if interval_secs == 0 {
            let outcome = watcher.refresh().await;
            tracing::info!(target: "watch", ?outcome, "one-shot refresh (polling disabled)");
            return;
        }

        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            ticker.tick().await;
            let outcome = watcher.refresh().await;
            let snap = watcher.snapshot();
            tracing::info!(
                target: "watch",
                ?outcome,
                status = ?snap.status,
                rows = snap.data.as_ref().map(|d| d.rates.len()).unwrap_or(0),
                "rate refresh tick"
            );
        }
    })
}
