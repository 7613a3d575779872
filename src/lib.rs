// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod config;
pub mod export;
pub mod extract;
pub mod metrics;
pub mod model;
pub mod view;
pub mod watch;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::extract::{DynRateSource, ExtractError, GeminiSource, RateSource, StaticSource};
pub use crate::model::{ExchangeRate, FetchStatus, RateUpdate, Snapshot};
pub use crate::watch::{spawn_scheduler, RateWatcher, RefreshOutcome};
