// src/extract/mod.rs
//! Extraction client: provider abstraction over the remote completion
//! service that reads the bank's public rate page for us.

pub mod gemini;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{ErrorKind, RateUpdate};

pub use gemini::GeminiSource;

/// Extraction failure taxonomy. A malformed payload inside an otherwise
/// healthy response is NOT an error; it degrades to an empty rate list.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("未偵測到有效的 API Key。請確保環境變數已正確設定。")]
    MissingCredential,
    #[error("provider quota exhausted: {0}")]
    Quota(String),
    #[error("provider error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("network error: {0}")]
    Transport(String),
    #[error("provider returned no text")]
    EmptyResponse,
}

impl ExtractError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractError::MissingCredential => ErrorKind::MissingCredential,
            ExtractError::Quota(_) => ErrorKind::Quota,
            ExtractError::Api { .. } => ErrorKind::Api,
            ExtractError::Transport(_) => ErrorKind::Transport,
            ExtractError::EmptyResponse => ErrorKind::EmptyResponse,
        }
    }
}

/// Trait object used by the watcher (and tests).
#[async_trait]
pub trait RateSource: Send + Sync {
    /// One extraction round trip: instruction out, validated table back.
    async fn fetch_latest(&self) -> Result<RateUpdate, ExtractError>;
    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
    /// Whether the static credential is configured. The watcher checks this
    /// before spending a network call.
    fn credential_present(&self) -> bool {
        true
    }
}

/// Convenient alias used by callers.
pub type DynRateSource = Arc<dyn RateSource>;

/// Scripted source for tests and local runs: replies are served in order,
/// the last one repeating forever. Counts invocations so tests can assert
/// the single-flight guard.
pub struct StaticSource {
    replies: Mutex<VecDeque<Result<RateUpdate, ExtractError>>>,
    calls: AtomicUsize,
    credential: bool,
    delay: Option<Duration>,
}

impl StaticSource {
    pub fn new(reply: Result<RateUpdate, ExtractError>) -> Self {
        Self {
            replies: Mutex::new(VecDeque::from([reply])),
            calls: AtomicUsize::new(0),
            credential: true,
            delay: None,
        }
    }

    pub fn ok(update: RateUpdate) -> Self {
        Self::new(Ok(update))
    }

    pub fn failing(err: ExtractError) -> Self {
        Self::new(Err(err))
    }

    /// Queue a further reply after the ones already scripted.
    pub fn push(&self, reply: Result<RateUpdate, ExtractError>) {
        self.replies.lock().expect("replies poisoned").push_back(reply);
    }

    pub fn without_credential(mut self) -> Self {
        self.credential = false;
        self
    }

    /// Hold each fetch open for `delay`, so tests can overlap triggers.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> Result<RateUpdate, ExtractError> {
        let mut q = self.replies.lock().expect("replies poisoned");
        if q.len() > 1 {
            q.pop_front().expect("non-empty queue")
        } else {
            q.front().cloned().unwrap_or(Err(ExtractError::EmptyResponse))
        }
    }
}

#[async_trait]
impl RateSource for StaticSource {
    async fn fetch_latest(&self) -> Result<RateUpdate, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        self.next_reply()
    }

    fn name(&self) -> &'static str {
        "static"
    }

    fn credential_present(&self) -> bool {
        self.credential
    }
}
