// src/config.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

pub const DEFAULT_CONFIG_PATH: &str = "config/watch.json";

/// Public rate page the extraction prompt points at.
pub const DEFAULT_RATE_PAGE_URL: &str =
    "https://www.fubon.com/banking/personal/deposit/exchange_rate/exchange_rate_tw.htm?page=ex_rate_tab0";

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}
fn default_poll_interval_secs() -> u64 {
    300
}
fn default_model() -> String {
    "gemini-3-flash-preview".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_rate_page_url() -> String {
    DEFAULT_RATE_PAGE_URL.to_string()
}
fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Seconds between automatic fetches. 0 disables the timer entirely
    /// (manual refresh still works).
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_model")]
    pub model: String,
    /// "ENV" means: read from GEMINI_API_KEY at load time.
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_rate_page_url")]
    pub rate_page_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            poll_interval_secs: default_poll_interval_secs(),
            model: default_model(),
            api_key: default_api_key(),
            rate_page_url: default_rate_page_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl AppConfig {
    /// Load from a JSON file; a missing file yields defaults. The key is
    /// resolved in either case, so callers always see the final value.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let mut cfg: AppConfig = match fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data)?,
            Err(_) => AppConfig::default(),
        };

        // Resolve api key if "ENV". An absent variable becomes the empty
        // string: boot still succeeds and the watcher reports the missing
        // credential instead.
        if cfg.api_key.trim().eq_ignore_ascii_case("env") {
            cfg.api_key = env::var("GEMINI_API_KEY").unwrap_or_default();
        }

        // Sanitize
        if cfg.request_timeout_secs == 0 {
            cfg.request_timeout_secs = default_request_timeout_secs();
        }
        if cfg.bind.trim().is_empty() {
            cfg.bind = default_bind();
        }

        Ok(cfg)
    }
}
