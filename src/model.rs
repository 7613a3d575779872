// src/model.rs
// Shared data shapes for one extracted rate table and the fetch lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the published rate table. Rate fields stay display strings:
/// the bank prints "-" for rates it does not quote, and we pass that through.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExchangeRate {
    /// e.g. "美金"
    pub currency: String,
    /// e.g. "USD"
    #[serde(rename = "currencyCode")]
    pub currency_code: String,
    #[serde(rename = "cashBuy")]
    pub cash_buy: String,
    #[serde(rename = "cashSell")]
    pub cash_sell: String,
    #[serde(rename = "spotBuy")]
    pub spot_buy: String,
    #[serde(rename = "spotSell")]
    pub spot_sell: String,
}

impl ExchangeRate {
    /// Invariant: all four rate fields are non-empty; blank means "-".
    pub fn normalize(&mut self) {
        for field in [
            &mut self.cash_buy,
            &mut self.cash_sell,
            &mut self.spot_buy,
            &mut self.spot_sell,
        ] {
            let trimmed = field.trim();
            *field = if trimmed.is_empty() {
                "-".to_string()
            } else {
                trimmed.to_string()
            };
        }
        self.currency = self.currency.trim().to_string();
        self.currency_code = self.currency_code.trim().to_string();
    }
}

/// Citation attached by the extraction provider (grounding metadata).
/// Entries without a usable URI are dropped before they reach this type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Citation {
    pub title: Option<String>,
    pub uri: String,
}

/// One complete extraction result. Built fresh per successful fetch,
/// immutable afterwards, replaced wholesale by the next success.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateUpdate {
    /// Announcement time as reported by the source (display string).
    pub timestamp: String,
    pub rates: Vec<ExchangeRate>,
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
}

/// Fetch lifecycle as seen by the UI.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FetchStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Machine-readable error taxonomy; the page styles quota exhaustion
/// differently from the rest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingCredential,
    Quota,
    Api,
    Transport,
    EmptyResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorInfo {
    pub message: String,
    pub kind: ErrorKind,
}

/// Value snapshot handed to the HTTP layer. Always a clone of the watcher's
/// state, never a live reference.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub status: FetchStatus,
    pub data: Option<RateUpdate>,
    pub error: Option<ErrorInfo>,
    pub last_attempt: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_fills_blank_rates_with_dash() {
        let mut r = ExchangeRate {
            currency: " 日圓 ".into(),
            currency_code: "JPY".into(),
            cash_buy: "0.2008".into(),
            cash_sell: "  ".into(),
            spot_buy: "".into(),
            spot_sell: "0.2095".into(),
        };
        r.normalize();
        assert_eq!(r.currency, "日圓");
        assert_eq!(r.cash_buy, "0.2008");
        assert_eq!(r.cash_sell, "-");
        assert_eq!(r.spot_buy, "-");
        assert_eq!(r.spot_sell, "0.2095");
    }

    #[test]
    fn rate_row_uses_camel_case_wire_names() {
        let json = r#"{
            "currency": "美金",
            "currencyCode": "USD",
            "cashBuy": "31.0",
            "cashSell": "31.6",
            "spotBuy": "31.3",
            "spotSell": "31.4"
        }"#;
        let r: ExchangeRate = serde_json::from_str(json).expect("parse row");
        assert_eq!(r.currency_code, "USD");
        assert_eq!(r.spot_sell, "31.4");
    }
}
