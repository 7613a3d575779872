// src/extract/gemini.rs
//! Gemini provider: web-search-grounded `generateContent` call with a
//! response-schema constraint, decoded into a [`RateUpdate`].

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::AppConfig;
use crate::extract::{ExtractError, RateSource};
use crate::model::{Citation, ExchangeRate, RateUpdate};

const GENERATE_URL_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiSource {
    http: reqwest::Client,
    api_key: String,
    model: String,
    rate_page_url: String,
}

impl GeminiSource {
    pub fn from_config(cfg: &AppConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("fubon-rate-monitor/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            rate_page_url: cfg.rate_page_url.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{GENERATE_URL_BASE}/{}:generateContent", self.model)
    }

    fn instruction(&self) -> String {
        format!(
            "請幫我抓取富邦銀行最新匯率資訊。\n\
             網址：{}\n\n\
             我需要每個幣別的以下資訊：\n\
             1. 幣別 (例如: 美金, 日圓)\n\
             2. 幣別代碼 (例如: USD, JPY)\n\
             3. 現鈔買入匯率\n\
             4. 現鈔賣出匯率\n\
             5. 即期買入匯率\n\
             6. 即期賣出匯率\n\n\
             沒有報價的欄位請填 \"-\"，不要留空。請確保數據是最新的。",
            self.rate_page_url
        )
    }
}

/// Machine-checkable output shape: `{ timestamp, rates: [...] }`, every
/// field required.
fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "timestamp": { "type": "STRING", "description": "數據更新時間" },
            "rates": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "currency": { "type": "STRING" },
                        "currencyCode": { "type": "STRING" },
                        "cashBuy": { "type": "STRING" },
                        "cashSell": { "type": "STRING" },
                        "spotBuy": { "type": "STRING" },
                        "spotSell": { "type": "STRING" }
                    },
                    "required": ["currency", "currencyCode", "cashBuy", "cashSell", "spotBuy", "spotSell"]
                }
            }
        },
        "required": ["timestamp", "rates"]
    })
}

// ---- Wire types -------------------------------------------------------

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    tools: Vec<Value>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
    #[serde(rename = "responseSchema")]
    response_schema: Value,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "groundingMetadata")]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Deserialize)]
struct TextPart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct GroundingMetadata {
    #[serde(rename = "groundingChunks", default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize)]
struct GroundingChunk {
    web: Option<WebSource>,
}

#[derive(Deserialize)]
struct WebSource {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(default)]
    status: String,
}

/// The JSON the model is constrained to emit.
#[derive(Deserialize, Default)]
struct RatePayload {
    timestamp: Option<String>,
    #[serde(default)]
    rates: Vec<ExchangeRate>,
}

// ---- Decoding helpers -------------------------------------------------

/// Decode the schema-constrained text. Shape mismatch is a degrade, not a
/// failure: garbage in, empty table out. Tolerates stray text around the
/// JSON object (models occasionally wrap it in a code fence).
fn parse_rate_payload(text: &str) -> RatePayload {
    if let Ok(p) = serde_json::from_str::<RatePayload>(text) {
        return p;
    }
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            if let Ok(p) = serde_json::from_str::<RatePayload>(&text[start..=end]) {
                return p;
            }
        }
    }
    RatePayload::default()
}

/// Citation metadata passes through unmodified; chunks without a usable URI
/// are dropped.
fn collect_citations(candidate: &Candidate) -> Vec<Citation> {
    let Some(meta) = &candidate.grounding_metadata else {
        return Vec::new();
    };
    meta.grounding_chunks
        .iter()
        .filter_map(|chunk| {
            let web = chunk.web.as_ref()?;
            let uri = web.uri.as_deref()?.trim();
            if uri.is_empty() {
                return None;
            }
            Some(Citation {
                title: web.title.clone().filter(|t| !t.trim().is_empty()),
                uri: uri.to_string(),
            })
        })
        .collect()
}

fn candidate_text(candidate: &Candidate) -> String {
    let Some(content) = &candidate.content else {
        return String::new();
    };
    content
        .parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect::<Vec<_>>()
        .join("")
}

#[async_trait]
impl RateSource for GeminiSource {
    async fn fetch_latest(&self) -> Result<RateUpdate, ExtractError> {
        if self.api_key.is_empty() {
            return Err(ExtractError::MissingCredential);
        }

        let instruction = self.instruction();
        let req = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: &instruction }],
            }],
            tools: vec![json!({ "google_search": {} })],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: response_schema(),
            },
        };

        let resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| ExtractError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|env| env.error.message)
                .unwrap_or(body);
            if status.as_u16() == 429 || message.contains("RESOURCE_EXHAUSTED") {
                return Err(ExtractError::Quota(message));
            }
            return Err(ExtractError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| ExtractError::Transport(format!("decoding response: {e}")))?;

        let Some(candidate) = body.candidates.first() else {
            return Err(ExtractError::EmptyResponse);
        };
        let text = candidate_text(candidate);
        if text.trim().is_empty() {
            return Err(ExtractError::EmptyResponse);
        }

        let payload = parse_rate_payload(&text);
        let mut rates = payload.rates;
        for r in &mut rates {
            r.normalize();
        }

        Ok(RateUpdate {
            timestamp: payload.timestamp.unwrap_or_else(|| {
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
            }),
            rates,
            source_url: self.rate_page_url.clone(),
            citations: collect_citations(candidate),
        })
    }

    fn name(&self) -> &'static str {
        "gemini"
    }

    fn credential_present(&self) -> bool {
        !self.api_key.is_empty()
    }
}
