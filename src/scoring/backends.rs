//! External scoring backends: one uniform capability, `call(text) -> score | error`.
//!
//! Concrete vendors are thin HTTP clients; their payload shapes live here and nowhere
//! else. Callers only see [`ScoringBackend`] and [`BackendError`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use super::Category;
use crate::config::{BackendConfig, CategoryConfig};

/// Why a backend call produced no usable score. Never surfaced past the category level.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("vendor returned status {0}")]
    Status(u16),
    #[error("response has no usable `{0}` field")]
    Decode(&'static str),
    #[error("score {0} outside [0,1]")]
    OutOfRange(f64),
    #[error("api key not configured")]
    MissingKey,
    #[error("backend task aborted: {0}")]
    Aborted(String),
}

/// Anything that can score a text for one category.
#[async_trait]
pub trait ScoringBackend: Send + Sync {
    /// Raw score; callers validate the range.
    async fn call(&self, text: &str) -> Result<f64, BackendError>;
    /// Stable identifier used as the sample source.
    fn name(&self) -> &str;
}

pub type DynBackend = Arc<dyn ScoringBackend>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    GptZero,
    Turnitin,
    CopyLeaks,
    Originality,
    Grammarly,
}

impl Vendor {
    pub const ALL: [Vendor; 5] = [
        Vendor::GptZero,
        Vendor::Turnitin,
        Vendor::CopyLeaks,
        Vendor::Originality,
        Vendor::Grammarly,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Vendor::GptZero => "gptzero",
            Vendor::Turnitin => "turnitin",
            Vendor::CopyLeaks => "copyleaks",
            Vendor::Originality => "originality",
            Vendor::Grammarly => "grammarly",
        }
    }

    /// Environment variable holding this vendor's credential.
    pub fn env_key(self) -> &'static str {
        match self {
            Vendor::GptZero => "GPTZERO_API_KEY",
            Vendor::Turnitin => "TURNITIN_API_KEY",
            Vendor::CopyLeaks => "COPYLEAKS_API_KEY",
            Vendor::Originality => "ORIGINALITY_API_KEY",
            Vendor::Grammarly => "GRAMMARLY_API_KEY",
        }
    }

    /// Endpoint for `category`, or `None` when the vendor has no such product.
    pub fn default_url(self, category: Category) -> Option<&'static str> {
        match (self, category) {
            (Vendor::GptZero, Category::Detection) => Some("https://api.gptzero.me/v2/predict"),
            (Vendor::Turnitin, Category::Detection) => {
                Some("https://api.turnitin.com/api/v1/authenticity")
            }
            (Vendor::CopyLeaks, Category::Detection) => {
                Some("https://api.copyleaks.com/v3/businesses/ai-detection")
            }
            (Vendor::Originality, Category::Detection) => {
                Some("https://api.originality.ai/api/v1/scan/ai")
            }
            (Vendor::CopyLeaks, Category::Plagiarism) => {
                Some("https://api.copyleaks.com/v3/businesses/plagiarism")
            }
            (Vendor::Turnitin, Category::Plagiarism) => {
                Some("https://api.turnitin.com/api/v1/similarity")
            }
            (Vendor::Grammarly, Category::Plagiarism) => {
                Some("https://api.grammarly.com/v1/plagiarism")
            }
            _ => None,
        }
    }

    /// Vendors consulted for `category` when the config names none explicitly.
    pub fn defaults_for(category: Category) -> &'static [Vendor] {
        match category {
            Category::Detection => &[
                Vendor::GptZero,
                Vendor::Turnitin,
                Vendor::CopyLeaks,
                Vendor::Originality,
            ],
            Category::Plagiarism => &[Vendor::CopyLeaks, Vendor::Turnitin, Vendor::Grammarly],
        }
    }

    fn request_body(self, category: Category, text: &str) -> Value {
        match (self, category) {
            (Vendor::GptZero, _) => json!({ "document": text, "version": "2024-01-15" }),
            (Vendor::Turnitin, Category::Detection) => json!({ "text": text, "language": "en" }),
            (Vendor::Turnitin, Category::Plagiarism) => {
                json!({ "text": text, "language": "en", "scan_type": "similarity" })
            }
            (Vendor::CopyLeaks, Category::Detection) => {
                json!({ "text": text, "properties": { "aiDetection": true } })
            }
            (Vendor::CopyLeaks, Category::Plagiarism) => json!({
                "text": text,
                "properties": {
                    "scanning": { "internet": true, "repositories": true, "crossLanguage": true }
                }
            }),
            (Vendor::Originality, _) => json!({ "content": text, "title": "AI Detection Check" }),
            (Vendor::Grammarly, _) => json!({ "text": text, "check_type": "plagiarism" }),
        }
    }

    /// JSON pointer to the score and the divisor turning it into `[0,1]`.
    fn score_field(self, category: Category) -> (&'static str, f64) {
        match (self, category) {
            (Vendor::GptZero, _) => ("/documents/0/completely_generated_prob", 1.0),
            (Vendor::Turnitin, Category::Detection) => ("/ai_similarity", 1.0),
            (Vendor::Turnitin, Category::Plagiarism) => ("/similarity", 100.0),
            (Vendor::CopyLeaks, Category::Detection) => ("/aiDetection/probability", 1.0),
            (Vendor::CopyLeaks, Category::Plagiarism) => ("/results/plagiarism", 100.0),
            (Vendor::Originality, _) => ("/ai_score", 1.0),
            (Vendor::Grammarly, _) => ("/plagiarism_score", 1.0),
        }
    }

    /// Pull the normalized score out of a vendor response.
    pub fn extract_score(self, category: Category, body: &Value) -> Result<f64, BackendError> {
        let (pointer, divisor) = self.score_field(category);
        body.pointer(pointer)
            .and_then(Value::as_f64)
            .map(|raw| raw / divisor)
            .ok_or(BackendError::Decode(pointer))
    }
}

/// A vendor endpoint reached over HTTPS with a bearer-style credential.
pub struct HttpBackend {
    vendor: Vendor,
    category: Category,
    http: reqwest::Client,
    api_key: String,
    url: String,
    name: String,
}

impl HttpBackend {
    pub fn new(
        vendor: Vendor,
        category: Category,
        api_key: String,
        url: String,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("text-humanizer/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5).min(timeout))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            vendor,
            category,
            http,
            api_key,
            url,
            name: format!("{}:{}", vendor.as_str(), category.as_str()),
        })
    }

    pub fn vendor(&self) -> Vendor {
        self.vendor
    }
}

#[async_trait]
impl ScoringBackend for HttpBackend {
    async fn call(&self, text: &str) -> Result<f64, BackendError> {
        if self.api_key.is_empty() {
            return Err(BackendError::MissingKey);
        }

        let req = self.http.post(&self.url).json(&self.vendor.request_body(self.category, text));
        // GPTZero takes its key in a custom header; everybody else uses bearer auth.
        let req = match self.vendor {
            Vendor::GptZero => req.header("X-API-KEY", &self.api_key),
            _ => req.bearer_auth(&self.api_key),
        };

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }
        let body: Value = resp.json().await?;
        self.vendor.extract_score(self.category, &body)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Build the configured backends for one category. Misconfigured entries are skipped
/// with a warning rather than failing the whole engine.
pub fn build_backends(category: Category, cfg: &CategoryConfig) -> Vec<DynBackend> {
    let timeout = cfg.timeout();
    let mut out: Vec<DynBackend> = Vec::with_capacity(cfg.backends.len());
    for BackendConfig {
        vendor,
        api_key,
        url,
    } in &cfg.backends
    {
        let Some(url) = url
            .clone()
            .or_else(|| vendor.default_url(category).map(str::to_string))
        else {
            tracing::warn!(
                target: "scoring",
                vendor = vendor.as_str(),
                category = category.as_str(),
                "vendor has no endpoint for this category; skipped"
            );
            continue;
        };
        if api_key.trim().is_empty() {
            tracing::warn!(
                target: "scoring",
                vendor = vendor.as_str(),
                category = category.as_str(),
                "empty api key; backend skipped"
            );
            continue;
        }
        match HttpBackend::new(*vendor, category, api_key.clone(), url, timeout) {
            Ok(b) => out.push(Arc::new(b)),
            Err(e) => tracing::warn!(
                target: "scoring",
                error = %e,
                vendor = vendor.as_str(),
                "could not build http client; backend skipped"
            ),
        }
    }
    out
}
