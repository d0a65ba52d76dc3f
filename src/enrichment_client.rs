//! Enrichment Client — injected collaborator for the two enrichment blocks.
//!
//! DESIGN
//! ======
//! Provider-neutral trait (the same shape as an injected LLM client
//! trait), with a single concrete implementation, `SixtyfourClient`, grounded in
//! `original_source/backend/sixtyfour_client.py`: lead enrichment is
//! submit-async-then-poll, email discovery is a single synchronous POST.
//! The core never inspects the HTTP shape directly — it only sees
//! `Result<EnrichmentData, UpstreamError>`.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;

const SIXTYFOUR_BASE_URL: &str = "https://api.sixtyfour.ai";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const DEFAULT_MAX_WAIT_SECS: u64 = 600;
const FIND_EMAIL_TIMEOUT_SECS: u64 = 900;

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum UpstreamError {
    #[error("missing API key: env var {var} not set")]
    MissingApiKey { var: String },

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("upstream returned status {status}: {body}")]
    Response { status: u16, body: String },

    #[error("job timed out after {0}s")]
    Timeout(u64),
}

impl crate::error::ErrorCode for UpstreamError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingApiKey { .. } => "E_MISSING_API_KEY",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::Request(_) => "E_REQUEST",
            Self::Response { .. } => "E_RESPONSE",
            Self::Timeout(_) => "E_TIMEOUT",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Response { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// DATA
// =============================================================================

/// A lead's known fields. Each is optional: only present, non-missing
/// cells are forwarded to the upstream.
#[derive(Debug, Clone, Default)]
pub struct LeadInfo {
    pub name: Option<String>,
    pub company: Option<String>,
    pub linkedin: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
}

/// Arbitrary success payload. The core extracts all keys except
/// `success`/`error` into `enriched_*` columns, so the shape is
/// deliberately unconstrained here.
pub type EnrichmentData = serde_json::Map<String, Value>;

// =============================================================================
// TRAIT
// =============================================================================

/// Provider-neutral async trait for the remote enrichment service.
/// Enables mocking in tests.
#[async_trait::async_trait]
pub trait EnrichmentClient: Send + Sync {
    async fn enrich_lead(
        &self,
        lead: &LeadInfo,
        struct_fields: Option<&BTreeMap<String, String>>,
    ) -> Result<EnrichmentData, UpstreamError>;

    async fn find_email(&self, lead: &LeadInfo, mode: &str) -> Result<EnrichmentData, UpstreamError>;
}

// =============================================================================
// SIXTYFOUR CLIENT
// =============================================================================

pub struct SixtyfourClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    poll_interval: Duration,
    max_wait: Duration,
}

impl SixtyfourClient {
    /// Build a client from `SIXTYFOUR_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns an error if the env var is missing or the HTTP client
    /// fails to build.
    pub fn from_env() -> Result<Self, UpstreamError> {
        let api_key = std::env::var("SIXTYFOUR_API_KEY")
            .map_err(|_| UpstreamError::MissingApiKey { var: "SIXTYFOUR_API_KEY".into() })?;
        Self::new(api_key)
    }

    pub fn new(api_key: String) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(FIND_EMAIL_TIMEOUT_SECS))
            .build()
            .map_err(|e| UpstreamError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            api_key,
            base_url: SIXTYFOUR_BASE_URL.to_string(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_wait: Duration::from_secs(DEFAULT_MAX_WAIT_SECS),
        })
    }

    fn lead_info_json(lead: &LeadInfo) -> Value {
        let mut map = serde_json::Map::new();
        if let Some(name) = &lead.name {
            map.insert("name".into(), Value::String(name.clone()));
        }
        if let Some(company) = &lead.company {
            map.insert("company".into(), Value::String(company.clone()));
        }
        if let Some(linkedin) = &lead.linkedin {
            map.insert("linkedin".into(), Value::String(linkedin.clone()));
        }
        if let Some(email) = &lead.email {
            map.insert("email".into(), Value::String(email.clone()));
        }
        if let Some(location) = &lead.location {
            map.insert("location".into(), Value::String(location.clone()));
        }
        Value::Object(map)
    }

    async fn submit_enrich_job(
        &self,
        lead: &LeadInfo,
        struct_fields: Option<&BTreeMap<String, String>>,
    ) -> Result<String, UpstreamError> {
        let mut body = serde_json::Map::new();
        body.insert("lead_info".into(), Self::lead_info_json(lead));
        if let Some(fields) = struct_fields {
            body.insert("struct".into(), serde_json::to_value(fields).unwrap_or(Value::Null));
        }

        let response = self
            .http
            .post(format!("{}/enrich-lead-async", self.base_url))
            .header("x-api-key", &self.api_key)
            .json(&Value::Object(body))
            .send()
            .await
            .map_err(|e| UpstreamError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| UpstreamError::Request(e.to_string()))?;
        if status != 200 {
            return Err(UpstreamError::Response { status, body: text });
        }

        let parsed: Value = serde_json::from_str(&text).map_err(|e| UpstreamError::Request(e.to_string()))?;
        let task_id = parsed
            .get("task_id")
            .or_else(|| parsed.get("id"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(task_id)
    }

    async fn poll_job(&self, task_id: &str) -> Result<EnrichmentData, UpstreamError> {
        let mut elapsed = Duration::ZERO;
        loop {
            let response = self
                .http
                .get(format!("{}/job-status/{task_id}", self.base_url))
                .header("x-api-key", &self.api_key)
                .send()
                .await
                .map_err(|e| UpstreamError::Request(e.to_string()))?;

            let status_code = response.status().as_u16();
            let text = response.text().await.map_err(|e| UpstreamError::Request(e.to_string()))?;
            if status_code != 200 {
                return Err(UpstreamError::Response { status: status_code, body: text });
            }

            let parsed: Value = serde_json::from_str(&text).map_err(|e| UpstreamError::Request(e.to_string()))?;
            let job_status = parsed.get("status").and_then(Value::as_str).unwrap_or_default().to_lowercase();

            match job_status.as_str() {
                "completed" | "complete" | "done" | "success" => {
                    let result = parsed.get("result").or_else(|| parsed.get("data")).cloned().unwrap_or(parsed);
                    return Ok(result.as_object().cloned().unwrap_or_default());
                }
                "failed" | "error" => {
                    let detail = parsed.get("error").and_then(Value::as_str).unwrap_or("job failed").to_string();
                    return Err(UpstreamError::Response { status: status_code, body: detail });
                }
                _ => {}
            }

            if elapsed >= self.max_wait {
                return Err(UpstreamError::Timeout(self.max_wait.as_secs()));
            }
            tokio::time::sleep(self.poll_interval).await;
            elapsed += self.poll_interval;
        }
    }
}

/// Stand-in used when `SIXTYFOUR_API_KEY` is absent at startup: the
/// server still boots, and the enrichment blocks fail with a clear
/// config error only if a workflow actually reaches them.
pub struct UnconfiguredClient;

#[async_trait::async_trait]
impl EnrichmentClient for UnconfiguredClient {
    async fn enrich_lead(
        &self,
        _lead: &LeadInfo,
        _struct_fields: Option<&BTreeMap<String, String>>,
    ) -> Result<EnrichmentData, UpstreamError> {
        Err(UpstreamError::MissingApiKey { var: "SIXTYFOUR_API_KEY".into() })
    }

    async fn find_email(&self, _lead: &LeadInfo, _mode: &str) -> Result<EnrichmentData, UpstreamError> {
        Err(UpstreamError::MissingApiKey { var: "SIXTYFOUR_API_KEY".into() })
    }
}


#[async_trait::async_trait]
impl EnrichmentClient for SixtyfourClient {
    async fn enrich_lead(
        &self,
        lead: &LeadInfo,
        struct_fields: Option<&BTreeMap<String, String>>,
    ) -> Result<EnrichmentData, UpstreamError> {
        let task_id = self.submit_enrich_job(lead, struct_fields).await?;
        self.poll_job(&task_id).await
    }

    async fn find_email(&self, lead: &LeadInfo, mode: &str) -> Result<EnrichmentData, UpstreamError> {
        let mut body = serde_json::Map::new();
        body.insert("lead".into(), Self::lead_info_json(lead));
        body.insert("mode".into(), Value::String(mode.to_string()));

        let response = self
            .http
            .post(format!("{}/find-email", self.base_url))
            .header("x-api-key", &self.api_key)
            .json(&Value::Object(body))
            .send()
            .await
            .map_err(|e| UpstreamError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| UpstreamError::Request(e.to_string()))?;
        if status != 200 {
            return Err(UpstreamError::Response { status, body: text });
        }

        let parsed: Value = serde_json::from_str(&text).map_err(|e| UpstreamError::Request(e.to_string()))?;
        Ok(parsed.as_object().cloned().unwrap_or_default())
    }
}

#[cfg(test)]
#[path = "enrichment_client_test.rs"]
mod tests;
