//! Client for the remote text-summarization provider.
//!
//! Failures never propagate: every error is logged and reported as "no summary".

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::errors::AppError;

/// Request body sent to the summarization endpoint.
#[derive(Debug, Serialize)]
struct SummaryRequest<'a> {
    output_sentences: u32,
    providers: [&'a str; 1],
    text: &'a str,
    language: &'a str,
}

/// Per-provider entry of the response.
#[derive(Debug, Deserialize)]
struct ProviderResult {
    result: String,
    #[serde(default)]
    status: Option<String>,
}

/// Summarization client bound to one endpoint and provider.
#[derive(Debug, Clone)]
pub struct Summarizer {
    client: reqwest::Client,
    endpoint: String,
    provider: String,
    api_key: Option<String>,
}

impl Summarizer {
    pub fn new(
        endpoint: impl Into<String>,
        provider: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            provider: provider.into(),
            api_key,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            config.summary_url.clone(),
            config.summary_provider.clone(),
            config.summary_api_key.clone(),
            config.summary_timeout,
        )
    }

    /// Summarize `text` in one sentence, `None` when no summary is available.
    pub async fn summarize(&self, text: &str) -> Option<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!("No summarization API key configured; skipping summary");
            return None;
        };

        match self.request(api_key, text).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!("Error fetching summary: {}", e);
                None
            }
        }
    }

    async fn request(&self, api_key: &str, text: &str) -> Result<Option<String>, reqwest::Error> {
        let body = SummaryRequest {
            output_sentences: 1,
            providers: [self.provider.as_str()],
            text,
            language: "en",
        };

        let mut response: HashMap<String, serde_json::Value> = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(entry) = response.remove(&self.provider) else {
            tracing::warn!("Summary response has no entry for provider {}", self.provider);
            return Ok(None);
        };

        match serde_json::from_value::<ProviderResult>(entry) {
            Ok(entry) if entry.result.is_empty() => {
                tracing::warn!(
                    "Provider {} returned an empty summary (status {:?})",
                    self.provider,
                    entry.status
                );
                Ok(None)
            }
            Ok(entry) => Ok(Some(entry.result)),
            Err(e) => {
                tracing::warn!("Malformed summary entry from {}: {}", self.provider, e);
                Ok(None)
            }
        }
    }
}
