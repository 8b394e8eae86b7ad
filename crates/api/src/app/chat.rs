//! Proxy to the external natural-language query service.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

/// Upper bound on one upstream round trip.
pub const CHAT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ChatError {
    /// The upstream answered with a non-success status.
    #[error("upstream returned {status}")]
    Upstream { status: StatusCode, details: Value },

    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct ChatUpstream {
    base_url: String,
    client: reqwest::Client,
}

impl ChatUpstream {
    pub fn new(base_url: String) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(CHAT_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Forward `question` and return the upstream JSON verbatim.
    #[tracing::instrument(skip(self), fields(base_url = %self.base_url), err)]
    pub async fn ask(&self, question: &str) -> Result<Value, ChatError> {
        let response = self
            .client
            .post(format!("{}/api/ask", self.base_url))
            .json(&json!({ "question": question }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let details = serde_json::from_str(&body).unwrap_or(Value::Null);
            return Err(ChatError::Upstream { status, details });
        }

        Ok(response.json::<Value>().await?)
    }
}
