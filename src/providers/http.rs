//! Blocking JSON transport shared by the provider clients

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::ApiKey;

/// Longest error body echoed back to the user
const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] ureq::Error),
    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Sends one request per call; failures are reported, never retried
#[derive(Debug, Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
    api_key: Option<ApiKey>,
}

impl HttpClient {
    #[inline]
    pub fn new(timeout: Duration, api_key: Option<ApiKey>) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self { agent, api_key }
    }

    #[inline]
    pub fn get(&self, url: &Url) -> Result<String, HttpError> {
        debug!("GET {}", url);

        let mut request = self.agent.get(url.as_str());
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key.expose()));
        }

        let response = request.call()?;
        read_response(response)
    }

    #[inline]
    pub fn post_json<T: Serialize>(&self, url: &Url, body: &T) -> Result<String, HttpError> {
        let body = serde_json::to_string(body)?;
        debug!("POST {} ({} bytes)", url, body.len());

        let mut request = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key.expose()));
        }

        let response = request.send(&body)?;
        read_response(response)
    }
}

fn read_response(mut response: ureq::http::Response<ureq::Body>) -> Result<String, HttpError> {
    let status = response.status();
    let text = response.body_mut().read_to_string()?;

    if status.is_success() {
        return Ok(text);
    }

    let message = error_message(&text);
    warn!("Request failed with status {}: {}", status.as_u16(), message);
    Err(HttpError::Status {
        status: status.as_u16(),
        message,
    })
}

/// Pull a readable message out of an error body.
///
/// Understands `{"error": "..."}` and `{"error": {"message": "..."}}`.
#[inline]
pub fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let from_json = parsed.as_ref().and_then(|value| {
        let error = value.get("error")?;
        error
            .as_str()
            .or_else(|| error.get("message").and_then(serde_json::Value::as_str))
            .map(str::to_string)
    });

    from_json.unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            "empty response body".to_string()
        } else {
            trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect()
        }
    })
}
