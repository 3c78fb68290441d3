//! HTTP transport for the Proxmox VE REST API
//!
//! Sends requests to `<endpoint>/api2/json/<path>`, unwraps the `data`
//! envelope, and classifies failures into [`ErrorKind`]s.

use std::time::Duration;

use async_trait::async_trait;
use proxima_core::provider::{ErrorKind, ProviderError, ProviderResult};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};

use crate::client::{HttpMethod, Transport};
use crate::provider::PveConfig;

/// reqwest-backed [`Transport`]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport from provider configuration
    pub fn new(config: &PveConfig) -> ProviderResult<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("PVEAPIToken={}", config.api_token))
            .map_err(|e| ProviderError::invalid_config(format!("Invalid API token: {}", e)))?;
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.insecure)
            .default_headers(headers)
            .build()
            .map_err(|e| {
                ProviderError::invalid_config(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: api_base_url(&config.endpoint),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn api_base_url(endpoint: &str) -> String {
    format!("{}/api2/json", endpoint.trim_end_matches('/'))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> ProviderResult<serde_json::Value> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        log::debug!("{} {}", method, url);

        let mut request = match method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };

        if let Some(body) = body {
            request = match method {
                HttpMethod::Get | HttpMethod::Delete => request.query(&query_pairs(body)),
                HttpMethod::Post | HttpMethod::Put => request.json(body),
            };
        }

        let response = request.send().await.map_err(|e| {
            let message = format!("{} {} failed: {}", method, path, e);
            ProviderError::transport(message).with_cause(e)
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            let message = format!("Failed to read response of {} {}: {}", method, path, e);
            ProviderError::transport(message).with_cause(e)
        })?;

        if !status.is_success() {
            let err = classify_failure(status, &text);
            log::debug!("{} {} -> {} ({})", method, path, status, err.kind);
            return Err(err);
        }

        decode_envelope(&text)
    }
}

/// Flatten a JSON object into query parameters
fn query_pairs(body: &serde_json::Value) -> Vec<(String, String)> {
    let Some(object) = body.as_object() else {
        return Vec::new();
    };

    object
        .iter()
        .filter_map(|(key, value)| {
            let value = match value {
                serde_json::Value::Null => return None,
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), value))
        })
        .collect()
}

/// Unwrap `{"data": ...}`
fn decode_envelope(text: &str) -> ProviderResult<serde_json::Value> {
    if text.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }

    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| ProviderError::decode(format!("Failed to decode response: {}", e)))?;

    Ok(match value {
        serde_json::Value::Object(mut object) => object
            .remove("data")
            .unwrap_or(serde_json::Value::Null),
        other => other,
    })
}

/// Build a classified error from a non-success response
fn classify_failure(status: StatusCode, text: &str) -> ProviderError {
    let message = failure_message(text);
    let kind = if status == StatusCode::NOT_FOUND || is_not_found_message(&message) {
        ErrorKind::NotFound
    } else {
        ErrorKind::Api
    };

    ProviderError::new(
        kind,
        format!(
            "received an HTTP {} response - Reason: {}",
            status.as_u16(),
            message
        ),
    )
}

/// Extract the remote's explanation from an error body
fn failure_message(text: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
        return text.trim().to_string();
    };

    let mut parts = Vec::new();
    if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
        parts.push(message.trim().to_string());
    }
    if let Some(errors) = value.get("errors").and_then(|e| e.as_object()) {
        let mut fields: Vec<_> = errors.iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        for (field, err) in fields {
            let err = err.as_str().map(str::to_string).unwrap_or_else(|| err.to_string());
            parts.push(format!("{}: {}", field, err.trim()));
        }
    }

    if parts.is_empty() {
        text.trim().to_string()
    } else {
        parts.join("; ")
    }
}

/// The remote reports some missing entities with a 500 and English wording
/// ("no such alias 'x'", "IP '10.0.0.5' does not exist ..."). This match is
/// the only place that wording is relied upon.
fn is_not_found_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("no such alias")
        || (lower.starts_with("ip '") && lower.contains("does not exist"))
}
