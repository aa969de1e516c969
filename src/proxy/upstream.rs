//! The single path by which requests reach the Figma API.
//!
//! Handles URL construction, auth header injection, body encoding, the
//! request timeout and response decoding. Both the executor and the page
//! extractor go through [`UpstreamClient::send`].

use super::types::RequestMethod;
use crate::config::Config;
use crate::error::TransportError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde_json::Value;
use std::{collections::HashMap, str::FromStr, time::Duration};

/// Header carrying the personal access token on every upstream call.
pub const AUTH_HEADER: &str = "X-Figma-Token";

/// Raw upstream reply, whatever its status.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub data: Value,
}

impl UpstreamReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: String,
    timeout_ms: u64,
}

impl UpstreamClient {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| TransportError::from_reqwest(e, timeout_ms))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_ms,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        Self::new(config.api_base.clone(), config.request_timeout_ms)
    }

    /// Sends one request upstream and waits for its terminal response or timeout.
    pub async fn send(
        &self,
        method: RequestMethod,
        endpoint: &str,
        headers: &HashMap<String, String>,
        body: Option<&Value>,
        auth_token: &str,
    ) -> Result<UpstreamReply, TransportError> {
        let url = url::Url::parse(&format!("{}{}", self.base_url, endpoint))
            .map_err(|e| TransportError::Request(format!("Invalid URL: {}", e)))?;

        let mut request = self
            .client
            .request(method.upstream(), url)
            .headers(build_headers(headers, auth_token)?);

        if method.carries_body() {
            if let Some(payload) = encode_body(body)? {
                request = request.json(&payload);
            }
        } else if body.is_some() {
            tracing::debug!(method = %method, "Ignoring body for non-mutating method");
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, self.timeout_ms))?;

        let status = response.status().as_u16();
        let response_headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();

        let is_json = response_headers
            .get(CONTENT_TYPE.as_str())
            .map_or(false, |ct| ct.starts_with("application/json"));

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(e, self.timeout_ms))?;

        Ok(UpstreamReply {
            status,
            headers: response_headers,
            data: decode_body(&bytes, is_json),
        })
    }
}

/// Drops any caller-supplied token so it never reaches storage.
pub fn redact_auth(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .iter()
        .filter(|(k, _)| !k.eq_ignore_ascii_case(AUTH_HEADER))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Caller headers first, then the auth header, which replaces any caller
/// value regardless of case.
fn build_headers(
    headers: &HashMap<String, String>,
    auth_token: &str,
) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::new();

    for (key, value) in headers {
        match (HeaderName::from_str(key), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => tracing::warn!(header = %key, "Skipping invalid header"),
        }
    }

    let token = HeaderValue::from_str(auth_token)
        .map_err(|_| TransportError::Request("Access token is not a valid header value".into()))?;
    map.insert(HeaderName::from_static("x-figma-token"), token);

    Ok(map)
}

/// A string body is raw JSON text; blank text or null means no body.
fn encode_body(body: Option<&Value>) -> Result<Option<Value>, TransportError> {
    match body {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) if raw.trim().is_empty() => Ok(None),
        Some(Value::String(raw)) => Ok(Some(serde_json::from_str(raw)?)),
        Some(other) => Ok(Some(other.clone())),
    }
}

fn decode_body(bytes: &[u8], is_json: bool) -> Value {
    if is_json {
        if let Ok(value) = serde_json::from_slice(bytes) {
            return value;
        }
    }
    Value::String(String::from_utf8_lossy(bytes).to_string())
}
