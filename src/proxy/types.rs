use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::headers::{coerce_object, resolve};
use crate::error::ValidationError;

/// Method label for executions, saved requests and history.
///
/// `Page` is not an HTTP verb: it marks the first-page extraction, which
/// always goes upstream as GET. Deserialization accepts any case, like
/// [`FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestMethod {
    Get,
    Post,
    Put,
    Delete,
    Page,
}

impl RequestMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Delete => "DELETE",
            RequestMethod::Page => "PAGE",
        }
    }

    /// The verb actually sent upstream.
    pub fn upstream(&self) -> reqwest::Method {
        match self {
            RequestMethod::Get | RequestMethod::Page => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Put => reqwest::Method::PUT,
            RequestMethod::Delete => reqwest::Method::DELETE,
        }
    }

    /// Whether a request body is forwarded for this method.
    pub fn carries_body(&self) -> bool {
        matches!(self, RequestMethod::Post | RequestMethod::Put)
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Ok(RequestMethod::Get),
            "POST" => Ok(RequestMethod::Post),
            "PUT" => Ok(RequestMethod::Put),
            "DELETE" => Ok(RequestMethod::Delete),
            "PAGE" => Ok(RequestMethod::Page),
            other => Err(other.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for RequestMethod {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(|bad: String| {
            serde::de::Error::custom(ValidationError::UnsupportedMethod(bad))
        })
    }
}

/// Headers as submitted by the frontend: either a JSON object or free text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HeaderInput {
    Map(Map<String, Value>),
    Text(String),
}

impl Default for HeaderInput {
    fn default() -> Self {
        HeaderInput::Map(Map::new())
    }
}

impl HeaderInput {
    pub fn into_map(self) -> HashMap<String, String> {
        match self {
            HeaderInput::Map(map) => coerce_object(map),
            HeaderInput::Text(raw) => resolve(&raw),
        }
    }
}

impl From<HashMap<String, String>> for HeaderInput {
    fn from(headers: HashMap<String, String>) -> Self {
        HeaderInput::Map(
            headers
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect(),
        )
    }
}

/// Incoming proxy request from the frontend
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyRequest {
    pub method: String,
    pub endpoint: String,
    #[serde(default)]
    pub headers: HeaderInput,
    /// JSON payload. A string is treated as raw JSON text.
    #[serde(default)]
    pub body: Option<Value>,
}

/// Incoming page-only request. The method is always GET upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct PageRequest {
    pub endpoint: String,
    #[serde(default)]
    pub headers: HeaderInput,
}

/// A validated request, ready to go upstream.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: RequestMethod,
    pub endpoint: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
}

impl RequestSpec {
    /// Raw request body text as recorded in history.
    pub fn body_text(&self) -> Option<String> {
        match &self.body {
            None | Some(Value::Null) => None,
            Some(Value::String(raw)) if raw.trim().is_empty() => None,
            Some(Value::String(raw)) => Some(raw.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

/// Uniform result of every proxied execution.
///
/// Upstream non-2xx statuses are successful envelopes; only local failures
/// set `error`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProxyResponse {
    pub error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProxyResponse {
    pub fn success(status_code: u16, data: Value, headers: HashMap<String, String>) -> Self {
        Self {
            error: false,
            status_code: Some(status_code),
            data: Some(data),
            headers: Some(headers),
            code: None,
            message: None,
        }
    }

    pub fn error(message: String, code: String) -> Self {
        Self {
            error: true,
            status_code: None,
            data: None,
            headers: None,
            code: Some(code),
            message: Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_goes_upstream_as_get() {
        assert_eq!(RequestMethod::Page.upstream(), reqwest::Method::GET);
        assert!(!RequestMethod::Page.carries_body());
        assert!(RequestMethod::Put.carries_body());
    }

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("post".parse::<RequestMethod>(), Ok(RequestMethod::Post));
        assert_eq!("PATCH".parse::<RequestMethod>(), Err("PATCH".to_string()));
    }

    #[test]
    fn method_deserializes_in_any_case() {
        let method: RequestMethod = serde_json::from_value(json!(" get ")).unwrap();
        assert_eq!(method, RequestMethod::Get);
        assert_eq!(serde_json::to_value(method).unwrap(), json!("GET"));

        let err = serde_json::from_value::<RequestMethod>(json!("patch")).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported HTTP method: PATCH");
    }

    #[test]
    fn headers_accept_object_or_text() {
        let req: ProxyRequest = serde_json::from_value(json!({
            "method": "GET",
            "endpoint": "/me",
            "headers": {"Accept": "application/json", "X-Depth": 2}
        }))
        .unwrap();
        let headers = req.headers.into_map();
        assert_eq!(headers["Accept"], "application/json");
        assert_eq!(headers["X-Depth"], "2");

        let req: ProxyRequest = serde_json::from_value(json!({
            "method": "GET",
            "endpoint": "/me",
            "headers": "Accept: text/plain"
        }))
        .unwrap();
        assert_eq!(req.headers.into_map()["Accept"], "text/plain");
    }

    #[test]
    fn missing_headers_default_to_empty() {
        let req: PageRequest = serde_json::from_value(json!({"endpoint": "/files/abc"})).unwrap();
        assert!(req.headers.into_map().is_empty());
    }

    #[test]
    fn error_envelope_omits_success_fields() {
        let value = serde_json::to_value(ProxyResponse::error(
            "boom".to_string(),
            "REQUEST_FAILED".to_string(),
        ))
        .unwrap();
        assert_eq!(value, json!({"error": true, "code": "REQUEST_FAILED", "message": "boom"}));
    }

    #[test]
    fn blank_string_body_is_not_recorded() {
        let spec = RequestSpec {
            method: RequestMethod::Post,
            endpoint: "/files/abc/comments".to_string(),
            headers: HashMap::new(),
            body: Some(json!("  ")),
        };
        assert_eq!(spec.body_text(), None);
    }
}
