use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Pre-flight rejections. No upstream call is made and nothing is recorded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No Figma access token is configured")]
    MissingCredential,

    #[error("Endpoint is required")]
    MissingEndpoint,

    #[error("Endpoint contains an unresolved placeholder: {0}")]
    UnresolvedPlaceholder(String),

    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("Endpoint must be in format /files/<file_key>: {0}")]
    NotAFileEndpoint(String),
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingCredential => "MISSING_CREDENTIAL",
            ValidationError::MissingEndpoint => "MISSING_ENDPOINT",
            ValidationError::UnresolvedPlaceholder(_) => "UNRESOLVED_PLACEHOLDER",
            ValidationError::UnsupportedMethod(_) => "UNSUPPORTED_METHOD",
            ValidationError::NotAFileEndpoint(_) => "NOT_A_FILE_ENDPOINT",
        }
    }
}

/// Local failures while talking to the upstream API.
///
/// These never escape an execution: they are folded into an error envelope.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Invalid JSON body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("Failed to read response body: {0}")]
    BodyRead(String),

    #[error("Request failed: {0}")]
    Request(String),
}

impl TransportError {
    pub fn code(&self) -> &'static str {
        match self {
            TransportError::Timeout(_) => "TIMEOUT",
            TransportError::Connect(_) => "CONNECTION_FAILED",
            TransportError::InvalidBody(_) => "INVALID_BODY",
            TransportError::BodyRead(_) => "BODY_READ_ERROR",
            TransportError::Request(_) => "REQUEST_FAILED",
        }
    }

    /// Classifies a reqwest failure, keeping the deepest source in the message.
    pub fn from_reqwest(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(timeout_ms)
        } else if err.is_connect() {
            TransportError::Connect(describe(&err))
        } else if err.is_body() || err.is_decode() {
            TransportError::BodyRead(describe(&err))
        } else {
            TransportError::Request(describe(&err))
        }
    }
}

fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut root = err.source();
    let mut deepest = None;
    while let Some(source) = root {
        deepest = Some(source);
        root = source.source();
    }
    if let Some(source) = deepest {
        let detail = source.to_string();
        if !message.contains(&detail) {
            message = format!("{}: {}", message, detail);
        }
    }
    message
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Name must not be empty")]
    EmptyName,

    #[error("Request not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database lock poisoned")]
    Poisoned,

    #[error("Store task failed: {0}")]
    Task(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{}", .0.body_text())]
    InvalidJson(#[from] JsonRejection),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            AppError::Validation(e) => (StatusCode::BAD_REQUEST, e.code()),
            AppError::Store(StoreError::EmptyName) => (StatusCode::BAD_REQUEST, "EMPTY_NAME"),
            AppError::Store(StoreError::NotFound(_)) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::InvalidJson(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST_BODY"),
        };

        if status.is_server_error() {
            tracing::error!(code = error_code, error = %self, "Request handling failed");
        }

        let body = Json(json!({
            "success": false,
            "error": {
                "message": self.to_string(),
                "code": error_code,
            }
        }));

        (status, body).into_response()
    }
}
