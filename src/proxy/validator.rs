//! Pre-flight request validation.
//!
//! Every check here is terminal: a rejected request never reaches the
//! upstream API and is not recorded in history.

use super::types::{PageRequest, ProxyRequest, RequestMethod, RequestSpec};
use crate::error::ValidationError;

/// Path prefix of the file-fetch endpoint used by the page operation.
pub const FILE_ENDPOINT_PREFIX: &str = "/files/";

/// Validates a proxied request and resolves its headers.
pub fn validate(
    request: ProxyRequest,
    auth_token: Option<&str>,
) -> Result<RequestSpec, ValidationError> {
    let endpoint = check_target(&request.endpoint, auth_token)?;

    let method = match request.method.parse::<RequestMethod>() {
        Ok(RequestMethod::Page) | Err(_) => {
            return Err(ValidationError::UnsupportedMethod(request.method))
        }
        Ok(method) => method,
    };

    Ok(RequestSpec {
        method,
        endpoint,
        headers: request.headers.into_map(),
        body: request.body,
    })
}

/// Validates a page-only request. The endpoint must be a file endpoint.
pub fn validate_page(
    request: PageRequest,
    auth_token: Option<&str>,
) -> Result<RequestSpec, ValidationError> {
    let endpoint = check_target(&request.endpoint, auth_token)?;

    if !endpoint.starts_with(FILE_ENDPOINT_PREFIX) {
        return Err(ValidationError::NotAFileEndpoint(endpoint));
    }

    Ok(RequestSpec {
        method: RequestMethod::Page,
        endpoint,
        headers: request.headers.into_map(),
        body: None,
    })
}

/// Credential, endpoint and placeholder checks shared by both operations.
fn check_target(endpoint: &str, auth_token: Option<&str>) -> Result<String, ValidationError> {
    if auth_token.map_or(true, |t| t.trim().is_empty()) {
        return Err(ValidationError::MissingCredential);
    }

    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(ValidationError::MissingEndpoint);
    }

    // Any colon counts, including legitimate ones in query strings.
    if endpoint.contains(':') {
        return Err(ValidationError::UnresolvedPlaceholder(endpoint.to_string()));
    }

    if endpoint.starts_with('/') {
        Ok(endpoint.to_string())
    } else {
        Ok(format!("/{}", endpoint))
    }
}
