use axum::{extract::State, Json};

use super::{AppJson, AppState};
use crate::error::AppError;
use crate::proxy::{PageRequest, ProxyRequest, ProxyResponse};

pub async fn proxy_request(
    State(state): State<AppState>,
    AppJson(request): AppJson<ProxyRequest>,
) -> Result<Json<ProxyResponse>, AppError> {
    tracing::debug!(
        method = %request.method,
        endpoint = %request.endpoint,
        "Proxying request"
    );

    let response = state
        .proxy
        .execute(request, state.access_token.clone())
        .await?;

    log_outcome(&response);
    Ok(Json(response))
}

pub async fn page_request(
    State(state): State<AppState>,
    AppJson(request): AppJson<PageRequest>,
) -> Result<Json<ProxyResponse>, AppError> {
    tracing::debug!(endpoint = %request.endpoint, "Fetching first page");

    let response = state
        .proxy
        .fetch_first_page(request, state.access_token.clone())
        .await?;

    log_outcome(&response);
    Ok(Json(response))
}

pub(super) fn log_outcome(response: &ProxyResponse) {
    if !response.error {
        tracing::debug!(status = ?response.status_code, "Request succeeded");
    } else {
        tracing::warn!(
            code = response.code.as_deref().unwrap_or_default(),
            message = response.message.as_deref().unwrap_or_default(),
            "Request failed"
        );
    }
}
