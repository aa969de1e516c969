use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{proxy::log_outcome, AppJson, AppState};
use crate::error::AppError;
use crate::proxy::{ProxyResponse, ProxyServiceExt};
use crate::store::{blocking, NewSavedRequest, SavedRequest};

/// Only the favorite flag is mutable after creation.
#[derive(Debug, Deserialize)]
pub struct SavedRequestUpdate {
    pub is_favorite: Option<bool>,
}

pub async fn list_saved(State(state): State<AppState>) -> Result<Json<Vec<SavedRequest>>, AppError> {
    let saved = state.saved.clone();
    Ok(Json(blocking(move || saved.list()).await?))
}

pub async fn create_saved(
    State(state): State<AppState>,
    AppJson(input): AppJson<NewSavedRequest>,
) -> Result<(StatusCode, Json<SavedRequest>), AppError> {
    let saved = state.saved.clone();
    let created = blocking(move || saved.create(input)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_saved(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(update): AppJson<SavedRequestUpdate>,
) -> Result<Json<SavedRequest>, AppError> {
    let is_favorite = update
        .is_favorite
        .ok_or_else(|| AppError::BadRequest("No fields to update".to_string()))?;
    let saved = state.saved.clone();
    Ok(Json(blocking(move || saved.patch_favorite(&id, is_favorite)).await?))
}

pub async fn delete_saved(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let saved = state.saved.clone();
    blocking(move || saved.delete(&id)).await?;
    Ok(Json(json!({ "message": "Request deleted successfully" })))
}

pub async fn replay_saved(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProxyResponse>, AppError> {
    let store = state.saved.clone();
    let saved = blocking(move || store.get(&id)).await?;
    tracing::debug!(id = %saved.id, method = %saved.method, endpoint = %saved.endpoint, "Replaying saved request");

    let response = state
        .proxy
        .replay(&saved, state.access_token.clone())
        .await?;

    log_outcome(&response);
    Ok(Json(response))
}
