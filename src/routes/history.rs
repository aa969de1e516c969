use axum::{extract::State, Json};
use serde_json::{json, Value};

use super::AppState;
use crate::error::AppError;
use crate::store::{blocking, HistoryEntry};

pub async fn list_history(State(state): State<AppState>) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    let history = state.history.clone();
    Ok(Json(blocking(move || history.list()).await?))
}

pub async fn clear_history(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let history = state.history.clone();
    let removed = blocking(move || history.clear()).await?;
    Ok(Json(json!({
        "message": "History cleared successfully",
        "removed": removed,
    })))
}
