//! History API handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use crate::storage::{GeneratedCode, HistoryLog};

use super::super::state::AppState;
use super::ApiResult;

/// GET /api/history - Entries, newest first.
pub async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<GeneratedCode>> {
    let mut store = state.store.lock().await;
    Json(HistoryLog::new(&mut **store).get())
}

/// DELETE /api/history - Remove every entry.
pub async fn clear(State(state): State<Arc<AppState>>) -> ApiResult<StatusCode> {
    let mut store = state.store.lock().await;
    HistoryLog::new(&mut **store).clear()?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/history/:id - Remove one entry.
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let mut store = state.store.lock().await;
    HistoryLog::new(&mut **store).remove(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
