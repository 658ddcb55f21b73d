//! Template API handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::options::{CodeKind, OptionsPatch};
use crate::storage::{Template, TemplateStore};

use super::super::state::AppState;
use super::{ApiJson, ApiResult};

/// Request body for saving a template.
#[derive(Debug, Deserialize)]
pub struct SaveTemplateRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CodeKind,
    #[serde(default)]
    pub options: Option<OptionsPatch>,
}

/// GET /api/templates - All templates in save order.
pub async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<Template>> {
    let mut store = state.store.lock().await;
    Json(TemplateStore::new(&mut **store).get())
}

/// POST /api/templates - Save a template.
pub async fn create(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SaveTemplateRequest>,
) -> ApiResult<(StatusCode, Json<Template>)> {
    let options = req.options.unwrap_or_else(|| OptionsPatch::empty(req.kind));
    let mut store = state.store.lock().await;
    let template = TemplateStore::new(&mut **store).save(&req.name, req.kind, options)?;
    Ok((StatusCode::CREATED, Json(template)))
}

/// GET /api/templates/:id - Load one template.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Template>> {
    let mut store = state.store.lock().await;
    Ok(Json(TemplateStore::new(&mut **store).find(&id)?))
}

/// DELETE /api/templates/:id - Delete one template.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let mut store = state.store.lock().await;
    TemplateStore::new(&mut **store).remove(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
