//! Batch API handler.

use axum::Json;
use serde::Deserialize;

use crate::batch::{BatchItem, BatchResult, generate_batch};
use crate::options::{CodeKind, OptionsPatch};

use super::{ApiJson, ApiResult, blocking};

/// Items may be given as `{id, text}` objects or bare strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum BatchInput {
    Item(BatchItem),
    Text(String),
}

/// Request body for batch generation.
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    #[serde(rename = "type")]
    pub kind: CodeKind,
    pub items: Vec<BatchInput>,
    #[serde(default)]
    pub options: Option<OptionsPatch>,
}

/// POST /api/batch - Generate every item in order. Not recorded in history.
pub async fn batch(ApiJson(req): ApiJson<BatchRequest>) -> ApiResult<Json<Vec<BatchResult>>> {
    let items: Vec<BatchItem> = req
        .items
        .into_iter()
        .enumerate()
        .map(|(i, input)| match input {
            BatchInput::Item(item) => item,
            BatchInput::Text(text) => BatchItem::new((i + 1).to_string(), text),
        })
        .collect();

    let results =
        blocking(move || generate_batch(req.kind, &items, req.options.as_ref())).await?;
    Ok(Json(results))
}
