//! Generation API handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::encode::QrEncoder;
use crate::generate::{generate_barcode, generate_qr};
use crate::options::{BarcodeOptionsPatch, QrOptionsPatch};
use crate::payload::{Escaping, QrPayload};
use crate::storage::{GeneratedCode, HistoryLog, NewCode};

use super::super::state::AppState;
use super::{ApiJson, ApiResult, blocking};

/// Request body for QR generation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrRequest {
    pub payload: QrPayload,
    #[serde(default)]
    pub options: Option<QrOptionsPatch>,
    #[serde(default)]
    pub escaping: Escaping,
}

/// Request body for barcode generation.
#[derive(Debug, Deserialize)]
pub struct BarcodeRequest {
    pub data: String,
    #[serde(default)]
    pub options: Option<BarcodeOptionsPatch>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SvgResponse {
    pub data_url: String,
}

/// POST /api/qr - Generate a QR code and record it in history.
pub async fn qr(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<QrRequest>,
) -> ApiResult<Json<GeneratedCode>> {
    let code =
        blocking(move || generate_qr(&req.payload, req.options.as_ref(), req.escaping)).await?;
    record(&state, code).await
}

/// POST /api/barcode - Generate a barcode and record it in history.
pub async fn barcode(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<BarcodeRequest>,
) -> ApiResult<Json<GeneratedCode>> {
    let code = blocking(move || generate_barcode(&req.data, req.options.as_ref())).await?;
    record(&state, code).await
}

/// POST /api/qr/svg - Render a QR code as an SVG data URL (not recorded).
pub async fn qr_svg(ApiJson(req): ApiJson<QrRequest>) -> ApiResult<Json<SvgResponse>> {
    let data = req.payload.to_payload_string(req.escaping)?;
    let options = req.options.unwrap_or_default().resolve();
    let svg = blocking(move || QrEncoder.encode_svg(&data, &options)).await?;
    Ok(Json(SvgResponse {
        data_url: svg.to_string(),
    }))
}

async fn record(state: &AppState, code: NewCode) -> ApiResult<Json<GeneratedCode>> {
    let mut store = state.store.lock().await;
    let entry = HistoryLog::new(&mut **store).append(code)?;
    Ok(Json(entry))
}
