//! Share API handler.

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::data_url::DataUrl;
use crate::export::MemorySink;
use crate::options::CodeKind;
use crate::share::{ShareOutcome, share_code, share_message};

use super::{ApiJson, ApiResult};

/// Request body for sharing a generated code.
#[derive(Debug, Deserialize)]
pub struct ShareBody {
    #[serde(rename = "type")]
    pub kind: CodeKind,
    #[serde(default)]
    pub data: String,
    /// Rendered PNG as a data URL
    pub image: String,
}

#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub message: String,
    #[serde(flatten)]
    pub outcome: ShareOutcome,
}

/// POST /api/share - Name the download and build the WhatsApp links.
///
/// The server has no share sheet of its own, so this always takes the
/// fallback path. The browser saves the image under `savedAs` and opens
/// one of the links.
pub async fn share(ApiJson(req): ApiJson<ShareBody>) -> ApiResult<Json<ShareResponse>> {
    let image = DataUrl::parse(&req.image)?;
    let mut sink = MemorySink::default();
    let outcome = share_code(req.kind, &req.data, &image, None, &mut sink)?;
    Ok(Json(ShareResponse {
        message: share_message(req.kind, &req.data),
        outcome,
    }))
}
