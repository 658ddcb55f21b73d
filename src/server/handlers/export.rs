//! Export API handler.

use axum::{
    extract::Path,
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::data_url::DataUrl;
use crate::export::{ExportFormat, ExportJob, PageSize};
use crate::options::{CodeKind, QrOptionsPatch};

use super::{ApiJson, ApiResult, blocking};

/// Request body for export.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    /// Rendered image as a data URL
    pub image: String,
    /// Encoded payload, used for the PDF caption and SVG re-rendering
    #[serde(default)]
    pub data: String,
    #[serde(rename = "type")]
    pub kind: CodeKind,
    #[serde(default)]
    pub page_size: PageSize,
    /// QR options for SVG re-rendering
    #[serde(default)]
    pub options: Option<QrOptionsPatch>,
}

/// POST /api/export/:format - Download the code as a file.
pub async fn export(
    Path(format): Path<String>,
    ApiJson(req): ApiJson<ExportRequest>,
) -> ApiResult<Response> {
    let format = ExportFormat::parse(&format)?;
    let image = DataUrl::parse(&req.image)?;

    let artifact = blocking(move || {
        ExportJob::new(req.kind, image, req.data)
            .page_size(req.page_size)
            .qr_options(req.options.unwrap_or_default().resolve())
            .render(format)
    })
    .await?;

    Ok((
        [
            (header::CONTENT_TYPE, artifact.mime.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", artifact.filename),
            ),
        ],
        artifact.bytes,
    )
        .into_response())
}
