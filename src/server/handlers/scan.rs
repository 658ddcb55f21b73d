//! Scan API handler.

use axum::{Json, extract::Multipart};
use serde::Serialize;

use crate::error::QrForgeError;
use crate::payload::QrType;
use crate::scan::scan_image_bytes;

use super::{ApiResult, blocking};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub text: String,
    pub qr_type: QrType,
}

/// POST /api/scan - Decode the QR code in an uploaded `image` field.
pub async fn scan(mut multipart: Multipart) -> ApiResult<Json<ScanResponse>> {
    let mut image_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| QrForgeError::Validation(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("image") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| QrForgeError::Validation(format!("Failed to read image: {}", e)))?;
            image_data = Some(bytes.to_vec());
            break;
        }
    }

    let bytes =
        image_data.ok_or_else(|| QrForgeError::Validation("No image field found".into()))?;
    let text = blocking(move || scan_image_bytes(&bytes)).await?;

    Ok(Json(ScanResponse {
        qr_type: QrType::detect(&text),
        text,
    }))
}
