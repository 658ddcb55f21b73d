//! Validate, format and encode in one step.
//!
//! These are what the CLI and the HTTP handlers call. The result is a
//! [`NewCode`] ready to be appended to history; nothing is encoded when
//! validation fails.

use tracing::info;

use crate::encode::{BarcodeEncoder, Encoder, QrEncoder};
use crate::error::{QrForgeError, Result};
use crate::options::{BarcodeOptionsPatch, CodeKind, QrOptionsPatch};
use crate::payload::{Escaping, QrPayload};
use crate::storage::NewCode;

/// Format `payload` and render it as a QR code.
pub fn generate_qr(
    payload: &QrPayload,
    options: Option<&QrOptionsPatch>,
    escaping: Escaping,
) -> Result<NewCode> {
    if let QrPayload::Geolocation(point) = payload {
        point.validate_range()?;
    }
    let data = payload.to_payload_string(escaping)?;
    let patch = options.cloned().unwrap_or_default();
    let image = QrEncoder.encode(&data, &patch.resolve())?;

    info!(qr_type = %payload.qr_type(), len = data.len(), "QR code generated");
    let code = NewCode::new(CodeKind::Qr, data, image.to_string()).qr_type(payload.qr_type());
    Ok(match options {
        Some(_) => code.options(patch.into()),
        None => code,
    })
}

/// Render `data` as a barcode.
pub fn generate_barcode(data: &str, options: Option<&BarcodeOptionsPatch>) -> Result<NewCode> {
    if data.trim().is_empty() {
        return Err(QrForgeError::Validation("Please enter valid data".into()));
    }
    let patch = options.cloned().unwrap_or_default();
    let image = BarcodeEncoder.encode(data, &patch.resolve())?;

    info!(len = data.len(), "barcode generated");
    let code = NewCode::new(CodeKind::Barcode, data, image.to_string());
    Ok(match options {
        Some(_) => code.options(patch.into()),
        None => code,
    })
}
