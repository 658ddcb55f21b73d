//! # Visual Options
//!
//! Option sets for the two encode paths and the partial "patch" form that
//! callers, history entries and templates carry around.
//!
//! A patch holds only the fields a caller actually set. [`QrOptionsPatch::resolve`]
//! and [`BarcodeOptionsPatch::resolve`] shallow-merge a patch over the fixed
//! defaults:
//!
//! | Path | Defaults |
//! |------|----------|
//! | QR | 400 px, margin 2, `#000000` on `#FFFFFF`, level H, logo 60 px / 2 px |
//! | Barcode | CODE128, module 2 px, height 100, value shown, font 16, margin 10, black on white |

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::error::{QrForgeError, Result};

/// Which kind of code an entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeKind {
    Qr,
    Barcode,
}

impl CodeKind {
    /// Lowercase tag used in file names and JSON (`qr`, `barcode`).
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeKind::Qr => "qr",
            CodeKind::Barcode => "barcode",
        }
    }

    /// Human-readable label ("QR Code", "Barcode").
    pub fn label(&self) -> &'static str {
        match self {
            CodeKind::Qr => "QR Code",
            CodeKind::Barcode => "Barcode",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "qr" => Ok(CodeKind::Qr),
            "barcode" => Ok(CodeKind::Barcode),
            other => Err(QrForgeError::Validation(format!(
                "Unknown code type '{}' (expected qr or barcode)",
                other
            ))),
        }
    }
}

/// QR error correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorCorrection {
    /// ~7% recovery
    L,
    /// ~15% recovery
    M,
    /// ~25% recovery
    Q,
    /// ~30% recovery
    #[default]
    H,
}

impl From<ErrorCorrection> for qrcode::EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::L => qrcode::EcLevel::L,
            ErrorCorrection::M => qrcode::EcLevel::M,
            ErrorCorrection::Q => qrcode::EcLevel::Q,
            ErrorCorrection::H => qrcode::EcLevel::H,
        }
    }
}

/// Linear barcode symbology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BarcodeFormat {
    #[default]
    #[serde(rename = "CODE128")]
    Code128,
    #[serde(rename = "CODE39")]
    Code39,
    #[serde(rename = "EAN13")]
    Ean13,
    #[serde(rename = "EAN8")]
    Ean8,
    #[serde(rename = "UPC")]
    Upc,
    #[serde(rename = "ITF14")]
    Itf14,
}

impl BarcodeFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "CODE128" => Ok(BarcodeFormat::Code128),
            "CODE39" => Ok(BarcodeFormat::Code39),
            "EAN13" => Ok(BarcodeFormat::Ean13),
            "EAN8" => Ok(BarcodeFormat::Ean8),
            "UPC" => Ok(BarcodeFormat::Upc),
            "ITF14" => Ok(BarcodeFormat::Itf14),
            other => Err(QrForgeError::Validation(format!(
                "Unknown barcode format '{}'",
                other
            ))),
        }
    }
}

// ============================================================================
// QR OPTIONS
// ============================================================================

/// Fully resolved QR options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrOptions {
    /// Output width (and height) in pixels
    pub width: u32,
    /// Quiet zone in modules
    pub margin: u32,
    pub dark_color: String,
    pub light_color: String,
    pub error_correction_level: ErrorCorrection,
    /// Logo image as a data URL
    pub logo: Option<String>,
    pub logo_size: u32,
    pub logo_margin: u32,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            width: 400,
            margin: 2,
            dark_color: "#000000".to_string(),
            light_color: "#FFFFFF".to_string(),
            error_correction_level: ErrorCorrection::H,
            logo: None,
            logo_size: 60,
            logo_margin: 2,
        }
    }
}

/// Partial QR options, as supplied by a caller or stored with an entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QrOptionsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_correction_level: Option<ErrorCorrection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_margin: Option<u32>,
}

impl QrOptionsPatch {
    /// Shallow-merge this patch over the QR defaults.
    pub fn resolve(&self) -> QrOptions {
        let defaults = QrOptions::default();
        QrOptions {
            width: self.width.unwrap_or(defaults.width),
            margin: self.margin.unwrap_or(defaults.margin),
            dark_color: self.dark_color.clone().unwrap_or(defaults.dark_color),
            light_color: self.light_color.clone().unwrap_or(defaults.light_color),
            error_correction_level: self
                .error_correction_level
                .unwrap_or(defaults.error_correction_level),
            logo: self.logo.clone().filter(|l| !l.trim().is_empty()),
            // A zero logo size falls back to the default as well
            logo_size: self.logo_size.filter(|&s| s > 0).unwrap_or(defaults.logo_size),
            logo_margin: self.logo_margin.unwrap_or(defaults.logo_margin),
        }
    }
}

// ============================================================================
// BARCODE OPTIONS
// ============================================================================

/// Fully resolved barcode options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarcodeOptions {
    pub format: BarcodeFormat,
    /// Width of a single module in pixels
    pub width: u32,
    /// Bar height in pixels
    pub height: u32,
    /// Draw the human-readable value under the bars
    pub display_value: bool,
    pub font_size: u32,
    /// Margin around the symbol in pixels
    pub margin: u32,
    pub foreground_color: String,
    pub background_color: String,
}

impl Default for BarcodeOptions {
    fn default() -> Self {
        Self {
            format: BarcodeFormat::Code128,
            width: 2,
            height: 100,
            display_value: true,
            font_size: 16,
            margin: 10,
            foreground_color: "#000000".to_string(),
            background_color: "#FFFFFF".to_string(),
        }
    }
}

/// Partial barcode options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BarcodeOptionsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<BarcodeFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_value: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

impl BarcodeOptionsPatch {
    /// Shallow-merge this patch over the barcode defaults.
    pub fn resolve(&self) -> BarcodeOptions {
        let defaults = BarcodeOptions::default();
        BarcodeOptions {
            format: self.format.unwrap_or(defaults.format),
            width: self.width.unwrap_or(defaults.width),
            height: self.height.unwrap_or(defaults.height),
            display_value: self.display_value.unwrap_or(defaults.display_value),
            font_size: self.font_size.unwrap_or(defaults.font_size),
            margin: self.margin.unwrap_or(defaults.margin),
            foreground_color: self
                .foreground_color
                .clone()
                .unwrap_or(defaults.foreground_color),
            background_color: self
                .background_color
                .clone()
                .unwrap_or(defaults.background_color),
        }
    }
}

/// Partial options of either kind, as stored with history entries and templates.
///
/// Untagged: each patch rejects unknown fields, so a patch with a field only
/// one kind has is read as that kind. A patch setting nothing but `width`
/// and `margin` (or nothing at all) fits both and reads back as `Qr`; the
/// owning record's `type` settles it through [`OptionsPatch::normalized`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionsPatch {
    Qr(QrOptionsPatch),
    Barcode(BarcodeOptionsPatch),
}

impl OptionsPatch {
    pub fn kind(&self) -> CodeKind {
        match self {
            OptionsPatch::Qr(_) => CodeKind::Qr,
            OptionsPatch::Barcode(_) => CodeKind::Barcode,
        }
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        match self {
            OptionsPatch::Qr(p) => *p == QrOptionsPatch::default(),
            OptionsPatch::Barcode(p) => *p == BarcodeOptionsPatch::default(),
        }
    }

    /// The empty patch of `kind`.
    pub fn empty(kind: CodeKind) -> Self {
        match kind {
            CodeKind::Qr => OptionsPatch::Qr(QrOptionsPatch::default()),
            CodeKind::Barcode => OptionsPatch::Barcode(BarcodeOptionsPatch::default()),
        }
    }

    /// Re-tag as `kind` when the fields set are ones both kinds share.
    ///
    /// Every record carrying options passes through here on load and save,
    /// since `{}` or `{"width":3}` cannot say which kind it was written for.
    /// A patch with fields the other kind lacks is returned unchanged.
    pub fn normalized(self, kind: CodeKind) -> Self {
        if self.kind() == kind {
            return self;
        }
        let Some((width, margin)) = self.shared_fields() else {
            return self;
        };
        match kind {
            CodeKind::Qr => OptionsPatch::Qr(QrOptionsPatch {
                width,
                margin,
                ..Default::default()
            }),
            CodeKind::Barcode => OptionsPatch::Barcode(BarcodeOptionsPatch {
                width,
                margin,
                ..Default::default()
            }),
        }
    }

    /// `(width, margin)` when no other field is set.
    fn shared_fields(&self) -> Option<(Option<u32>, Option<u32>)> {
        match self {
            OptionsPatch::Qr(p) => {
                let rest = QrOptionsPatch {
                    width: None,
                    margin: None,
                    ..p.clone()
                };
                (rest == QrOptionsPatch::default()).then_some((p.width, p.margin))
            }
            OptionsPatch::Barcode(p) => {
                let rest = BarcodeOptionsPatch {
                    width: None,
                    margin: None,
                    ..p.clone()
                };
                (rest == BarcodeOptionsPatch::default()).then_some((p.width, p.margin))
            }
        }
    }

    /// Check this patch can be applied to a code of `kind`.
    pub fn check_kind(&self, kind: CodeKind) -> Result<()> {
        if self.kind() == kind || self.shared_fields().is_some() {
            Ok(())
        } else {
            Err(QrForgeError::Validation(format!(
                "Options do not match code type '{}'",
                kind.as_str()
            )))
        }
    }
}

impl From<QrOptionsPatch> for OptionsPatch {
    fn from(patch: QrOptionsPatch) -> Self {
        OptionsPatch::Qr(patch)
    }
}

impl From<BarcodeOptionsPatch> for OptionsPatch {
    fn from(patch: BarcodeOptionsPatch) -> Self {
        OptionsPatch::Barcode(patch)
    }
}

// ============================================================================
// COLORS
// ============================================================================

/// Parse a CSS hex colour (`#RGB`, `#RRGGBB` or `#RRGGBBAA`, `#` optional).
pub fn parse_hex_color(value: &str) -> Result<Rgba<u8>> {
    let hex = value.trim().trim_start_matches('#');
    let invalid = || QrForgeError::Validation(format!("Invalid colour '{}'", value));

    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());

    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = channel(&c.to_string())?;
                rgb[i] = v * 17;
            }
            Ok(Rgba([rgb[0], rgb[1], rgb[2], 255]))
        }
        6 => Ok(Rgba([
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            255,
        ])),
        8 => Ok(Rgba([
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            channel(&hex[6..8])?,
        ])),
        _ => Err(invalid()),
    }
}
