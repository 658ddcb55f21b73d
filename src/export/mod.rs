//! # Exporters
//!
//! Turn a rendered code image into a downloadable artifact.
//!
//! | Format | Source | Transformation |
//! |--------|--------|----------------|
//! | `png` | raster data URL | none |
//! | `jpg` | raster data URL | flatten onto white, JPEG quality 92 |
//! | `svg` | SVG data URL, or the QR payload | passthrough, or re-render as SVG |
//! | `pdf` | raster data URL | single page layout, see [`pdf`] |
//!
//! Every failure surfaces as one generic [`QrForgeError::Export`]; the cause
//! is logged at debug level.

pub mod pdf;

use image::{DynamicImage, Rgb, RgbImage, codecs::jpeg::JpegEncoder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::data_url::{DataUrl, MIME_JPEG, MIME_PNG, MIME_SVG};
use crate::encode::QrEncoder;
use crate::error::{QrForgeError, Result};
use crate::options::{CodeKind, QrOptions};

pub use pdf::PageSize;

/// JPEG quality used for `jpg` downloads.
pub const JPEG_QUALITY: u8 = 92;

/// Downloadable artifact format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    #[serde(alias = "jpeg")]
    Jpg,
    Svg,
    Pdf,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpg),
            "svg" => Ok(ExportFormat::Svg),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(QrForgeError::Validation(format!(
                "Unknown export format '{}' (expected png, jpg, svg or pdf)",
                other
            ))),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpg => "jpg",
            ExportFormat::Svg => "svg",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Png => MIME_PNG,
            ExportFormat::Jpg => MIME_JPEG,
            ExportFormat::Svg => MIME_SVG,
            ExportFormat::Pdf => "application/pdf",
        }
    }

    fn failure(&self) -> QrForgeError {
        QrForgeError::Export(format!(
            "Failed to download {}",
            self.extension().to_uppercase()
        ))
    }
}

/// A file ready to be saved.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// `<type>-code.<ext>`
pub fn download_filename(kind: CodeKind, format: ExportFormat) -> String {
    format!("{}-code.{}", kind.as_str(), format.extension())
}

/// `batch-<id>-<first 10 chars>.<ext>`, with file-name-unsafe characters
/// replaced by `_`.
pub fn batch_filename(id: &str, text: &str, format: ExportFormat) -> String {
    let prefix: String = text.chars().take(10).collect();
    sanitize_filename(&format!("batch-{}-{}.{}", id, prefix, format.extension()))
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

// ============================================================================
// EXPORT JOB
// ============================================================================

/// One rendered code plus what an exporter needs to know about it.
///
/// ## Example
///
/// ```
/// use qrforge::encode::{Encoder, QrEncoder};
/// use qrforge::export::{ExportFormat, ExportJob, PageSize};
/// use qrforge::options::{CodeKind, QrOptions};
///
/// let image = QrEncoder.encode("hello", &QrOptions::default())?;
/// let artifact = ExportJob::new(CodeKind::Qr, image, "hello")
///     .page_size(PageSize::Letter)
///     .render(ExportFormat::Pdf)?;
/// assert_eq!(artifact.filename, "qr-code.pdf");
/// assert!(artifact.bytes.starts_with(b"%PDF"));
/// # Ok::<(), qrforge::QrForgeError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ExportJob {
    kind: CodeKind,
    image: DataUrl,
    data: String,
    page_size: PageSize,
    qr_options: QrOptions,
    filename: Option<String>,
}

impl ExportJob {
    pub fn new(kind: CodeKind, image: DataUrl, data: impl Into<String>) -> Self {
        Self {
            kind,
            image,
            data: data.into(),
            page_size: PageSize::default(),
            qr_options: QrOptions::default(),
            filename: None,
        }
    }

    pub fn page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Options used when an SVG has to be rendered from the payload.
    pub fn qr_options(mut self, options: QrOptions) -> Self {
        self.qr_options = options;
        self
    }

    /// Override the default `<type>-code.<ext>` name.
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Produce the artifact for `format`.
    pub fn render(&self, format: ExportFormat) -> Result<Artifact> {
        if format == ExportFormat::Svg && self.kind == CodeKind::Barcode && !self.image.is_svg() {
            return Err(QrForgeError::Validation(
                "SVG download is only available for QR codes".into(),
            ));
        }

        let bytes = self.render_bytes(format).map_err(|cause| {
            debug!(%cause, ?format, "export failed");
            format.failure()
        })?;

        Ok(Artifact {
            filename: self
                .filename
                .clone()
                .unwrap_or_else(|| download_filename(self.kind, format)),
            mime: format.mime(),
            bytes,
        })
    }

    fn render_bytes(&self, format: ExportFormat) -> std::result::Result<Vec<u8>, String> {
        match format {
            ExportFormat::Svg if self.image.is_svg() => Ok(self.image.bytes.clone()),
            ExportFormat::Svg => QrEncoder
                .encode_svg(&self.data, &self.qr_options)
                .map(|svg| svg.bytes)
                .map_err(|e| e.to_string()),
            _ if self.image.is_svg() => {
                Err("raster export needs a raster source image".to_string())
            }
            ExportFormat::Png => Ok(self.image.bytes.clone()),
            ExportFormat::Jpg => to_jpeg(&self.image.bytes, JPEG_QUALITY),
            ExportFormat::Pdf => {
                let raster = load_raster(&self.image.bytes)?;
                pdf::render(&raster, &self.data, self.kind, self.page_size)
            }
        }
    }
}

fn load_raster(bytes: &[u8]) -> std::result::Result<DynamicImage, String> {
    image::load_from_memory(bytes).map_err(|e| format!("Failed to decode image: {}", e))
}

/// Composite onto white, dropping alpha.
pub(crate) fn flatten_on_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let p = rgba.get_pixel(x, y);
        let a = p[3] as u32;
        let blend = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        Rgb([blend(p[0]), blend(p[1]), blend(p[2])])
    })
}

fn to_jpeg(bytes: &[u8], quality: u8) -> std::result::Result<Vec<u8>, String> {
    let rgb = flatten_on_white(&load_raster(bytes)?);
    let mut jpeg_bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg_bytes, quality)
        .encode_image(&rgb)
        .map_err(|e| format!("JPEG encoding failed: {}", e))?;
    Ok(jpeg_bytes)
}

// ============================================================================
// SINKS
// ============================================================================

/// Destination for saved artifacts.
pub trait ArtifactSink {
    fn save(&mut self, filename: &str, bytes: &[u8]) -> Result<()>;
}

/// Writes artifacts into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactSink for DirectorySink {
    fn save(&mut self, filename: &str, bytes: &[u8]) -> Result<()> {
        let path = self.dir.join(sanitize_filename(filename));
        fs::create_dir_all(&self.dir)
            .and_then(|_| fs::write(&path, bytes))
            .map_err(|e| {
                debug!(path = %path.display(), error = %e, "save failed");
                QrForgeError::Export(format!("Failed to save {}", filename))
            })?;
        info!(path = %path.display(), bytes = bytes.len(), "saved");
        Ok(())
    }
}

/// Keeps artifacts in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub files: Vec<(String, Vec<u8>)>,
}

impl ArtifactSink for MemorySink {
    fn save(&mut self, filename: &str, bytes: &[u8]) -> Result<()> {
        self.files.push((filename.to_string(), bytes.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{BarcodeEncoder, Encoder};
    use crate::options::BarcodeOptions;
    use image::{ImageFormat, Rgba, RgbaImage};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn qr_job() -> ExportJob {
        let image = QrEncoder.encode("export me", &QrOptions::default()).unwrap();
        ExportJob::new(CodeKind::Qr, image, "export me")
    }

    #[test]
    fn test_filenames() {
        assert_eq!(download_filename(CodeKind::Qr, ExportFormat::Png), "qr-code.png");
        assert_eq!(
            download_filename(CodeKind::Barcode, ExportFormat::Pdf),
            "barcode-code.pdf"
        );
        assert_eq!(
            batch_filename("7", "https://example.com/long", ExportFormat::Png),
            "batch-7-https___ex.png"
        );
        assert_eq!(batch_filename("1", "abc", ExportFormat::Pdf), "batch-1-abc.pdf");
    }

    #[test]
    fn test_png_is_passthrough() {
        let job = qr_job();
        let artifact = job.render(ExportFormat::Png).unwrap();
        assert_eq!(artifact.bytes, job.image.bytes);
        assert_eq!(artifact.mime, "image/png");
        assert_eq!(artifact.filename, "qr-code.png");
    }

    #[test]
    fn test_jpeg_flattens_transparency() {
        let clear = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 0]));
        let mut png = Vec::new();
        clear.write_to(&mut Cursor::new(&mut png), ImageFormat::Png).unwrap();

        let job = ExportJob::new(CodeKind::Qr, DataUrl::png(png), "x");
        let artifact = job.render(ExportFormat::Jpg).unwrap();
        assert_eq!(&artifact.bytes[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&artifact.bytes).unwrap().to_rgb8();
        let p = decoded.get_pixel(8, 8);
        assert!(p[0] > 245 && p[1] > 245 && p[2] > 245, "{:?}", p);
    }

    #[test]
    fn test_svg_rendered_from_payload() {
        let artifact = qr_job().render(ExportFormat::Svg).unwrap();
        assert!(String::from_utf8(artifact.bytes).unwrap().contains("<svg"));
        assert_eq!(artifact.filename, "qr-code.svg");
    }

    #[test]
    fn test_svg_refused_for_barcodes() {
        let image = BarcodeEncoder.encode("123", &BarcodeOptions::default()).unwrap();
        let err = ExportJob::new(CodeKind::Barcode, image, "123")
            .render(ExportFormat::Svg)
            .unwrap_err();
        assert_eq!(err.to_string(), "Validation error: SVG download is only available for QR codes");
    }

    #[test]
    fn test_corrupt_image_is_generic_error() {
        let job = ExportJob::new(CodeKind::Qr, DataUrl::png(vec![1, 2, 3]), "x");
        let err = job.render(ExportFormat::Jpg).unwrap_err();
        assert_eq!(err.to_string(), "Failed to download JPG");
    }

    #[test]
    fn test_directory_sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path());
        sink.save("qr-code.png", b"data").unwrap();
        assert_eq!(fs::read(dir.path().join("qr-code.png")).unwrap(), b"data");
    }
}
