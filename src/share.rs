//! # Sharing
//!
//! Hand a generated code to a native share capability, or fall back to
//! saving the PNG and returning WhatsApp links for the host to open.

use serde::Serialize;
use std::borrow::Cow;
use tracing::{debug, info};

use crate::data_url::{DataUrl, MIME_PNG};
use crate::error::{QrForgeError, Result};
use crate::export::ArtifactSink;
use crate::options::CodeKind;

/// Characters of content quoted in the share message.
pub const MESSAGE_CONTENT_CHARS: usize = 100;

const WHATSAPP_WEB: &str = "https://web.whatsapp.com/send?text=";
const WHATSAPP_APP: &str = "whatsapp://send?text=";

/// The text sent alongside a shared code.
pub fn share_message(kind: CodeKind, content: &str) -> String {
    let noun = match kind {
        CodeKind::Qr => "QR code",
        CodeKind::Barcode => "Barcode",
    };
    let content = if content.trim().is_empty() {
        "Generated Code".to_string()
    } else {
        content.chars().take(MESSAGE_CONTENT_CHARS).collect()
    };
    format!(
        "Hi! 👋\n\nI've generated a {} for you.\n\nContent: {}",
        noun, content
    )
}

/// What a native share sheet receives.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareRequest {
    pub title: String,
    pub text: String,
    pub filename: String,
    pub png: Vec<u8>,
}

/// A native share capability.
pub trait ShareTarget {
    /// Fails with [`QrForgeError::Capability`] when sharing files is
    /// unsupported.
    fn share(&mut self, request: &ShareRequest) -> Result<()>;
}

/// Image clipboard capability.
pub trait Clipboard {
    fn write_png(&mut self, png: &[u8]) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "method")]
pub enum ShareOutcome {
    /// The share target accepted the file.
    Native,
    /// The PNG was saved; the host should open one of the links.
    Fallback {
        saved_as: String,
        web_url: String,
        app_url: String,
    },
}

/// Share `image` through `target`, falling back to save-and-link when there
/// is no target or it fails.
pub fn share_code(
    kind: CodeKind,
    content: &str,
    image: &DataUrl,
    target: Option<&mut dyn ShareTarget>,
    sink: &mut dyn ArtifactSink,
) -> Result<ShareOutcome> {
    if image.mime != MIME_PNG {
        return Err(QrForgeError::Validation("Please generate a code first".into()));
    }
    let message = share_message(kind, content);

    if let Some(target) = target {
        let request = ShareRequest {
            title: format!("{} Generated", kind.label()),
            text: message.clone(),
            filename: format!("{}-code.png", kind.as_str()),
            png: image.bytes.clone(),
        };
        match target.share(&request) {
            Ok(()) => {
                info!(kind = kind.as_str(), "shared via native target");
                return Ok(ShareOutcome::Native);
            }
            Err(e) => debug!(error = %e, "Share API failed, using download method"),
        }
    }

    let saved_as = format!(
        "{}-code-{}.png",
        kind.as_str(),
        chrono::Utc::now().timestamp_millis()
    );
    sink.save(&saved_as, &image.bytes).map_err(|e| {
        debug!(error = %e, "share fallback save failed");
        QrForgeError::Capability("Failed to open WhatsApp. Please try again.".into())
    })?;

    let encoded = urlencoding::encode(&message);
    Ok(ShareOutcome::Fallback {
        saved_as,
        web_url: format!("{}{}", WHATSAPP_WEB, encoded),
        app_url: format!("{}{}", WHATSAPP_APP, encoded),
    })
}

/// The desktop clipboard.
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    /// Fails with [`QrForgeError::Capability`] on hosts without a clipboard
    /// (no display server, for instance).
    pub fn open() -> Result<Self> {
        let inner = arboard::Clipboard::new()
            .map_err(|e| QrForgeError::Capability(format!("Clipboard unavailable: {}", e)))?;
        Ok(Self { inner })
    }
}

impl Clipboard for SystemClipboard {
    fn write_png(&mut self, png: &[u8]) -> Result<()> {
        let rgba = image::load_from_memory(png)
            .map_err(|e| QrForgeError::Decode(format!("Invalid PNG: {}", e)))?
            .to_rgba8();
        let (width, height) = rgba.dimensions();
        let image = arboard::ImageData {
            width: width as usize,
            height: height as usize,
            bytes: Cow::Owned(rgba.into_raw()),
        };
        self.inner
            .set_image(image)
            .map_err(|e| QrForgeError::Capability(e.to_string()))
    }
}

/// Put the PNG on the clipboard, if the host has one.
pub fn copy_to_clipboard(image: &DataUrl, clipboard: Option<&mut dyn Clipboard>) -> Result<()> {
    let failed = || QrForgeError::Capability("Failed to copy to clipboard".into());
    let clipboard = clipboard.ok_or_else(failed)?;
    clipboard.write_png(&image.bytes).map_err(|e| {
        debug!(error = %e, "clipboard write failed");
        failed()
    })
}
