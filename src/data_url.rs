//! `data:` URLs, the currency images are passed around in.
//!
//! Rendered codes, logos, and history entries all carry their image as a
//! `data:<mime>;base64,<payload>` string. Non-base64 (percent-encoded) URLs
//! are accepted on input.

use base64::{Engine as _, engine::general_purpose};
use std::fmt;

use crate::error::{QrForgeError, Result};

pub const MIME_PNG: &str = "image/png";
pub const MIME_JPEG: &str = "image/jpeg";
pub const MIME_SVG: &str = "image/svg+xml";

/// A decoded data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    pub fn png(bytes: Vec<u8>) -> Self {
        Self::new(MIME_PNG, bytes)
    }

    pub fn svg(markup: impl Into<String>) -> Self {
        Self::new(MIME_SVG, markup.into().into_bytes())
    }

    pub fn is_svg(&self) -> bool {
        self.mime == MIME_SVG
    }

    /// Parse `data:<mime>[;base64],<data>`.
    pub fn parse(url: &str) -> Result<Self> {
        let invalid = |why: &str| QrForgeError::Validation(format!("Invalid data URL: {}", why));

        let rest = url
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| invalid("missing data: prefix"))?;
        let (header, data) = rest.split_once(',').ok_or_else(|| invalid("missing comma"))?;

        let mut parts = header.split(';');
        let mime = match parts.next() {
            Some("") | None => "text/plain".to_string(),
            Some(m) => m.to_ascii_lowercase(),
        };
        let is_base64 = parts.any(|p| p.eq_ignore_ascii_case("base64"));

        let bytes = if is_base64 {
            general_purpose::STANDARD
                .decode(data.trim())
                .map_err(|e| invalid(&e.to_string()))?
        } else {
            urlencoding::decode_binary(data.as_bytes()).into_owned()
        };

        Ok(Self { mime, bytes })
    }

    /// File extension matching the MIME type.
    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            MIME_PNG => "png",
            MIME_JPEG => "jpg",
            MIME_SVG => "svg",
            _ => "bin",
        }
    }
}

impl fmt::Display for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "data:{};base64,{}",
            self.mime,
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_and_parse() {
        let url = DataUrl::png(vec![0x89, b'P', b'N', b'G']);
        let s = url.to_string();
        assert_eq!(s, "data:image/png;base64,iVBORw==");
        assert_eq!(DataUrl::parse(&s).unwrap(), url);
    }

    #[test]
    fn test_parse_percent_encoded_svg() {
        let url = DataUrl::parse("data:image/svg+xml,%3Csvg%2F%3E").unwrap();
        assert!(url.is_svg());
        assert_eq!(url.bytes, b"<svg/>".to_vec());
        assert_eq!(url.extension(), "svg");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(DataUrl::parse("https://example.com/a.png").is_err());
        assert!(DataUrl::parse("data:image/png;base64").is_err());
        assert!(DataUrl::parse("data:image/png;base64,@@@").is_err());
    }
}
