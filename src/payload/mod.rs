//! # Payload Formatters
//!
//! Pure, deterministic functions that turn structured form data into the
//! standard wire strings QR readers understand.
//!
//! | Sub-type | Output |
//! |----------|--------|
//! | Wi-Fi | `WIFI:T:<sec>;S:<ssid>;P:<pass>;H:<true\|false>;;` |
//! | vCard | `BEGIN:VCARD` … `END:VCARD` (version 3.0) |
//! | Email | `mailto:<addr>?subject=<enc>&body=<enc>` |
//! | SMS | `sms:<number>?body=<enc>` |
//! | Geolocation | `geo:<lat>,<lon>` |
//! | Event | `BEGIN:VEVENT` … `END:VEVENT` |
//! | URL / Text | the string itself |
//!
//! A formatter only fails when a required field is missing, with a
//! [`QrForgeError::Validation`] naming the field.
//!
//! ## Escaping
//!
//! By default user fields are interpolated verbatim ([`Escaping::Raw`]), so a
//! `;` inside a Wi-Fi password corrupts the record exactly as existing
//! generators do. [`Escaping::Strict`] applies each format's backslash rules.

mod event;
mod uri;
mod vcard;
mod wifi;

pub use event::{CalendarEvent, to_ics_timestamp};
pub use uri::{EmailMessage, GeoPoint, SmsMessage};
pub use vcard::ContactCard;
pub use wifi::{WifiCredentials, WifiSecurity};

use serde::{Deserialize, Serialize};

use crate::error::{QrForgeError, Result};

/// How reserved delimiter characters in user fields are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Escaping {
    /// Interpolate fields verbatim.
    #[default]
    Raw,
    /// Escape reserved characters per the target format.
    Strict,
}

/// A structured payload that renders to a wire string.
pub trait PayloadFormat {
    /// Render the wire string, or fail if a required field is missing.
    fn format(&self, escaping: Escaping) -> Result<String>;
}

/// QR sub-type tag, stored with history entries as `qrType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrType {
    Url,
    Wifi,
    Vcard,
    Email,
    Sms,
    Geolocation,
    Event,
    Text,
}

impl QrType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QrType::Url => "url",
            QrType::Wifi => "wifi",
            QrType::Vcard => "vcard",
            QrType::Email => "email",
            QrType::Sms => "sms",
            QrType::Geolocation => "geolocation",
            QrType::Event => "event",
            QrType::Text => "text",
        }
    }

    /// Guess the sub-type of a decoded payload from its prefix.
    pub fn detect(payload: &str) -> Self {
        let trimmed = payload.trim_start();
        let upper: String = trimmed.chars().take(12).collect::<String>().to_ascii_uppercase();

        if upper.starts_with("WIFI:") {
            QrType::Wifi
        } else if upper.starts_with("BEGIN:VCARD") {
            QrType::Vcard
        } else if upper.starts_with("BEGIN:VEVENT") {
            QrType::Event
        } else if upper.starts_with("MAILTO:") {
            QrType::Email
        } else if upper.starts_with("SMS:") || upper.starts_with("SMSTO:") {
            QrType::Sms
        } else if upper.starts_with("GEO:") {
            QrType::Geolocation
        } else if upper.starts_with("HTTP://") || upper.starts_with("HTTPS://") {
            QrType::Url
        } else {
            QrType::Text
        }
    }
}

impl std::fmt::Display for QrType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any QR payload, tagged the way the web form submits it: `{type, data}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum QrPayload {
    Url(String),
    Text(String),
    Wifi(WifiCredentials),
    Vcard(ContactCard),
    Email(EmailMessage),
    Sms(SmsMessage),
    Geolocation(GeoPoint),
    Event(CalendarEvent),
}

impl QrPayload {
    pub fn qr_type(&self) -> QrType {
        match self {
            QrPayload::Url(_) => QrType::Url,
            QrPayload::Text(_) => QrType::Text,
            QrPayload::Wifi(_) => QrType::Wifi,
            QrPayload::Vcard(_) => QrType::Vcard,
            QrPayload::Email(_) => QrType::Email,
            QrPayload::Sms(_) => QrType::Sms,
            QrPayload::Geolocation(_) => QrType::Geolocation,
            QrPayload::Event(_) => QrType::Event,
        }
    }

    /// Format and validate: the result is never blank.
    pub fn to_payload_string(&self, escaping: Escaping) -> Result<String> {
        let data = self.format(escaping)?;
        if data.trim().is_empty() {
            return Err(QrForgeError::Validation("Please enter valid data".into()));
        }
        Ok(data)
    }
}

impl PayloadFormat for QrPayload {
    fn format(&self, escaping: Escaping) -> Result<String> {
        match self {
            QrPayload::Url(s) | QrPayload::Text(s) => Ok(s.clone()),
            QrPayload::Wifi(w) => w.format(escaping),
            QrPayload::Vcard(c) => c.format(escaping),
            QrPayload::Email(e) => e.format(escaping),
            QrPayload::Sms(s) => s.format(escaping),
            QrPayload::Geolocation(g) => g.format(escaping),
            QrPayload::Event(e) => e.format(escaping),
        }
    }
}

// ============================================================================
// SHARED HELPERS
// ============================================================================

/// Fail with a validation error when `value` is blank.
pub(crate) fn require<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    if value.trim().is_empty() {
        Err(QrForgeError::missing(field))
    } else {
        Ok(value)
    }
}

/// Backslash-escape each character of `reserved` (and the backslash itself).
pub(crate) fn escape_reserved(value: &str, reserved: &[char], escaping: Escaping) -> String {
    if escaping == Escaping::Raw {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\\' || reserved.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// vCard / iCalendar TEXT escaping: `\ ; ,` and newlines as `\n`.
pub(crate) fn escape_text(value: &str, escaping: Escaping) -> String {
    if escaping == Escaping::Raw {
        return value.to_string();
    }
    let normalized = value.replace("\r\n", "\n");
    let mut out = String::with_capacity(normalized.len());
    for c in normalized.chars() {
        match c {
            '\\' | ';' | ',' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}
