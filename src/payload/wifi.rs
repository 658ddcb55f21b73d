//! Wi-Fi network configuration strings (`WIFI:` scheme).

use serde::{Deserialize, Serialize};

use super::{Escaping, PayloadFormat, escape_reserved, require};
use crate::error::{QrForgeError, Result};

const RESERVED: &[char] = &[';', ',', ':', '"'];

/// Authentication type advertised in the `T:` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WifiSecurity {
    #[default]
    #[serde(rename = "WPA")]
    Wpa,
    #[serde(rename = "WEP")]
    Wep,
    #[serde(rename = "nopass")]
    NoPass,
}

impl WifiSecurity {
    pub fn as_str(&self) -> &'static str {
        match self {
            WifiSecurity::Wpa => "WPA",
            WifiSecurity::Wep => "WEP",
            WifiSecurity::NoPass => "nopass",
        }
    }

    /// Parse a `T:` value. WPA2/WPA3/SAE are folded into `WPA`.
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_uppercase().as_str() {
            "WPA" | "WPA2" | "WPA3" | "SAE" => Ok(WifiSecurity::Wpa),
            "WEP" => Ok(WifiSecurity::Wep),
            "NOPASS" | "" => Ok(WifiSecurity::NoPass),
            other => Err(QrForgeError::Validation(format!(
                "Unknown Wi-Fi security '{}'",
                other
            ))),
        }
    }
}

/// Credentials for joining a wireless network.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WifiCredentials {
    pub ssid: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub security: WifiSecurity,
    #[serde(default)]
    pub hidden: bool,
}

impl WifiCredentials {
    pub fn new(ssid: impl Into<String>, password: impl Into<String>, security: WifiSecurity) -> Self {
        Self {
            ssid: ssid.into(),
            password: password.into(),
            security,
            hidden: false,
        }
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Parse a `WIFI:` string back into credentials.
    ///
    /// Fields are split on unescaped `;`, each field on its first `:`.
    /// Backslash escapes are resolved. Unknown field keys are ignored.
    pub fn parse(input: &str) -> Result<Self> {
        let body = input
            .strip_prefix("WIFI:")
            .or_else(|| input.strip_prefix("wifi:"))
            .ok_or_else(|| QrForgeError::Decode("Not a Wi-Fi configuration".into()))?;

        let mut creds = WifiCredentials {
            security: WifiSecurity::NoPass,
            ..Default::default()
        };
        let mut saw_ssid = false;

        for field in split_unescaped(body) {
            if field.is_empty() {
                break;
            }
            let Some((key, raw)) = field.split_once(':') else {
                continue;
            };
            let value = unescape(raw);
            match key {
                "T" => creds.security = WifiSecurity::parse(&value)?,
                "S" => {
                    creds.ssid = value;
                    saw_ssid = true;
                }
                "P" => creds.password = value,
                "H" => creds.hidden = value.eq_ignore_ascii_case("true"),
                _ => {}
            }
        }

        if !saw_ssid {
            return Err(QrForgeError::Decode("Wi-Fi configuration has no SSID".into()));
        }
        Ok(creds)
    }
}

impl PayloadFormat for WifiCredentials {
    fn format(&self, escaping: Escaping) -> Result<String> {
        require(&self.ssid, "SSID")?;
        Ok(format!(
            "WIFI:T:{};S:{};P:{};H:{};;",
            self.security.as_str(),
            escape_reserved(&self.ssid, RESERVED, escaping),
            escape_reserved(&self.password, RESERVED, escaping),
            self.hidden
        ))
    }
}

/// Split on `;` that is not preceded by an escaping backslash.
/// Escapes are kept in the pieces for [`unescape`] to resolve.
fn split_unescaped(body: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ';' => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        fields.push(current);
    }
    fields
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}
