//! URI-shaped payloads: `mailto:`, `sms:` and `geo:`.
//!
//! Query values are percent-encoded; every byte outside `A-Z a-z 0-9 - . _ ~`
//! is escaped.

use serde::{Deserialize, Serialize};

use super::{Escaping, PayloadFormat, require};
use crate::error::{QrForgeError, Result};

/// An email intent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailMessage {
    pub email: String,
    pub subject: String,
    pub body: String,
}

impl PayloadFormat for EmailMessage {
    fn format(&self, _escaping: Escaping) -> Result<String> {
        let address = require(&self.email, "Email address")?;

        let mut params = Vec::new();
        if !self.subject.is_empty() {
            params.push(format!("subject={}", urlencoding::encode(&self.subject)));
        }
        if !self.body.is_empty() {
            params.push(format!("body={}", urlencoding::encode(&self.body)));
        }

        let mut mailto = format!("mailto:{}", address);
        if !params.is_empty() {
            mailto.push('?');
            mailto.push_str(&params.join("&"));
        }
        Ok(mailto)
    }
}

/// A text message intent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SmsMessage {
    pub phone: String,
    pub message: String,
}

impl PayloadFormat for SmsMessage {
    fn format(&self, _escaping: Escaping) -> Result<String> {
        let phone = require(&self.phone, "Phone number")?;
        let mut sms = format!("sms:{}", phone);
        if !self.message.is_empty() {
            sms.push_str("?body=");
            sms.push_str(&urlencoding::encode(&self.message));
        }
        Ok(sms)
    }
}

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check latitude ∈ [-90, 90] and longitude ∈ [-180, 180].
    ///
    /// The formatter does not call this; the orchestrating layer does.
    pub fn validate_range(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(QrForgeError::Validation(format!(
                "Latitude {} is outside -90..90",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(QrForgeError::Validation(format!(
                "Longitude {} is outside -180..180",
                self.longitude
            )));
        }
        Ok(())
    }
}

impl PayloadFormat for GeoPoint {
    fn format(&self, _escaping: Escaping) -> Result<String> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(QrForgeError::Validation(
                "Latitude and longitude must be numbers".into(),
            ));
        }
        Ok(format!(
            "geo:{},{}",
            number_to_string(self.latitude),
            number_to_string(self.longitude)
        ))
    }
}

/// Shortest round-tripping decimal, laid out the way ECMAScript's
/// `Number::toString` does: plain digits for exponents in `-7 < e < 21`,
/// `1e-7` / `1.5e+21` style outside it, and `0` for negative zero.
fn number_to_string(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value < 0.0 {
        return format!("-{}", number_to_string(-value));
    }

    // `{:e}` gives the shortest digits as `d.ddde<exp>`
    let sci = format!("{:e}", value);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((&sci, "0"));
    let digits: String = mantissa.chars().filter(|c| c.is_ascii_digit()).collect();
    let k = digits.len() as i32;
    let n = exp.parse::<i32>().unwrap_or(0) + 1;

    if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{}.{}", int, frac)
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let e = n - 1;
        let sign = if e < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", first, sign, e.abs())
        } else {
            format!("{}.{}e{}{}", first, rest, sign, e.abs())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mailto_without_params() {
        let email = EmailMessage {
            email: "hello@example.com".into(),
            ..Default::default()
        };
        assert_eq!(email.format(Escaping::Raw).unwrap(), "mailto:hello@example.com");
    }

    #[test]
    fn test_mailto_encodes_params() {
        let email = EmailMessage {
            email: "hello@example.com".into(),
            subject: "Hi there".into(),
            body: "a&b=c\nd".into(),
        };
        assert_eq!(
            email.format(Escaping::Raw).unwrap(),
            "mailto:hello@example.com?subject=Hi%20there&body=a%26b%3Dc%0Ad"
        );
    }

    #[test]
    fn test_mailto_body_only() {
        let email = EmailMessage {
            email: "x@y.z".into(),
            body: "hi".into(),
            ..Default::default()
        };
        assert_eq!(email.format(Escaping::Raw).unwrap(), "mailto:x@y.z?body=hi");
    }

    #[test]
    fn test_mailto_requires_address() {
        assert!(EmailMessage::default().format(Escaping::Raw).is_err());
    }

    #[test]
    fn test_sms() {
        let sms = SmsMessage {
            phone: "+15550100".into(),
            message: "On my way!".into(),
        };
        assert_eq!(
            sms.format(Escaping::Raw).unwrap(),
            "sms:+15550100?body=On%20my%20way%21"
        );

        let bare = SmsMessage {
            phone: "12345".into(),
            ..Default::default()
        };
        assert_eq!(bare.format(Escaping::Raw).unwrap(), "sms:12345");
    }

    #[test]
    fn test_geo_shortest_decimal() {
        let point = GeoPoint::new(40.7128, -74.006);
        assert_eq!(point.format(Escaping::Raw).unwrap(), "geo:40.7128,-74.006");

        let whole = GeoPoint::new(10.0, -20.0);
        assert_eq!(whole.format(Escaping::Raw).unwrap(), "geo:10,-20");
    }

    #[test]
    fn test_geo_out_of_range_still_formats() {
        let point = GeoPoint::new(123.0, 500.0);
        assert_eq!(point.format(Escaping::Raw).unwrap(), "geo:123,500");
        assert!(point.validate_range().is_err());
        assert!(GeoPoint::new(40.7128, -74.006).validate_range().is_ok());
    }

    #[test]
    fn test_geo_tiny_and_huge_numbers() {
        let tiny = GeoPoint::new(1e-7, -0.000001);
        assert_eq!(tiny.format(Escaping::Raw).unwrap(), "geo:1e-7,-0.000001");

        let huge = GeoPoint::new(1.5e21, 123456789012345680000.0);
        assert_eq!(
            huge.format(Escaping::Raw).unwrap(),
            "geo:1.5e+21,123456789012345680000"
        );

        let signed_zero = GeoPoint::new(-0.0, 2.5e-8);
        assert_eq!(signed_zero.format(Escaping::Raw).unwrap(), "geo:0,2.5e-8");
    }

    #[test]
    fn test_number_to_string_plain_range() {
        assert_eq!(number_to_string(0.1), "0.1");
        assert_eq!(number_to_string(123.456), "123.456");
        assert_eq!(number_to_string(1e20), "100000000000000000000");
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(-180.0), "-180");
    }

    #[test]
    fn test_geo_rejects_nan() {
        assert!(GeoPoint::new(f64::NAN, 0.0).format(Escaping::Raw).is_err());
    }
}
