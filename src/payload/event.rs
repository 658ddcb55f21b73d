//! Calendar events (iCalendar `VEVENT` fragments).

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::{Escaping, PayloadFormat, escape_text, require};
use crate::error::{QrForgeError, Result};

/// Local date-time layouts accepted besides RFC 3339.
const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// An event. Dates are form input strings, see [`to_ics_timestamp`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalendarEvent {
    pub title: String,
    pub start_date: String,
    pub end_date: String,
    pub location: String,
    pub description: String,
}

impl CalendarEvent {
    /// Format with local inputs interpreted in `tz`.
    pub fn format_in<Tz: TimeZone>(&self, escaping: Escaping, tz: &Tz) -> Result<String> {
        let title = require(&self.title, "Event title")?;
        let start = require(&self.start_date, "Start date")?;

        let mut lines = vec![
            "BEGIN:VEVENT".to_string(),
            format!("SUMMARY:{}", escape_text(title, escaping)),
            format!("DTSTART:{}", to_ics_timestamp(start, tz)?),
        ];
        if !self.end_date.trim().is_empty() {
            lines.push(format!("DTEND:{}", to_ics_timestamp(&self.end_date, tz)?));
        }
        if !self.location.is_empty() {
            lines.push(format!("LOCATION:{}", escape_text(&self.location, escaping)));
        }
        if !self.description.is_empty() {
            lines.push(format!(
                "DESCRIPTION:{}",
                escape_text(&self.description, escaping)
            ));
        }
        lines.push("END:VEVENT".to_string());
        Ok(lines.join("\n"))
    }
}

impl PayloadFormat for CalendarEvent {
    /// Local inputs are interpreted in the system time zone.
    fn format(&self, escaping: Escaping) -> Result<String> {
        self.format_in(escaping, &Local)
    }
}

/// Convert a date input to the 16-character UTC form `YYYYMMDDTHHMMSSZ`.
///
/// RFC 3339 input keeps its own offset. `YYYY-MM-DDTHH:MM[:SS]` (or with a
/// space) and bare `YYYY-MM-DD` are read as wall-clock time in `tz`; for an
/// ambiguous wall-clock time the earlier instant is used.
pub fn to_ics_timestamp<Tz: TimeZone>(input: &str, tz: &Tz) -> Result<String> {
    let input = input.trim();
    let utc = parse_instant(input, tz)?;
    Ok(utc.format("%Y%m%dT%H%M%SZ").to_string())
}

fn parse_instant<Tz: TimeZone>(input: &str, tz: &Tz) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| QrForgeError::Validation(format!("Invalid date '{}'", input)))?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            QrForgeError::Validation(format!("'{}' does not exist in the local time zone", input))
        })
}
