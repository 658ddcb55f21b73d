//! Contact cards (vCard 3.0).

use serde::{Deserialize, Serialize};

use super::{Escaping, PayloadFormat, escape_text};
use crate::error::{QrForgeError, Result};

/// Contact details. Empty optional fields are left out of the card.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactCard {
    pub first_name: String,
    pub last_name: String,
    pub organization: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    pub address: String,
    pub note: String,
}

impl ContactCard {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Default::default()
        }
    }
}

impl PayloadFormat for ContactCard {
    fn format(&self, escaping: Escaping) -> Result<String> {
        if self.first_name.trim().is_empty() && self.last_name.trim().is_empty() {
            return Err(QrForgeError::missing("Name"));
        }

        let first = escape_text(&self.first_name, escaping);
        let last = escape_text(&self.last_name, escaping);

        let mut lines = vec![
            "BEGIN:VCARD".to_string(),
            "VERSION:3.0".to_string(),
            format!("FN:{}", format!("{} {}", first, last).trim()),
            format!("N:{};{};;;", last, first),
        ];

        let optional = [
            ("ORG:", &self.organization),
            ("EMAIL:", &self.email),
            ("TEL:", &self.phone),
            ("URL:", &self.website),
        ];
        for (prefix, value) in optional {
            if !value.is_empty() {
                lines.push(format!("{}{}", prefix, escape_text(value, escaping)));
            }
        }
        if !self.address.is_empty() {
            lines.push(format!("ADR:;;{};;;;", escape_text(&self.address, escaping)));
        }
        if !self.note.is_empty() {
            lines.push(format!("NOTE:{}", escape_text(&self.note, escaping)));
        }

        lines.push("END:VCARD".to_string());
        Ok(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_names_only_has_no_optional_lines() {
        let card = ContactCard::new("Ada", "Lovelace");
        let out = card.format(Escaping::Raw).unwrap();
        assert_eq!(
            out,
            "BEGIN:VCARD\nVERSION:3.0\nFN:Ada Lovelace\nN:Lovelace;Ada;;;\nEND:VCARD"
        );
        for prefix in ["ORG:", "EMAIL:", "TEL:", "URL:", "ADR:", "NOTE:"] {
            assert!(!out.contains(prefix), "unexpected {} line", prefix);
        }
    }

    #[test]
    fn test_all_fields_in_order() {
        let card = ContactCard {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            organization: "Navy".into(),
            email: "grace@example.com".into(),
            phone: "+1 555 0100".into(),
            website: "https://example.com".into(),
            address: "1 Main St".into(),
            note: "COBOL".into(),
        };
        let out = card.format(Escaping::Raw).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "BEGIN:VCARD",
                "VERSION:3.0",
                "FN:Grace Hopper",
                "N:Hopper;Grace;;;",
                "ORG:Navy",
                "EMAIL:grace@example.com",
                "TEL:+1 555 0100",
                "URL:https://example.com",
                "ADR:;;1 Main St;;;;",
                "NOTE:COBOL",
                "END:VCARD",
            ]
        );
    }

    #[test]
    fn test_single_name_trims_full_name() {
        let card = ContactCard::new("Plato", "");
        let out = card.format(Escaping::Raw).unwrap();
        assert!(out.contains("\nFN:Plato\n"));
        assert!(out.contains("\nN:;Plato;;;\n"));
    }

    #[test]
    fn test_missing_names_rejected() {
        let card = ContactCard::default();
        assert!(matches!(
            card.format(Escaping::Raw),
            Err(QrForgeError::Validation(_))
        ));
    }

    #[test]
    fn test_strict_escapes_delimiters() {
        let card = ContactCard {
            organization: "Smith, Jones; Co".into(),
            note: "line1\nline2".into(),
            ..ContactCard::new("A", "B")
        };
        let out = card.format(Escaping::Strict).unwrap();
        assert!(out.contains("ORG:Smith\\, Jones\\; Co"));
        assert!(out.contains("NOTE:line1\\nline2"));
    }
}
