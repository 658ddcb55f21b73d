//! # Round-Trip Tests
//!
//! Every payload type is formatted, rendered to a PNG data URL and read
//! back with the scanner. The decoded text must equal the formatted
//! payload exactly.

use image::{ImageFormat, Rgba, RgbaImage};
use pretty_assertions::assert_eq;
use std::io::Cursor;

use qrforge::QrPayload;
use qrforge::data_url::DataUrl;
use qrforge::export::{ExportFormat, ExportJob};
use qrforge::generate::generate_qr;
use qrforge::options::{CodeKind, ErrorCorrection, QrOptionsPatch};
use qrforge::payload::{
    CalendarEvent, ContactCard, EmailMessage, Escaping, GeoPoint, QrType, SmsMessage,
    WifiCredentials, WifiSecurity,
};
use qrforge::scan::{scan_data_url, scan_image_bytes};

fn payloads() -> Vec<QrPayload> {
    let mut card = ContactCard::new("Ada", "Lovelace");
    card.organization = "Analytical Engines".into();
    card.email = "ada@example.com".into();
    card.phone = "+44 20 7946 0000".into();

    vec![
        QrPayload::Url("https://example.com/path?q=1".into()),
        QrPayload::Text("Hello, world!".into()),
        QrPayload::Wifi(WifiCredentials::new("Home", "secret1", WifiSecurity::Wpa)),
        QrPayload::Vcard(card),
        QrPayload::Email(EmailMessage {
            email: "bob@example.com".into(),
            subject: "Hi there".into(),
            body: "Lunch?".into(),
        }),
        QrPayload::Sms(SmsMessage {
            phone: "+15551234567".into(),
            message: "On my way".into(),
        }),
        QrPayload::Geolocation(GeoPoint::new(51.5074, -0.1278)),
        QrPayload::Event(CalendarEvent {
            title: "Launch".into(),
            start_date: "2026-05-01T10:00:00Z".into(),
            end_date: "2026-05-01T11:30:00Z".into(),
            location: "Room 4".into(),
            description: String::new(),
        }),
    ]
}

fn small_logo() -> String {
    let logo = RgbaImage::from_pixel(24, 24, Rgba([200, 30, 30, 255]));
    let mut bytes = Vec::new();
    logo.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("logo encodes");
    DataUrl::png(bytes).to_string()
}

#[test]
fn test_every_payload_type_scans_back() {
    for payload in payloads() {
        let code = generate_qr(&payload, None, Escaping::Raw).expect("generates");
        let decoded = scan_data_url(&code.image).expect("scans");
        assert_eq!(decoded, code.data, "payload type {}", payload.qr_type());
        assert_eq!(code.qr_type, Some(payload.qr_type()));
    }
}

#[test]
fn test_detected_type_matches_payload_type() {
    for payload in payloads() {
        let data = payload.to_payload_string(Escaping::Raw).expect("formats");
        assert_eq!(QrType::detect(&data), payload.qr_type());
    }
}

#[test]
fn test_logo_at_level_h_still_scans() {
    let options = QrOptionsPatch {
        logo: Some(small_logo()),
        error_correction_level: Some(ErrorCorrection::H),
        ..Default::default()
    };
    let payload = QrPayload::Url("https://example.com/with-logo".into());
    let code = generate_qr(&payload, Some(&options), Escaping::Raw).expect("generates");

    assert_eq!(scan_data_url(&code.image).expect("scans"), "https://example.com/with-logo");
}

#[test]
fn test_strict_wifi_round_trip() {
    let creds = WifiCredentials::new("Cafe;Guest", "p:ss\\word,1", WifiSecurity::Wpa).hidden(true);
    let code = generate_qr(&QrPayload::Wifi(creds.clone()), None, Escaping::Strict)
        .expect("generates");

    let decoded = scan_data_url(&code.image).expect("scans");
    assert_eq!(WifiCredentials::parse(&decoded).expect("parses"), creds);
}

#[test]
fn test_exported_png_and_jpeg_scan_back() {
    let payload = QrPayload::Text("export me".into());
    let code = generate_qr(&payload, None, Escaping::Raw).expect("generates");
    let image = DataUrl::parse(&code.image).expect("data url");

    for format in [ExportFormat::Png, ExportFormat::Jpg] {
        let artifact = ExportJob::new(CodeKind::Qr, image.clone(), &code.data)
            .render(format)
            .expect("exports");
        assert_eq!(artifact.filename, format!("qr-code.{}", format.extension()));
        assert_eq!(scan_image_bytes(&artifact.bytes).expect("scans"), "export me");
    }
}

#[test]
fn test_exported_pdf_is_a_pdf() {
    let payload = QrPayload::Url("https://example.com".into());
    let code = generate_qr(&payload, None, Escaping::Raw).expect("generates");
    let artifact = ExportJob::new(CodeKind::Qr, DataUrl::parse(&code.image).unwrap(), &code.data)
        .render(ExportFormat::Pdf)
        .expect("exports");

    assert_eq!(artifact.mime, "application/pdf");
    assert!(artifact.bytes.starts_with(b"%PDF"));
}
