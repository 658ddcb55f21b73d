//! # qrforge - QR Code and Barcode Toolkit
//!
//! qrforge generates, exports and scans QR codes and linear barcodes. It
//! provides:
//!
//! - **Payload formatters**: Wi-Fi, vCard, email, SMS, geolocation and
//!   calendar event strings
//! - **Encoders**: QR codes (with optional centred logo) and 1D barcodes,
//!   rendered to PNG or SVG data URLs
//! - **Exporters**: PNG, JPEG, SVG and single-page PDF downloads
//! - **Scanner**: still images and continuous frame sources
//! - **Persistence**: bounded history and named option templates
//!
//! ## Quick Start
//!
//! ```no_run
//! use qrforge::{
//!     export::{DirectorySink, ArtifactSink, ExportFormat, ExportJob},
//!     generate::generate_qr,
//!     payload::{Escaping, QrPayload, WifiCredentials, WifiSecurity},
//!     storage::{FileStore, HistoryLog},
//!     data_url::DataUrl,
//! };
//!
//! // Format and render a Wi-Fi QR code
//! let payload = QrPayload::Wifi(WifiCredentials::new("Home", "secret1", WifiSecurity::Wpa));
//! let code = generate_qr(&payload, None, Escaping::Raw)?;
//!
//! // Record it
//! let mut store = FileStore::new("./qrforge-data");
//! let entry = HistoryLog::new(&mut store).append(code)?;
//!
//! // Save a PDF
//! let artifact = ExportJob::new(entry.kind, DataUrl::parse(&entry.image)?, &entry.data)
//!     .render(ExportFormat::Pdf)?;
//! DirectorySink::new(".").save(&artifact.filename, &artifact.bytes)?;
//!
//! # Ok::<(), qrforge::QrForgeError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`payload`] | Structured data to QR payload strings |
//! | [`options`] | Visual options, partial patches, defaults |
//! | [`encode`] | QR and barcode rendering |
//! | [`generate`] | Validate, format and encode in one step |
//! | [`export`] | Download formats and sinks |
//! | [`scan`] | QR decoding from images and frame streams |
//! | [`storage`] | Key-value store, history and templates |
//! | [`batch`] | Sequential batch generation and download |
//! | [`share`] | Share message and fallback links |
//! | [`server`] | HTTP API and embedded page |
//! | [`config`] | Server and storage configuration |
//! | [`error`] | Error types |

pub mod batch;
pub mod config;
pub mod data_url;
pub mod encode;
pub mod error;
pub mod export;
pub mod generate;
pub mod options;
pub mod payload;
pub mod scan;
pub mod server;
pub mod share;
pub mod storage;

// Re-exports for convenience
pub use error::QrForgeError;
pub use options::CodeKind;
pub use payload::QrPayload;
