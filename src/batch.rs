//! # Batch Generation
//!
//! Generate many codes with one set of options, then save them one by one.
//! Both steps are strictly sequential; downloads pause between saves.

use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

use crate::data_url::DataUrl;
use crate::encode::encode_code;
use crate::error::Result;
use crate::export::{ArtifactSink, ExportFormat, ExportJob, batch_filename};
use crate::options::{CodeKind, OptionsPatch};

/// Pause between successive saves.
pub const DOWNLOAD_PAUSE: Duration = Duration::from_millis(100);

/// One line of batch input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub id: String,
    pub text: String,
}

impl BatchItem {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// Items with ids `1..=n` in order.
    pub fn numbered<I, S>(texts: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Self::new((i + 1).to_string(), text))
            .collect()
    }
}

/// Outcome for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum BatchOutcome {
    Generated { image: String },
    Failed { error: String },
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub id: String,
    pub text: String,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

impl BatchResult {
    pub fn image(&self) -> Option<&str> {
        match &self.outcome {
            BatchOutcome::Generated { image } => Some(image),
            _ => None,
        }
    }
}

/// Encode each non-blank item in order. A failing item is recorded and the
/// batch carries on.
pub fn generate_batch(
    kind: CodeKind,
    items: &[BatchItem],
    options: Option<&OptionsPatch>,
) -> Result<Vec<BatchResult>> {
    if let Some(options) = options {
        options.check_kind(kind)?;
    }

    let results: Vec<BatchResult> = items
        .iter()
        .map(|item| {
            let outcome = if item.text.trim().is_empty() {
                BatchOutcome::Skipped
            } else {
                match encode_code(kind, &item.text, options) {
                    Ok(image) => BatchOutcome::Generated {
                        image: image.to_string(),
                    },
                    Err(e) => {
                        warn!(id = %item.id, error = %e, "Failed to generate code for: {}", item.text);
                        BatchOutcome::Failed {
                            error: e.to_string(),
                        }
                    }
                }
            };
            BatchResult {
                id: item.id.clone(),
                text: item.text.clone(),
                outcome,
            }
        })
        .collect();

    let generated = results.iter().filter(|r| r.image().is_some()).count();
    info!(total = items.len(), generated, kind = kind.as_str(), "batch generated");
    Ok(results)
}

/// Save every generated item through `sink` as `format`, pausing `pause`
/// between saves. Returns the number of files saved.
///
/// Only `png` and `pdf` are offered for batches; PDF pages carry the item
/// text as caption.
pub fn download_batch(
    kind: CodeKind,
    results: &[BatchResult],
    format: ExportFormat,
    sink: &mut dyn ArtifactSink,
    pause: Duration,
) -> Result<usize> {
    let mut saved = 0;
    for result in results {
        let Some(image) = result.image() else {
            continue;
        };
        if saved > 0 && !pause.is_zero() {
            thread::sleep(pause);
        }

        let artifact = ExportJob::new(kind, DataUrl::parse(image)?, result.text.clone())
            .filename(batch_filename(&result.id, &result.text, format))
            .render(format)?;
        sink.save(&artifact.filename, &artifact.bytes)?;
        saved += 1;
    }
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QrForgeError;
    use crate::export::MemorySink;
    use crate::options::{BarcodeFormat, BarcodeOptionsPatch, QrOptionsPatch};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_blank_items_skipped_and_order_kept() {
        let items = BatchItem::numbered(["alpha", "  ", "gamma"]);
        let results = generate_batch(CodeKind::Qr, &items, None).unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert!(results[0].image().is_some());
        assert_eq!(results[1].outcome, BatchOutcome::Skipped);
        assert!(results[2].image().is_some());
    }

    #[test]
    fn test_failure_does_not_stop_batch() {
        let options: OptionsPatch = BarcodeOptionsPatch {
            format: Some(BarcodeFormat::Ean13),
            ..Default::default()
        }
        .into();
        let items = BatchItem::numbered(["abc", "400638133393"]);
        let results = generate_batch(CodeKind::Barcode, &items, Some(&options)).unwrap();

        assert!(matches!(results[0].outcome, BatchOutcome::Failed { .. }));
        assert!(results[1].image().is_some());
    }

    #[test]
    fn test_mismatched_options_rejected_up_front() {
        let options: OptionsPatch = QrOptionsPatch {
            width: Some(100),
            ..Default::default()
        }
        .into();
        let err = generate_batch(CodeKind::Barcode, &BatchItem::numbered(["1"]), Some(&options))
            .unwrap_err();
        assert!(matches!(err, QrForgeError::Validation(_)));
    }

    #[test]
    fn test_download_names_and_skips() {
        let items = BatchItem::numbered(["https://example.com", "", "two"]);
        let results = generate_batch(CodeKind::Qr, &items, None).unwrap();

        let mut sink = MemorySink::default();
        let saved =
            download_batch(CodeKind::Qr, &results, ExportFormat::Png, &mut sink, Duration::ZERO)
                .unwrap();

        assert_eq!(saved, 2);
        let names: Vec<&str> = sink.files.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["batch-1-https___ex.png", "batch-3-two.png"]);
    }

    #[test]
    fn test_download_pdf() {
        let results = generate_batch(CodeKind::Qr, &BatchItem::numbered(["pdf"]), None).unwrap();
        let mut sink = MemorySink::default();
        download_batch(CodeKind::Qr, &results, ExportFormat::Pdf, &mut sink, DOWNLOAD_PAUSE)
            .unwrap();
        assert!(sink.files[0].1.starts_with(b"%PDF"));
    }

    #[test]
    fn test_result_json_shape() {
        let result = BatchResult {
            id: "1".into(),
            text: "x".into(),
            outcome: BatchOutcome::Failed {
                error: "bad".into(),
            },
        };
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"id":"1","text":"x","status":"failed","error":"bad"}"#);
    }
}
