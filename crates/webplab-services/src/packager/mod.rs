//! Result packaging
//!
//! Turns the ordered outcomes of a batch into the response payload: the bare file when
//! exactly one image succeeded and nothing failed, otherwise a zip holding every
//! success plus `manifest.json` and, when something failed, `errors.txt`.

mod report;

use std::collections::HashMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use webplab_core::{
    AppError, BatchManifest, BatchTotals, FailureDetail, TransformConfiguration, TransformOutcome,
};

use crate::archive::{create_zip_archive, ArchiveEntry};

pub use report::build_error_report;

pub const ARCHIVE_FILE_NAME: &str = "webp-lab-results.zip";
pub const ARCHIVE_CONTENT_TYPE: &str = "application/zip";
pub const MANIFEST_FILE_NAME: &str = "manifest.json";
pub const ERROR_REPORT_FILE_NAME: &str = "errors.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseBody {
    /// The one transformed image, unwrapped
    Single,
    /// Zip with every success, the manifest and the optional error report
    Archive,
}

/// Payload ready to be written as an HTTP response
#[derive(Debug, Clone)]
pub struct PackagedResponse {
    pub kind: ResponseBody,
    /// Download name for `Content-Disposition`
    pub file_name: String,
    pub content_type: &'static str,
    pub body: Bytes,
    pub totals: BatchTotals,
}

/// Package the outcomes of one batch. `outcomes` must be in input order.
///
/// A batch without a single success is not packaged: it becomes
/// [`AppError::NoSuccessfulTransforms`] carrying every failure.
pub fn pack(
    outcomes: &[TransformOutcome],
    config: &TransformConfiguration,
    generated_at: DateTime<Utc>,
) -> Result<PackagedResponse, AppError> {
    let totals = BatchTotals::from_outcomes(outcomes);

    if totals.processed == 0 {
        let failures = outcomes
            .iter()
            .filter_map(TransformOutcome::as_failure)
            .map(|f| FailureDetail {
                file: f.original_name.clone(),
                reason: f.reason.clone(),
            })
            .collect();
        return Err(AppError::NoSuccessfulTransforms { failures });
    }

    if totals.processed == 1 && totals.failed == 0 {
        if let Some(single) = outcomes.iter().find_map(TransformOutcome::as_success) {
            return Ok(PackagedResponse {
                kind: ResponseBody::Single,
                file_name: single.file_name(),
                content_type: single.format.to_mime_type(),
                body: single.data.clone(),
                totals,
            });
        }
    }

    let body = build_archive(outcomes, config, generated_at)?;

    tracing::info!(
        processed = totals.processed,
        failed = totals.failed,
        input_bytes = totals.input_bytes,
        output_bytes = totals.output_bytes,
        archive_bytes = body.len(),
        "Packaged batch archive"
    );

    Ok(PackagedResponse {
        kind: ResponseBody::Archive,
        file_name: ARCHIVE_FILE_NAME.to_string(),
        content_type: ARCHIVE_CONTENT_TYPE,
        body,
        totals,
    })
}

fn build_archive(
    outcomes: &[TransformOutcome],
    config: &TransformConfiguration,
    generated_at: DateTime<Utc>,
) -> Result<Bytes, AppError> {
    let mut entries = Vec::with_capacity(outcomes.len() + 2);
    // Batch index -> entry name, numbered by position among successes
    let mut entry_names = HashMap::new();

    for (position, success) in outcomes
        .iter()
        .filter_map(TransformOutcome::as_success)
        .enumerate()
    {
        let name = format!(
            "{}-{}.{}",
            success.safe_base_name,
            position + 1,
            success.format.extension()
        );
        entry_names.insert(success.index, name.clone());
        entries.push(ArchiveEntry::new(name, success.data.clone()));
    }

    let manifest = BatchManifest::build(generated_at, config, outcomes, |index| {
        entry_names.get(&index).cloned().unwrap_or_default()
    });
    entries.push(json_entry(MANIFEST_FILE_NAME, &manifest)?);

    if manifest.totals.failed > 0 {
        let report = build_error_report(outcomes, config, generated_at);
        entries.push(ArchiveEntry::new(ERROR_REPORT_FILE_NAME, report));
    }

    let archive = create_zip_archive(&entries).map_err(|e| {
        tracing::error!(error = %e, "Failed to build result archive");
        AppError::Archive(format!("{e:#}"))
    })?;

    Ok(Bytes::from(archive))
}

/// Pretty-printed JSON archive entry. A value that cannot be serialized is an
/// archive failure, not a client error.
fn json_entry<T: Serialize>(name: &str, value: &T) -> Result<ArchiveEntry, AppError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| {
        tracing::error!(error = %e, entry = name, "Failed to serialize archive entry");
        AppError::Archive(format!("Failed to serialize {name}: {e}"))
    })?;
    Ok(ArchiveEntry::new(name, json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::io::{Cursor, Read};
    use webplab_core::{ErrorMetadata, OutputFormat, TransformSuccess};
    use zip::ZipArchive;

    fn success(index: usize, name: &str, base: &str) -> TransformOutcome {
        TransformOutcome::Success(TransformSuccess {
            index,
            original_name: name.to_string(),
            safe_base_name: base.to_string(),
            format: OutputFormat::Webp,
            width: 4,
            height: 3,
            input_bytes: 100,
            output_bytes: 7,
            data: Bytes::from_static(b"webpdat"),
        })
    }

    fn read_entry(archive: &mut ZipArchive<Cursor<Bytes>>, name: &str) -> String {
        let mut content = String::new();
        archive
            .by_name(name)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        content
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_unserializable_entry_is_an_archive_error() {
        // JSON object keys must be strings
        let value: HashMap<(u8, u8), u8> = HashMap::from([((1, 2), 3)]);
        let err = json_entry(MANIFEST_FILE_NAME, &value).unwrap_err();
        assert!(matches!(err, AppError::Archive(ref m) if m.starts_with("Failed to serialize manifest.json")));
        assert_eq!(err.http_status_code(), 500);
    }

    #[test]
    fn test_single_success_is_unwrapped() {
        let outcomes = vec![success(0, "Photo.PNG", "photo")];
        let packaged = pack(&outcomes, &TransformConfiguration::default(), now()).unwrap();
        assert_eq!(packaged.kind, ResponseBody::Single);
        assert_eq!(packaged.file_name, "photo.webp");
        assert_eq!(packaged.content_type, "image/webp");
        assert_eq!(packaged.body, Bytes::from_static(b"webpdat"));
        assert_eq!(packaged.totals.processed, 1);
    }

    #[test]
    fn test_zero_successes_is_an_error() {
        let outcomes = vec![
            TransformOutcome::failure(0, "a.txt", "Unsupported file. Images only."),
            TransformOutcome::failure(1, "b.png", "The file does not look like a valid image."),
        ];
        let err = pack(&outcomes, &TransformConfiguration::default(), now()).unwrap_err();
        match err {
            AppError::NoSuccessfulTransforms { failures } => {
                assert_eq!(failures.len(), 2);
                assert_eq!(failures[0].file, "a.txt");
                assert_eq!(failures[1].reason, "The file does not look like a valid image.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_names_get_position_suffix() {
        let outcomes = vec![
            success(0, "cat.png", "cat"),
            success(1, "cat.jpg", "cat"),
        ];
        let packaged = pack(&outcomes, &TransformConfiguration::default(), now()).unwrap();
        assert_eq!(packaged.kind, ResponseBody::Archive);
        assert_eq!(packaged.file_name, ARCHIVE_FILE_NAME);
        assert_eq!(packaged.content_type, "application/zip");

        let archive = ZipArchive::new(Cursor::new(packaged.body)).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&"cat-1.webp"));
        assert!(names.contains(&"cat-2.webp"));
        assert!(names.contains(&MANIFEST_FILE_NAME));
        assert!(!names.contains(&ERROR_REPORT_FILE_NAME));
    }

    #[test]
    fn test_mixed_batch_manifest_and_report() {
        let outcomes = vec![
            success(0, "one.png", "one"),
            TransformOutcome::failure(1, "notes.txt", "Unsupported file. Images only."),
            success(2, "three.png", "three"),
        ];
        let packaged = pack(&outcomes, &TransformConfiguration::default(), now()).unwrap();
        assert_eq!(packaged.totals.processed, 2);
        assert_eq!(packaged.totals.failed, 1);
        assert_eq!(packaged.totals.input_bytes, 200);
        assert_eq!(packaged.totals.output_bytes, 14);

        let mut archive = ZipArchive::new(Cursor::new(packaged.body)).unwrap();
        assert_eq!(archive.len(), 4);

        let manifest: Value = serde_json::from_str(&read_entry(&mut archive, MANIFEST_FILE_NAME)).unwrap();
        assert_eq!(manifest["totals"]["processed"], 2);
        assert_eq!(manifest["totals"]["failed"], 1);
        assert_eq!(manifest["options"]["format"], "webp");
        let items = manifest["items"].as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0]["fileName"], "one-1.webp");
        assert_eq!(items[1]["status"], "error");
        assert_eq!(items[1]["reason"], "Unsupported file. Images only.");
        assert_eq!(items[2]["fileName"], "three-2.webp");
        assert_eq!(items[2]["outputExt"], "webp");

        let report = read_entry(&mut archive, ERROR_REPORT_FILE_NAME);
        assert!(report.starts_with("WebP Lab transform report\n"));
        assert!(report.contains("1. notes.txt -> Unsupported file. Images only."));
    }
}
