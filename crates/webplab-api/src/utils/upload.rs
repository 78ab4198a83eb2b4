//! Multipart extraction and request-level validation for batch uploads

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use serde_json::{Map, Value};
use webplab_core::limits::{MAX_BATCH_FILES_ENV, MAX_INPUT_FILE_MB_ENV, MAX_TOTAL_INPUT_MB_ENV};
use webplab_core::{AppError, BatchItem, RuntimeLimits};

pub const FILES_FIELD: &str = "files";
pub const OPTIONS_FIELD: &str = "options";
pub const PRESET_FIELD: &str = "preset";

const UNNAMED_FILE: &str = "unknown";

/// Parts of one transform request
#[derive(Debug, Default)]
pub struct TransformForm {
    /// Non-empty file parts, in the order they were sent
    pub files: Vec<BatchItem>,
    pub options: Option<String>,
    pub preset: Option<String>,
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("Request body too large: {}", e.body_text()))
    } else {
        AppError::InvalidInput(format!("Failed to read multipart: {}", e.body_text()))
    }
}

/// Read every part of the form. Unknown fields are skipped, zero-byte files are dropped.
pub async fn extract_transform_form(mut multipart: Multipart) -> Result<TransformForm, AppError> {
    let mut form = TransformForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match field_name.as_str() {
            FILES_FIELD => {
                let file_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| UNNAMED_FILE.to_string());
                let content_type = field.content_type().map(|s| s.to_string());
                let data = field.bytes().await.map_err(multipart_error)?;

                if data.is_empty() {
                    tracing::debug!(file = %file_name, "Skipping empty file part");
                    continue;
                }
                form.files.push(BatchItem::new(file_name, content_type, data));
            }
            OPTIONS_FIELD => {
                if form.options.is_some() {
                    return Err(AppError::InvalidInput(
                        "Multiple options fields are not allowed; send at most one.".to_string(),
                    ));
                }
                form.options = Some(field.text().await.map_err(multipart_error)?);
            }
            PRESET_FIELD => {
                if form.preset.is_some() {
                    return Err(AppError::InvalidInput(
                        "Multiple preset fields are not allowed; send at most one.".to_string(),
                    ));
                }
                form.preset = Some(field.text().await.map_err(multipart_error)?);
            }
            other => {
                tracing::debug!(field = %other, "Ignoring unknown multipart field");
            }
        }
    }

    Ok(form)
}

/// Reject the batch before any processing when it breaks a runtime limit.
///
/// Checks run in order: presence, file count, each file size, total size.
pub fn validate_batch(files: &[BatchItem], limits: &RuntimeLimits) -> Result<(), AppError> {
    if files.is_empty() {
        return Err(AppError::InvalidInput("No images received.".to_string()));
    }

    if files.len() > limits.max_batch_files {
        return Err(AppError::PayloadTooLarge(format!(
            "Batch too large. Max {} files allowed ({}).",
            limits.max_batch_files, MAX_BATCH_FILES_ENV
        )));
    }

    if let Some(max_file_bytes) = limits.max_input_file_bytes() {
        if let Some(file) = files.iter().find(|f| f.size() > max_file_bytes) {
            return Err(AppError::PayloadTooLarge(format!(
                "File {} exceeds {} MB ({}).",
                file.file_name, limits.max_input_file_mb, MAX_INPUT_FILE_MB_ENV
            )));
        }
    }

    if let Some(max_total_bytes) = limits.max_total_input_bytes() {
        let total: u64 = files.iter().map(BatchItem::size).sum();
        if total > max_total_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Batch exceeds {} MB total ({}).",
                limits.max_total_input_mb, MAX_TOTAL_INPUT_MB_ENV
            )));
        }
    }

    Ok(())
}

/// Parse the raw options field. Absent or blank means an empty object.
pub fn parse_options(raw: Option<&str>) -> Result<Value, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Value::Object(Map::new())),
        Some(text) => serde_json::from_str(text).map_err(|e| {
            tracing::debug!(error = %e, "Rejected options field");
            AppError::InvalidInput("Invalid options field. It must be JSON.".to_string())
        }),
    }
}
