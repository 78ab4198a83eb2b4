use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::Response,
};
use chrono::Utc;
use webplab_core::{apply_preset, find_preset, AppError, TransformConfiguration};
use webplab_processing::{run_batch, TransformWorker};
use webplab_services::{pack, PackagedResponse};

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::{extract_transform_form, parse_options, validate_batch};

pub const PROCESSED_FILES_HEADER: &str = "X-Processed-Files";
pub const FAILED_FILES_HEADER: &str = "X-Failed-Files";
pub const TOTAL_INPUT_BYTES_HEADER: &str = "X-Total-Input-Bytes";
pub const TOTAL_OUTPUT_BYTES_HEADER: &str = "X-Total-Output-Bytes";

/// Transform a batch of images
///
/// Applies one configuration to every file of the `files` field. A single image that
/// transforms cleanly comes back as the image itself; anything else comes back as a
/// zip with the transformed files, `manifest.json` and, when some files failed,
/// `errors.txt`.
///
/// # Errors
/// - `AppError::InvalidInput` - No files, malformed options or unknown preset
/// - `AppError::PayloadTooLarge` - Batch breaks a count or size limit
/// - `AppError::NoSuccessfulTransforms` - Every file failed
/// - `AppError::Archive` - The zip could not be written
#[utoipa::path(
    post,
    path = "/api/transform",
    tag = "transform",
    request_body(
        content = inline(Object),
        content_type = "multipart/form-data",
        description = "`files` (one or more), optional `options` (JSON) and `preset` (id)"
    ),
    responses(
        (status = 200, description = "Transformed image or zip archive", content_type = "application/octet-stream"),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 413, description = "Batch too large", body = ErrorResponse),
        (status = 422, description = "No image could be transformed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, multipart),
    fields(
        operation = "transform_images",
        files = tracing::field::Empty,
        format = tracing::field::Empty
    )
)]
pub async fn transform_images(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, HttpAppError> {
    let limits = state.runtime_limits();
    let form = extract_transform_form(multipart).await?;

    validate_batch(&form.files, &limits)?;

    let raw_options = parse_options(form.options.as_deref())?;
    let mut config = TransformConfiguration::normalize(&raw_options);
    if let Some(preset_id) = form.preset.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        let preset = find_preset(preset_id)
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown preset: {}", preset_id)))?;
        config = apply_preset(&config, preset);
    }

    let span = tracing::Span::current();
    span.record("files", form.files.len());
    span.record("format", config.format.as_str());

    let worker = TransformWorker::new(Arc::new(config));
    let worker_ref = &worker;
    let cancel = state.shutdown.child_token();

    let outcomes = run_batch(&form.files, limits.concurrency, &cancel, move |index, item| {
        worker_ref.transform(index, item)
    })
    .await
    .map_err(|e| {
        tracing::warn!(error = %e, "Batch stopped by shutdown");
        AppError::Internal(e.to_string())
    })?;

    let packaged = pack(&outcomes, worker.config(), Utc::now())?;

    tracing::info!(
        processed = packaged.totals.processed,
        failed = packaged.totals.failed,
        input_bytes = packaged.totals.input_bytes,
        output_bytes = packaged.totals.output_bytes,
        kind = ?packaged.kind,
        "Batch transformed"
    );

    build_response(packaged)
}

fn build_response(packaged: PackagedResponse) -> Result<Response, HttpAppError> {
    let totals = packaged.totals;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, packaged.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", packaged.file_name),
        )
        .header(header::CACHE_CONTROL, "no-store")
        .header(header::CONTENT_LENGTH, packaged.body.len())
        .header(PROCESSED_FILES_HEADER, totals.processed)
        .header(FAILED_FILES_HEADER, totals.failed)
        .header(TOTAL_INPUT_BYTES_HEADER, totals.input_bytes)
        .header(TOTAL_OUTPUT_BYTES_HEADER, totals.output_bytes)
        .body(Body::from(packaged.body))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            AppError::Internal(e.to_string()).into()
        })
}
