use axum::Json;
use webplab_core::{presets, Preset};

/// List the built-in presets
///
/// A preset id can be sent in the `preset` form field of a transform request. Its
/// options override the matching fields of the `options` field.
#[utoipa::path(
    get,
    path = "/api/presets",
    tag = "presets",
    responses(
        (status = 200, description = "Available presets", body = Vec<Preset>)
    )
)]
#[tracing::instrument]
pub async fn list_presets() -> Json<Vec<Preset>> {
    Json(presets().to_vec())
}
