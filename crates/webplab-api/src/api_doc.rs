//! OpenAPI documentation served at `/api-docs/openapi.json` and rendered by RapiDoc at `/docs`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "WebP Lab API",
        version = "0.1.0",
        description = "Batch image conversion. Upload images with one set of options and download the converted file, or a zip of every converted file with a manifest."
    ),
    paths(
        handlers::transform::transform_images,
        handlers::presets::list_presets,
        handlers::health::health_check,
    ),
    components(schemas(
        error::ErrorResponse,
        webplab_core::FailureDetail,
        webplab_core::Preset,
        webplab_core::TransformConfiguration,
        webplab_core::OutputFormat,
        webplab_core::FitMode,
        handlers::health::HealthResponse,
    )),
    tags(
        (name = "transform", description = "Batch image transformation"),
        (name = "presets", description = "Built-in option presets"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
