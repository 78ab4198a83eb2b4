//! Named starting points for common conversions.

use std::sync::LazyLock;

use serde::Serialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::models::TransformConfiguration;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Preset {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    /// Partial options; only the named fields override the base configuration
    #[schema(value_type = Object)]
    pub options: Value,
}

static PRESETS: LazyLock<Vec<Preset>> = LazyLock::new(|| {
    vec![
        Preset {
            id: "webp-web",
            label: "WebP Web",
            description: "Good balance for web delivery.",
            options: json!({
                "format": "webp",
                "quality": 82,
                "withoutEnlargement": true,
                "stripMetadata": true
            }),
        },
        Preset {
            id: "avif-ultra",
            label: "AVIF Ultra",
            description: "Maximum compression, slower encode.",
            options: json!({
                "format": "avif",
                "quality": 62,
                "stripMetadata": true,
                "withoutEnlargement": true
            }),
        },
        Preset {
            id: "social-1200",
            label: "Social 1200",
            description: "Best fit for social cards and previews.",
            options: json!({
                "format": "webp",
                "quality": 80,
                "width": 1200,
                "height": 630,
                "fit": "cover",
                "stripMetadata": true
            }),
        },
        Preset {
            id: "archive-lossless",
            label: "Archive",
            description: "Lossless conversion for quality-critical files.",
            options: json!({
                "format": "png",
                "lossless": true,
                "quality": 100,
                "stripMetadata": false
            }),
        },
    ]
});

pub fn presets() -> &'static [Preset] {
    &PRESETS
}

pub fn find_preset(id: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.id == id)
}

/// Overlay a preset on a configuration and normalize the result.
pub fn apply_preset(base: &TransformConfiguration, preset: &Preset) -> TransformConfiguration {
    let mut merged = base.to_json();
    if let Value::Object(overrides) = &preset.options {
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }
    }
    TransformConfiguration::normalize(&Value::Object(merged))
}
