//! Transform configuration shared by every item of a batch.
//!
//! The configuration arrives as untrusted JSON. It is never deserialized directly:
//! [`TransformConfiguration::normalize`] maps any JSON value onto a fully populated,
//! in-bounds record, falling back to defaults field by field.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Largest width or height accepted for a resize target.
pub const MAX_DIMENSION: u32 = 16_384;

static COLOR_HEX: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$")
});

/// Target codec for transformed images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Webp,
    Avif,
    Jpeg,
    Png,
}

impl OutputFormat {
    /// Parse an exact, lowercase format name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "webp" => Some(OutputFormat::Webp),
            "avif" => Some(OutputFormat::Avif),
            "jpeg" => Some(OutputFormat::Jpeg),
            "png" => Some(OutputFormat::Png),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Webp => "webp",
            OutputFormat::Avif => "avif",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
        }
    }

    /// File extension used for output files (without the dot).
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Webp => "webp",
            OutputFormat::Avif => "avif",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }

    pub fn to_mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Webp => "image/webp",
            OutputFormat::Avif => "image/avif",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an image is fitted to the requested width/height box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Fill the box, cropping the overflow
    Cover,
    /// Fit inside the box and letterbox the rest with the background color
    Contain,
    /// Stretch to the exact box, ignoring aspect ratio
    Fill,
    /// Fit inside the box, no padding
    Inside,
    /// Cover the box without cropping
    Outside,
}

impl FitMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cover" => Some(FitMode::Cover),
            "contain" => Some(FitMode::Contain),
            "fill" => Some(FitMode::Fill),
            "inside" => Some(FitMode::Inside),
            "outside" => Some(FitMode::Outside),
            _ => None,
        }
    }
}

/// Fully populated, bounded transform configuration.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransformConfiguration {
    pub format: OutputFormat,
    /// 1..=100
    pub quality: u8,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fit: FitMode,
    /// Clockwise degrees
    pub rotate: i32,
    pub grayscale: bool,
    /// Gaussian sigma, 0..=20
    pub blur: f64,
    pub sharpen: bool,
    /// Mirror top to bottom
    pub flip: bool,
    /// Mirror left to right
    pub flop: bool,
    pub strip_metadata: bool,
    pub without_enlargement: bool,
    /// `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`
    pub background: Option<String>,
    pub lossless: bool,
    pub brightness: f64,
    pub saturation: f64,
    /// Degrees, unclamped
    pub hue: i32,
    pub contrast: f64,
    pub gamma: Option<f64>,
    pub sepia: bool,
    pub smart_crop: bool,
    pub watermark_text: Option<String>,
    pub watermark_opacity: f64,
    pub rename_pattern: Option<String>,
}

impl Default for TransformConfiguration {
    fn default() -> Self {
        Self {
            format: OutputFormat::Webp,
            quality: 82,
            width: None,
            height: None,
            fit: FitMode::Inside,
            rotate: 0,
            grayscale: false,
            blur: 0.0,
            sharpen: false,
            flip: false,
            flop: false,
            strip_metadata: true,
            without_enlargement: true,
            background: None,
            lossless: false,
            brightness: 1.0,
            saturation: 1.0,
            hue: 0,
            contrast: 1.0,
            gamma: None,
            sepia: false,
            smart_crop: false,
            watermark_text: None,
            watermark_opacity: 0.5,
            rename_pattern: None,
        }
    }
}

impl TransformConfiguration {
    /// Build a configuration from an arbitrary JSON value.
    ///
    /// Total and idempotent: any input (including `null`, arrays and wrongly typed fields)
    /// yields an in-bounds record, and normalizing the serialized output yields the same record.
    pub fn normalize(raw: &Value) -> Self {
        let empty = Map::new();
        let source = raw.as_object().unwrap_or(&empty);
        let defaults = Self::default();
        let field = |key: &str| source.get(key);

        Self {
            format: field("format")
                .and_then(Value::as_str)
                .and_then(OutputFormat::parse)
                .unwrap_or(defaults.format),
            quality: number(field("quality"))
                .map(|q| q.clamp(1.0, 100.0).round() as u8)
                .unwrap_or(defaults.quality),
            width: dimension(field("width")),
            height: dimension(field("height")),
            fit: field("fit")
                .and_then(Value::as_str)
                .and_then(FitMode::parse)
                .unwrap_or(defaults.fit),
            rotate: number(field("rotate"))
                .map(degrees)
                .unwrap_or(defaults.rotate),
            grayscale: boolean(field("grayscale"), defaults.grayscale),
            blur: bounded(field("blur"), 0.0, 20.0).unwrap_or(defaults.blur),
            sharpen: boolean(field("sharpen"), defaults.sharpen),
            flip: boolean(field("flip"), defaults.flip),
            flop: boolean(field("flop"), defaults.flop),
            strip_metadata: boolean(field("stripMetadata"), defaults.strip_metadata),
            without_enlargement: boolean(
                field("withoutEnlargement"),
                defaults.without_enlargement,
            ),
            background: background(field("background")),
            lossless: boolean(field("lossless"), defaults.lossless),
            brightness: bounded(field("brightness"), 0.0, 3.0).unwrap_or(defaults.brightness),
            saturation: bounded(field("saturation"), 0.0, 3.0).unwrap_or(defaults.saturation),
            hue: number(field("hue")).map(degrees).unwrap_or(defaults.hue),
            contrast: bounded(field("contrast"), 0.0, 3.0).unwrap_or(defaults.contrast),
            gamma: bounded(field("gamma"), 1.0, 3.0),
            sepia: boolean(field("sepia"), defaults.sepia),
            smart_crop: boolean(field("smartCrop"), defaults.smart_crop),
            watermark_text: text(field("watermarkText")),
            watermark_opacity: bounded(field("watermarkOpacity"), 0.0, 1.0)
                .unwrap_or(defaults.watermark_opacity),
            rename_pattern: text(field("renamePattern")),
        }
    }

    /// Serialize back to the camelCase JSON object accepted by [`Self::normalize`].
    pub fn to_json(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    pub fn wants_resize(&self) -> bool {
        self.width.is_some() || self.height.is_some()
    }

    pub fn wants_modulate(&self) -> bool {
        self.brightness != 1.0 || self.saturation != 1.0 || self.hue != 0
    }
}

/// Number coercion: JSON numbers and numeric strings, finite only.
fn number(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    parsed.is_finite().then_some(parsed)
}

fn bounded(value: Option<&Value>, min: f64, max: f64) -> Option<f64> {
    number(value).map(|n| n.clamp(min, max))
}

fn degrees(n: f64) -> i32 {
    // `as` saturates at the i32 bounds
    n.round() as i32
}

fn dimension(value: Option<&Value>) -> Option<u32> {
    let n = number(value)?;
    if n <= 0.0 {
        return None;
    }
    let rounded = n.round().min(f64::from(MAX_DIMENSION));
    (rounded >= 1.0).then_some(rounded as u32)
}

fn boolean(value: Option<&Value>, fallback: bool) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) if s == "true" => true,
        Some(Value::String(s)) if s == "false" => false,
        _ => fallback,
    }
}

fn background(value: Option<&Value>) -> Option<String> {
    let trimmed = value?.as_str()?.trim();
    let pattern = COLOR_HEX.as_ref().ok()?;
    pattern.is_match(trimmed).then(|| trimmed.to_string())
}

fn text(value: Option<&Value>) -> Option<String> {
    value?
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_owned)
}
