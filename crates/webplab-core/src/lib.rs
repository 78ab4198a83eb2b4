//! WebP Lab Core Library
//!
//! This crate provides the domain models, configuration normalization, runtime limits,
//! output naming rules and error types shared by the processing, services and API crates.

pub mod config;
pub mod error;
pub mod limits;
pub mod models;
pub mod naming;
pub mod presets;

// Re-export commonly used types
pub use config::ServerConfig;
pub use error::{AppError, ErrorMetadata, FailureDetail, LogLevel};
pub use limits::RuntimeLimits;
pub use models::{
    BatchItem, BatchManifest, BatchTotals, FitMode, ManifestItem, OutputFormat,
    TransformConfiguration, TransformFailure, TransformOutcome, TransformSuccess,
};
pub use presets::{apply_preset, find_preset, presets, Preset};
