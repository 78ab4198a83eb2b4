//! Domain models for one batch request.

pub mod manifest;
pub mod outcome;
pub mod transform;

pub use manifest::{BatchManifest, BatchTotals, ManifestItem};
pub use outcome::{BatchItem, TransformFailure, TransformOutcome, TransformSuccess};
pub use transform::{FitMode, OutputFormat, TransformConfiguration, MAX_DIMENSION};
