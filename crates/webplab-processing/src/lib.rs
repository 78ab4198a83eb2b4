//! WebP Lab Processing Library
//!
//! Pixel pipeline and batch execution:
//! - `image`: orientation, resize and fit modes, smart crop, color filters, metadata carry-over
//! - `compression`: webp/avif/jpeg/png encoders
//! - `transformer`: one configuration applied to one decoded image, in a fixed order
//! - `worker`: per-item failure isolation around the transformer
//! - `scheduler`: bounded-concurrency execution with index-ordered results

pub mod compression;
pub mod image;
pub mod scheduler;
pub mod transformer;
pub mod validator;
pub mod worker;

pub use compression::{EncodeSettings, ImageCompressor};
pub use scheduler::{run_batch, BatchCancelled};
pub use transformer::{ImageTransformer, TransformError, TransformedImage};
pub use validator::{ImageValidator, ValidationError};
pub use worker::TransformWorker;
