//! Image processing module
//!
//! Individual pixel operations used by [`crate::transformer::ImageTransformer`]:
//! - Orientation (EXIF correction, right-angle and arbitrary rotation, mirroring)
//! - Resize with fit modes, backed by smart crop for `cover`
//! - Color filters (modulate, linear contrast, gamma, grayscale, sepia, blur, sharpen)
//! - Metadata carry-over (ICC profile and EXIF)

pub mod color;
pub mod filters;
pub mod metadata;
pub mod orientation;
pub mod resize;
pub mod smart_crop;

pub use color::parse_hex_color;
pub use filters::ImageFilters;
pub use metadata::SourceMetadata;
pub use orientation::ImageOrientation;
pub use resize::{ImageResize, ResizeRequest};
pub use smart_crop::SmartCrop;
