//! Image transformer - applies one configuration to one uploaded file
//!
//! The operations run in a fixed order because each one works on the output of the
//! previous step:
//! 1. Image-like check, then decode with format sniffing
//! 2. EXIF orientation correction
//! 3. Resize (only with a width or height)
//! 4. Rotation (only for a nonzero angle)
//! 5. Modulate, contrast, gamma
//! 6. Grayscale, sepia
//! 7. Flip, flop
//! 8. Blur, sharpen
//! 9. Encode, then carry metadata over unless stripped

use std::io::Cursor;

use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageFormat};
use webplab_core::TransformConfiguration;

use crate::compression::{EncodeSettings, ImageCompressor};
use crate::image::color::{background_or_transparent, parse_hex_color};
use crate::image::filters::ImageFilters;
use crate::image::metadata::SourceMetadata;
use crate::image::orientation::ImageOrientation;
use crate::image::resize::{ImageResize, ResizeRequest};
use crate::validator::{ImageValidator, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Processing(#[from] anyhow::Error),
}

/// Encoded output of one transform
#[derive(Debug, Clone)]
pub struct TransformedImage {
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
}

pub struct ImageTransformer;

impl ImageTransformer {
    /// Run the full pipeline on one file. CPU-bound: call from a blocking thread.
    pub fn transform(
        file_name: &str,
        content_type: Option<&str>,
        data: &Bytes,
        config: &TransformConfiguration,
    ) -> Result<TransformedImage, TransformError> {
        ImageValidator::validate(file_name, content_type)?;

        let mut img = Self::decode(data)?;
        let orientation = ImageOrientation::read_exif_orientation(data);
        img = ImageOrientation::apply_exif_orientation(img, orientation);

        let img = Self::apply_operations(img, config)?;
        let (width, height) = img.dimensions();

        let settings = EncodeSettings {
            format: config.format,
            quality: config.quality,
            lossless: config.lossless,
            background: config.background.as_deref().and_then(parse_hex_color),
        };
        let mut encoded = ImageCompressor::encode(&img, &settings)?;

        if !config.strip_metadata {
            let metadata = SourceMetadata::capture(data, orientation);
            encoded = metadata.embed(encoded, config.format)?;
        }

        Ok(TransformedImage {
            data: encoded,
            width,
            height,
        })
    }

    /// Decode with format sniffing and without decoder size limits
    fn decode(data: &[u8]) -> Result<DynamicImage, TransformError> {
        let mut reader = image::ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|_| ValidationError::Undecodable)?;

        match reader.format() {
            None => return Err(ValidationError::Undecodable.into()),
            Some(ImageFormat::Avif) if !cfg!(feature = "avif-decode") => {
                return Err(anyhow::anyhow!("AVIF input is not supported by this server build.").into());
            }
            Some(_) => {}
        }
        reader.no_limits();

        reader.decode().map_err(|e| {
            tracing::debug!(error = %e, "Image decode failed");
            ValidationError::Undecodable.into()
        })
    }

    /// Pixel operations between decode and encode
    pub fn apply_operations(
        mut img: DynamicImage,
        config: &TransformConfiguration,
    ) -> Result<DynamicImage, anyhow::Error> {
        let background = background_or_transparent(config.background.as_deref());

        if config.wants_resize() {
            let request = ResizeRequest {
                width: config.width,
                height: config.height,
                fit: config.fit,
                without_enlargement: config.without_enlargement,
                background,
                smart_crop: config.smart_crop,
            };
            img = ImageResize::apply(img, &request)?;
        }

        if config.rotate != 0 {
            tracing::debug!(angle = config.rotate, "Applying rotation");
            img = ImageOrientation::rotate(img, config.rotate, background);
        }

        if config.wants_modulate() {
            img = ImageFilters::modulate(img, config.brightness, config.saturation, config.hue);
        }

        if config.contrast != 1.0 {
            img = ImageFilters::adjust_contrast(img, config.contrast);
        }

        if let Some(gamma) = config.gamma {
            img = ImageFilters::apply_gamma(img, gamma);
        }

        if config.grayscale {
            img = ImageFilters::apply_grayscale(img);
        }

        if config.sepia {
            img = ImageFilters::apply_sepia(img);
        }

        if config.flip {
            img = ImageOrientation::flip(img);
        }
        if config.flop {
            img = ImageOrientation::flop(img);
        }

        if config.blur > 0.0 {
            img = ImageFilters::apply_blur(img, config.blur);
        }

        if config.sharpen {
            img = ImageFilters::apply_sharpen(img);
        }

        Ok(img)
    }
}
