use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use webplab_core::models::MAX_DIMENSION;
use webplab_core::FitMode;

use super::smart_crop::SmartCrop;

/// Resize target and policy for one image
#[derive(Debug, Clone, Copy)]
pub struct ResizeRequest {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fit: FitMode,
    /// Never scale up
    pub without_enlargement: bool,
    /// Letterbox color for `contain`
    pub background: Rgba<u8>,
    /// Saliency-driven crop window for `cover`
    pub smart_crop: bool,
}

/// Largest intermediate or final canvas a resize may allocate
pub const MAX_OUTPUT_PIXELS: u64 = 100_000_000;

/// Image resize operations
pub struct ImageResize;

impl ImageResize {
    /// Resolve the target box, deriving a missing axis from the aspect ratio.
    ///
    /// A derived axis is capped at [`MAX_DIMENSION`] like a requested one.
    pub fn target_box(
        orig_width: u32,
        orig_height: u32,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Option<(u32, u32)> {
        match (width, height) {
            (Some(w), Some(h)) => Some((w, h)),
            (Some(w), None) => {
                let aspect_ratio = orig_height as f64 / orig_width as f64;
                Some((w, scale_dimension(w, aspect_ratio).min(MAX_DIMENSION)))
            }
            (None, Some(h)) => {
                let aspect_ratio = orig_width as f64 / orig_height as f64;
                Some((scale_dimension(h, aspect_ratio).min(MAX_DIMENSION), h))
            }
            (None, None) => None,
        }
    }

    /// Select appropriate filter type based on resize ratio
    pub fn select_filter(
        orig_width: u32,
        orig_height: u32,
        new_width: u32,
        new_height: u32,
    ) -> FilterType {
        let width_ratio = orig_width as f32 / new_width as f32;
        let height_ratio = orig_height as f32 / new_height as f32;
        let max_ratio = width_ratio.max(height_ratio);

        if max_ratio > 2.0 {
            FilterType::Triangle
        } else if max_ratio > 1.5 {
            FilterType::CatmullRom
        } else {
            FilterType::Lanczos3
        }
    }

    /// Resize image to exact dimensions, skipping the work when nothing changes
    pub fn resize_image(img: DynamicImage, width: u32, height: u32) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        if (orig_width, orig_height) == (width, height) {
            return img;
        }
        let filter = Self::select_filter(orig_width, orig_height, width, height);
        img.resize_exact(width, height, filter)
    }

    /// Refuse a canvas that breaks the axis or pixel budget, before anything is allocated
    pub fn check_output_size(width: u32, height: u32) -> Result<(), anyhow::Error> {
        let pixels = u64::from(width) * u64::from(height);
        if width > MAX_DIMENSION || height > MAX_DIMENSION || pixels > MAX_OUTPUT_PIXELS {
            anyhow::bail!(
                "Resize to {}x{} exceeds the output limit ({} px per side, {} px total).",
                width,
                height,
                MAX_DIMENSION,
                MAX_OUTPUT_PIXELS
            );
        }
        Ok(())
    }

    /// Apply the fit mode to an image
    pub fn apply(img: DynamicImage, request: &ResizeRequest) -> Result<DynamicImage, anyhow::Error> {
        let (orig_width, orig_height) = img.dimensions();
        if orig_width == 0 || orig_height == 0 {
            return Ok(img);
        }
        let Some((target_width, target_height)) =
            Self::target_box(orig_width, orig_height, request.width, request.height)
        else {
            return Ok(img);
        };

        if request.without_enlargement && orig_width <= target_width && orig_height <= target_height
        {
            return Ok(img);
        }

        let scale_x = target_width as f64 / orig_width as f64;
        let scale_y = target_height as f64 / orig_height as f64;
        let limit = |scale: f64| {
            if request.without_enlargement {
                scale.min(1.0)
            } else {
                scale
            }
        };

        tracing::debug!(
            from_width = orig_width,
            from_height = orig_height,
            target_width = target_width,
            target_height = target_height,
            fit = ?request.fit,
            "Resizing image"
        );

        let resized = match request.fit {
            FitMode::Fill => {
                let width = scale_dimension(orig_width, limit(scale_x));
                let height = scale_dimension(orig_height, limit(scale_y));
                Self::check_output_size(width, height)?;
                Self::resize_image(img, width, height)
            }
            FitMode::Inside => {
                let scale = limit(scale_x.min(scale_y));
                Self::resize_uniform(img, scale)?
            }
            FitMode::Outside => {
                let scale = limit(scale_x.max(scale_y));
                Self::resize_uniform(img, scale)?
            }
            FitMode::Cover => {
                let scale = limit(scale_x.max(scale_y));
                let scaled = Self::resize_uniform(img, scale)?;
                let (scaled_width, scaled_height) = scaled.dimensions();
                let crop_width = target_width.min(scaled_width);
                let crop_height = target_height.min(scaled_height);
                if request.smart_crop {
                    SmartCrop::crop(scaled, crop_width, crop_height)?
                } else {
                    Self::center_crop(scaled, crop_width, crop_height)
                }
            }
            FitMode::Contain => {
                let scale = limit(scale_x.min(scale_y));
                let scaled = Self::resize_uniform(img, scale)?;
                Self::check_output_size(target_width, target_height)?;
                Self::letterbox(&scaled, target_width, target_height, request.background)
            }
        };

        Ok(resized)
    }

    fn resize_uniform(img: DynamicImage, scale: f64) -> Result<DynamicImage, anyhow::Error> {
        let (orig_width, orig_height) = img.dimensions();
        let width = scale_dimension(orig_width, scale);
        let height = scale_dimension(orig_height, scale);
        Self::check_output_size(width, height)?;
        Ok(Self::resize_image(img, width, height))
    }

    fn center_crop(img: DynamicImage, width: u32, height: u32) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        if (orig_width, orig_height) == (width, height) {
            return img;
        }
        img.crop_imm(
            (orig_width - width) / 2,
            (orig_height - height) / 2,
            width,
            height,
        )
    }

    /// Center the image on a canvas of the target size
    fn letterbox(
        img: &DynamicImage,
        target_width: u32,
        target_height: u32,
        background: Rgba<u8>,
    ) -> DynamicImage {
        let (width, height) = img.dimensions();
        let mut canvas = RgbaImage::from_pixel(target_width, target_height, background);
        let x_offset = (i64::from(target_width) - i64::from(width)) / 2;
        let y_offset = (i64::from(target_height) - i64::from(height)) / 2;
        imageops::overlay(&mut canvas, &img.to_rgba8(), x_offset, y_offset);
        DynamicImage::ImageRgba8(canvas)
    }
}

fn scale_dimension(value: u32, scale: f64) -> u32 {
    (value as f64 * scale).round().clamp(1.0, u32::MAX as f64) as u32
}
