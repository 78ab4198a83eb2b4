use std::io::Cursor;

use image::metadata::Orientation;
use image::{imageops, DynamicImage, GenericImageView, Rgba, RgbaImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};

/// Image orientation operations (EXIF correction, rotation and mirroring)
pub struct ImageOrientation;

impl ImageOrientation {
    /// Read the EXIF orientation tag (1-8). Missing or unreadable metadata reads as 1.
    pub fn read_exif_orientation(data: &[u8]) -> u8 {
        let mut cursor = Cursor::new(data);
        exif::Reader::new()
            .read_from_container(&mut cursor)
            .ok()
            .and_then(|exif| {
                exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
                    .and_then(|field| field.value.get_uint(0))
            })
            .and_then(|value| u8::try_from(value).ok())
            .filter(|value| (1..=8).contains(value))
            .unwrap_or(1)
    }

    /// Apply EXIF orientation correction so the pixels are upright
    pub fn apply_exif_orientation(mut img: DynamicImage, orientation: u8) -> DynamicImage {
        if let Some(orientation) = Orientation::from_exif(orientation) {
            if orientation != Orientation::NoTransforms {
                tracing::debug!(orientation = ?orientation, "Applying EXIF orientation");
                img.apply_orientation(orientation);
            }
        }
        img
    }

    /// Rotate clockwise by any whole number of degrees.
    ///
    /// Right angles are lossless. Other angles grow the canvas to hold the rotated image
    /// and fill uncovered corners with `background`.
    pub fn rotate(img: DynamicImage, degrees: i32, background: Rgba<u8>) -> DynamicImage {
        match degrees.rem_euclid(360) {
            0 => img,
            90 => img.rotate90(),
            180 => img.rotate180(),
            270 => img.rotate270(),
            other => Self::rotate_arbitrary(&img, other as f32, background),
        }
    }

    fn rotate_arbitrary(img: &DynamicImage, degrees: f32, background: Rgba<u8>) -> DynamicImage {
        let (width, height) = img.dimensions();
        let theta = degrees.to_radians();
        let (sin, cos) = theta.sin_cos();

        let rotated_width = ((width as f32 * cos.abs()) + (height as f32 * sin.abs()))
            .ceil()
            .max(1.0) as u32;
        let rotated_height = ((width as f32 * sin.abs()) + (height as f32 * cos.abs()))
            .ceil()
            .max(1.0) as u32;

        // Work on a canvas large enough for both the source and the rotated bounds
        let canvas_width = rotated_width.max(width);
        let canvas_height = rotated_height.max(height);
        let mut canvas = RgbaImage::from_pixel(canvas_width, canvas_height, background);
        imageops::replace(
            &mut canvas,
            &img.to_rgba8(),
            i64::from((canvas_width - width) / 2),
            i64::from((canvas_height - height) / 2),
        );

        let rotated = rotate_about_center(&canvas, theta, Interpolation::Bilinear, background);
        let cropped = imageops::crop_imm(
            &rotated,
            (canvas_width - rotated_width) / 2,
            (canvas_height - rotated_height) / 2,
            rotated_width,
            rotated_height,
        )
        .to_image();

        DynamicImage::ImageRgba8(cropped)
    }

    /// Mirror top to bottom
    pub fn flip(img: DynamicImage) -> DynamicImage {
        img.flipv()
    }

    /// Mirror left to right
    pub fn flop(img: DynamicImage) -> DynamicImage {
        img.fliph()
    }
}
