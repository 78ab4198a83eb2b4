use anyhow::{anyhow, Result};
use bytes::Bytes;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, GenericImageView, Rgba, RgbImage};
use webplab_core::OutputFormat;

use crate::image::color::WHITE;

/// ravif speed for lossy output (1 slowest .. 10 fastest)
const AVIF_SPEED: u8 = 6;
/// Slower speed used when the caller asks for lossless output
const AVIF_LOSSLESS_SPEED: u8 = 2;

/// libwebp effort (0 fast .. 6 slowest)
const WEBP_METHOD: i32 = 4;
const WEBP_LOSSLESS_METHOD: i32 = 6;

/// Encoder options derived from the transform configuration
#[derive(Debug, Clone, Copy)]
pub struct EncodeSettings {
    pub format: OutputFormat,
    /// 1..=100
    pub quality: u8,
    /// Honored by webp and avif; jpeg ignores it and png is always lossless
    pub lossless: bool,
    /// JPEG has no alpha channel: transparent pixels are composited onto this color
    pub background: Option<Rgba<u8>>,
}

/// Output encoders
pub struct ImageCompressor;

impl ImageCompressor {
    /// Encode an image with the configured codec
    pub fn encode(img: &DynamicImage, settings: &EncodeSettings) -> Result<Bytes> {
        let data = match settings.format {
            OutputFormat::Webp => Self::compress_webp(img, settings.quality, settings.lossless)?,
            OutputFormat::Avif => Self::compress_avif(img, settings.quality, settings.lossless)?,
            OutputFormat::Jpeg => Self::compress_jpeg(img, settings.quality, settings.background)?,
            OutputFormat::Png => Self::compress_png(img)?,
        };

        tracing::debug!(
            format = %settings.format,
            quality = settings.quality,
            lossless = settings.lossless,
            size = data.len(),
            "Encoded image"
        );

        Ok(data)
    }

    /// Compress to JPEG using mozjpeg
    fn compress_jpeg(img: &DynamicImage, quality: u8, background: Option<Rgba<u8>>) -> Result<Bytes> {
        let rgb_img = Self::flatten(img, background.unwrap_or(WHITE));
        let (width, height) = rgb_img.dimensions();

        let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
        comp.set_size(width as usize, height as usize);
        comp.set_quality(quality as f32);
        comp.set_progressive_mode();
        comp.set_optimize_coding(true);

        let mut comp = comp.start_compress(Vec::new())?;
        comp.write_scanlines(&rgb_img)?;
        let jpeg_data = comp.finish()?;

        Ok(Bytes::from(jpeg_data))
    }

    /// Composite onto an opaque color, dropping the alpha channel
    fn flatten(img: &DynamicImage, background: Rgba<u8>) -> RgbImage {
        if !img.color().has_alpha() {
            return img.to_rgb8();
        }

        let rgba = img.to_rgba8();
        let mut rgb = RgbImage::new(rgba.width(), rgba.height());
        let bg = [
            f32::from(background[0]),
            f32::from(background[1]),
            f32::from(background[2]),
        ];

        for (src, dst) in rgba.pixels().zip(rgb.pixels_mut()) {
            let alpha = f32::from(src[3]) / 255.0;
            for channel in 0..3 {
                let value = f32::from(src[channel]) * alpha + bg[channel] * (1.0 - alpha);
                dst[channel] = value.round().clamp(0.0, 255.0) as u8;
            }
        }
        rgb
    }

    /// Compress to PNG with maximum zlib effort
    fn compress_png(img: &DynamicImage) -> Result<Bytes> {
        let mut buffer = Vec::new();
        let encoder =
            PngEncoder::new_with_quality(&mut buffer, CompressionType::Best, FilterType::Adaptive);
        img.write_with_encoder(encoder)?;

        Ok(Bytes::from(buffer))
    }

    /// Compress to WebP
    fn compress_webp(img: &DynamicImage, quality: u8, lossless: bool) -> Result<Bytes> {
        let (width, height) = img.dimensions();
        let rgba_img = img.to_rgba8();

        let mut config =
            webp::WebPConfig::new().map_err(|_| anyhow!("Failed to initialize WebP encoder"))?;
        config.lossless = i32::from(lossless);
        config.quality = f32::from(quality);
        config.method = if lossless {
            WEBP_LOSSLESS_METHOD
        } else {
            WEBP_METHOD
        };

        let encoder = webp::Encoder::from_rgba(&rgba_img, width, height);
        let webp_data = encoder
            .encode_advanced(&config)
            .map_err(|e| anyhow!("WebP encoding failed: {:?}", e))?;

        Ok(Bytes::copy_from_slice(&webp_data))
    }

    /// Compress to AVIF
    fn compress_avif(img: &DynamicImage, quality: u8, lossless: bool) -> Result<Bytes> {
        let (width, height) = img.dimensions();
        let (quality, speed) = if lossless {
            (100.0, AVIF_LOSSLESS_SPEED)
        } else {
            (f32::from(quality), AVIF_SPEED)
        };

        let rgba_img = img.to_rgba8();
        let rgba_data: Vec<rgb::RGBA8> = rgba_img
            .as_raw()
            .chunks_exact(4)
            .map(|chunk| rgb::RGBA8::new(chunk[0], chunk[1], chunk[2], chunk[3]))
            .collect();

        let img_buf = ravif::Img::new(rgba_data.as_slice(), width as usize, height as usize);

        let encoder = ravif::Encoder::new()
            .with_quality(quality)
            .with_alpha_quality(quality)
            .with_speed(speed);

        let avif_data = encoder.encode_rgba(img_buf)?;

        Ok(Bytes::from(avif_data.avif_file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbaImage};

    fn sample(alpha: u8) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(16, 12, Rgba([200, 40, 90, alpha])))
    }

    fn settings(format: OutputFormat) -> EncodeSettings {
        EncodeSettings {
            format,
            quality: 80,
            lossless: false,
            background: None,
        }
    }

    #[test]
    fn test_png_round_trip_dimensions() {
        let data = ImageCompressor::encode(&sample(255), &settings(OutputFormat::Png)).unwrap();
        assert_eq!(image::guess_format(&data).unwrap(), ImageFormat::Png);
        assert_eq!(image::load_from_memory(&data).unwrap().dimensions(), (16, 12));
    }

    #[test]
    fn test_jpeg_output() {
        let data = ImageCompressor::encode(&sample(255), &settings(OutputFormat::Jpeg)).unwrap();
        assert_eq!(image::guess_format(&data).unwrap(), ImageFormat::Jpeg);
        assert_eq!(image::load_from_memory(&data).unwrap().dimensions(), (16, 12));
    }

    #[test]
    fn test_webp_lossy_and_lossless() {
        let lossy = ImageCompressor::encode(&sample(255), &settings(OutputFormat::Webp)).unwrap();
        assert_eq!(image::guess_format(&lossy).unwrap(), ImageFormat::WebP);

        let mut lossless_settings = settings(OutputFormat::Webp);
        lossless_settings.lossless = true;
        let lossless = ImageCompressor::encode(&sample(128), &lossless_settings).unwrap();
        let decoded = image::load_from_memory(&lossless).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0), &Rgba([200, 40, 90, 128]));
    }

    #[test]
    fn test_avif_container() {
        let data = ImageCompressor::encode(&sample(255), &settings(OutputFormat::Avif)).unwrap();
        // ISO-BMFF `ftyp` box with an avif brand
        assert_eq!(&data[4..8], b"ftyp");
        assert_eq!(&data[8..12], b"avif");
    }

    #[test]
    fn test_flatten_uses_background() {
        let transparent = sample(0);
        let rgb = ImageCompressor::flatten(&transparent, Rgba([0, 0, 255, 255]));
        assert_eq!(rgb.get_pixel(3, 3).0, [0, 0, 255]);

        let rgb = ImageCompressor::flatten(&transparent, WHITE);
        assert_eq!(rgb.get_pixel(3, 3).0, [255, 255, 255]);
    }
}
