use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};

/// Sepia tint applied over the grayscale base
const SEPIA_TINT: [f32; 3] = [112.0, 66.0, 20.0];

/// Fixed intensity of the 3x3 sharpen kernel
const SHARPEN_INTENSITY: f32 = 0.5;

/// Rec. 601 luma
fn luma(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

pub struct ImageFilters;

impl ImageFilters {
    /// Map every color channel through a 256-entry table; alpha is untouched.
    fn map_channels(img: DynamicImage, lut: &[u8; 256]) -> DynamicImage {
        let mut rgba = img.into_rgba8();
        for pixel in rgba.pixels_mut() {
            for channel in &mut pixel.0[..3] {
                *channel = lut[*channel as usize];
            }
        }
        DynamicImage::ImageRgba8(rgba)
    }

    fn lookup_table<F: Fn(f32) -> f32>(f: F) -> [u8; 256] {
        let mut lut = [0u8; 256];
        for (value, slot) in lut.iter_mut().enumerate() {
            *slot = f(value as f32).round().clamp(0.0, 255.0) as u8;
        }
        lut
    }

    /// Brightness multiplier, saturation scale around luma and hue rotation in one pass.
    pub fn modulate(img: DynamicImage, brightness: f64, saturation: f64, hue: i32) -> DynamicImage {
        let brightness = brightness as f32;
        let saturation = saturation as f32;
        let mut rgba = img.into_rgba8();

        if brightness != 1.0 || saturation != 1.0 {
            for pixel in rgba.pixels_mut() {
                let Rgba([r, g, b, a]) = *pixel;
                let (r, g, b) = (
                    r as f32 * brightness,
                    g as f32 * brightness,
                    b as f32 * brightness,
                );
                let gray = luma(r, g, b);
                let adjust =
                    |c: f32| (gray + (c - gray) * saturation).round().clamp(0.0, 255.0) as u8;
                *pixel = Rgba([adjust(r), adjust(g), adjust(b), a]);
            }
        }

        let img = DynamicImage::ImageRgba8(rgba);
        if hue.rem_euclid(360) != 0 {
            img.huerotate(hue.rem_euclid(360))
        } else {
            img
        }
    }

    /// `out = slope * in + intercept` per color channel
    pub fn linear(img: DynamicImage, slope: f64, intercept: f64) -> DynamicImage {
        let (slope, intercept) = (slope as f32, intercept as f32);
        let lut = Self::lookup_table(|v| slope * v + intercept);
        Self::map_channels(img, &lut)
    }

    /// Contrast around mid-gray: 1.0 is identity and 128 is a fixed point.
    pub fn adjust_contrast(img: DynamicImage, factor: f64) -> DynamicImage {
        Self::linear(img, factor, -(128.0 * factor) + 128.0)
    }

    /// Power curve `out = 255 * (in / 255) ^ (1 / gamma)`
    pub fn apply_gamma(img: DynamicImage, gamma: f64) -> DynamicImage {
        let exponent = (1.0 / gamma) as f32;
        let lut = Self::lookup_table(|v| 255.0 * (v / 255.0).powf(exponent));
        Self::map_channels(img, &lut)
    }

    /// Convert image to grayscale
    pub fn apply_grayscale(img: DynamicImage) -> DynamicImage {
        img.grayscale()
    }

    /// Grayscale followed by a luminance-preserving brown tint
    pub fn apply_sepia(img: DynamicImage) -> DynamicImage {
        let gray = Self::apply_grayscale(img).into_rgba8();
        let tint_luma = luma(SEPIA_TINT[0], SEPIA_TINT[1], SEPIA_TINT[2]);
        let (width, height) = gray.dimensions();
        let mut sepia = RgbaImage::new(width, height);

        for (x, y, pixel) in gray.enumerate_pixels() {
            let Rgba([l, _, _, a]) = *pixel;
            let scale = l as f32 / tint_luma;
            let tone = |c: f32| (c * scale).round().clamp(0.0, 255.0) as u8;
            sepia.put_pixel(
                x,
                y,
                Rgba([tone(SEPIA_TINT[0]), tone(SEPIA_TINT[1]), tone(SEPIA_TINT[2]), a]),
            );
        }

        DynamicImage::ImageRgba8(sepia)
    }

    /// Gaussian blur with the given sigma
    pub fn apply_blur(img: DynamicImage, sigma: f64) -> DynamicImage {
        img.blur(sigma as f32)
    }

    /// Sharpen with a 3x3 kernel, edges clamped, alpha preserved
    pub fn apply_sharpen(img: DynamicImage) -> DynamicImage {
        let (width, height) = img.dimensions();
        let source = img.into_rgba8();
        let mut sharpened = RgbaImage::new(width, height);

        let kernel_center = 1.0 + SHARPEN_INTENSITY * 4.0;
        let kernel_edge = -SHARPEN_INTENSITY;
        let max_x = width as i64 - 1;
        let max_y = height as i64 - 1;

        for y in 0..height {
            for x in 0..width {
                let mut acc = [0.0f32; 3];
                // Cross-shaped kernel: center plus the four direct neighbours
                for (dx, dy, weight) in [
                    (0i64, 0i64, kernel_center),
                    (-1, 0, kernel_edge),
                    (1, 0, kernel_edge),
                    (0, -1, kernel_edge),
                    (0, 1, kernel_edge),
                ] {
                    let nx = (x as i64 + dx).clamp(0, max_x) as u32;
                    let ny = (y as i64 + dy).clamp(0, max_y) as u32;
                    let pixel = source.get_pixel(nx, ny);
                    for (channel, value) in acc.iter_mut().enumerate() {
                        *value += pixel[channel] as f32 * weight;
                    }
                }

                let alpha = source.get_pixel(x, y)[3];
                sharpened.put_pixel(
                    x,
                    y,
                    Rgba([
                        acc[0].round().clamp(0.0, 255.0) as u8,
                        acc[1].round().clamp(0.0, 255.0) as u8,
                        acc[2].round().clamp(0.0, 255.0) as u8,
                        alpha,
                    ]),
                );
            }
        }

        DynamicImage::ImageRgba8(sharpened)
    }
}
