use image::{imageops, DynamicImage, GenericImageView, GrayImage};

/// Side of the square block summarized by one saliency cell
const SALIENCY_CELL: u32 = 4;

/// Crops to the most detailed window instead of the center.
pub struct SmartCrop;

impl SmartCrop {
    /// Per-cell saliency over a downscaled luma copy, row-major.
    ///
    /// Each cell combines gradient magnitude with local variance, so flat areas score
    /// low and textured or high-contrast areas score high.
    fn saliency_map(img: &DynamicImage) -> (Vec<f32>, u32, u32) {
        let (width, height) = img.dimensions();
        let small_width = (width / SALIENCY_CELL).max(1);
        let small_height = (height / SALIENCY_CELL).max(1);
        let small: GrayImage = imageops::resize(
            &img.to_luma8(),
            small_width,
            small_height,
            imageops::FilterType::Triangle,
        );

        let at = |x: i64, y: i64| -> f32 {
            let cx = x.clamp(0, i64::from(small_width) - 1) as u32;
            let cy = y.clamp(0, i64::from(small_height) - 1) as u32;
            f32::from(small.get_pixel(cx, cy)[0])
        };

        let mut saliency = vec![0.0f32; (small_width * small_height) as usize];
        for y in 0..i64::from(small_height) {
            for x in 0..i64::from(small_width) {
                let gx = at(x + 1, y) - at(x - 1, y);
                let gy = at(x, y + 1) - at(x, y - 1);
                let edge_strength = (gx * gx + gy * gy).sqrt();

                let mut sum = 0.0f32;
                let mut sum_sq = 0.0f32;
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        let px = at(x + dx, y + dy);
                        sum += px;
                        sum_sq += px * px;
                    }
                }
                let mean = sum / 9.0;
                let variance = (sum_sq / 9.0) - (mean * mean);

                saliency[(y as u32 * small_width + x as u32) as usize] =
                    edge_strength * 0.6 + variance.max(0.0) * 0.4;
            }
        }

        (saliency, small_width, small_height)
    }

    /// Offset of the best `window`-wide span along an axis of `len` full-resolution pixels.
    ///
    /// `profile` holds the summed saliency of each cell along the axis. Starts from the
    /// centered offset and only moves for a strictly better score, so flat images crop
    /// like a plain center crop.
    fn best_offset(profile: &[f32], len: u32, window: u32) -> u32 {
        if window >= len || profile.is_empty() {
            return 0;
        }
        let cells = profile.len() as u32;
        let cell_of = |pixel: u32| {
            ((u64::from(pixel) * u64::from(cells)) / u64::from(len)).min(u64::from(cells) - 1) as usize
        };

        // prefix[i] = saliency of full-resolution pixels [0, i)
        let mut prefix = Vec::with_capacity(len as usize + 1);
        prefix.push(0.0f64);
        let mut running = 0.0f64;
        for pixel in 0..len {
            running += f64::from(profile[cell_of(pixel)]);
            prefix.push(running);
        }
        let score = |offset: u32| prefix[(offset + window) as usize] - prefix[offset as usize];

        let mut best_offset = (len - window) / 2;
        let mut best_score = score(best_offset);
        for offset in 0..=(len - window) {
            let candidate = score(offset);
            if candidate > best_score {
                best_score = candidate;
                best_offset = offset;
            }
        }
        best_offset
    }

    /// Smart crop image to target dimensions using saliency map
    pub fn crop(
        img: DynamicImage,
        target_width: u32,
        target_height: u32,
    ) -> Result<DynamicImage, anyhow::Error> {
        let (orig_width, orig_height) = img.dimensions();

        if target_width > orig_width || target_height > orig_height {
            return Err(anyhow::anyhow!(
                "Crop dimensions ({}, {}) exceed image dimensions ({}, {})",
                target_width,
                target_height,
                orig_width,
                orig_height
            ));
        }

        if target_width == orig_width && target_height == orig_height {
            return Ok(img);
        }

        let (saliency, small_width, small_height) = Self::saliency_map(&img);
        let mut columns = vec![0.0f32; small_width as usize];
        let mut rows = vec![0.0f32; small_height as usize];
        for (i, value) in saliency.iter().enumerate() {
            columns[i % small_width as usize] += value;
            rows[i / small_width as usize] += value;
        }

        let x = Self::best_offset(&columns, orig_width, target_width);
        let y = Self::best_offset(&rows, orig_height, target_height);

        tracing::debug!(x = x, y = y, target_width, target_height, "Smart crop window");

        Ok(img.crop_imm(x, y, target_width, target_height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_crop_rejects_larger_target() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(10, 10));
        assert!(SmartCrop::crop(img, 20, 5).is_err());
    }

    #[test]
    fn test_flat_image_crops_centered() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(100, 40, Rgba([80, 80, 80, 255])));
        let (saliency, w, _) = SmartCrop::saliency_map(&img);
        let columns: Vec<f32> = (0..w as usize).map(|x| saliency[x]).collect();
        assert_eq!(SmartCrop::best_offset(&columns, 100, 40), 30);
    }

    #[test]
    fn test_crop_follows_detail() {
        // Flat gray with a checkerboard patch on the right edge
        let mut img = RgbaImage::from_pixel(120, 40, Rgba([128, 128, 128, 255]));
        for y in 0..40 {
            for x in 90..120 {
                let v = if (x / 8 + y / 8) % 2 == 0 { 0 } else { 255 };
                img.put_pixel(x, y, Rgba([v, v, v, 255]));
            }
        }
        let cropped = SmartCrop::crop(DynamicImage::ImageRgba8(img), 40, 40).unwrap();
        assert_eq!(cropped.dimensions(), (40, 40));
        // The window must include the textured patch
        let rgba = cropped.to_rgba8();
        let has_texture = rgba.pixels().any(|p| p[0] == 0 || p[0] == 255);
        assert!(has_texture);
    }
}
