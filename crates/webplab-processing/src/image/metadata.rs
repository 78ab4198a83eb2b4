use bytes::Bytes;
use img_parts::{DynImage, ImageEXIF, ImageICC};
use webplab_core::OutputFormat;

/// Color profile and EXIF block carried over from the uploaded file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMetadata {
    pub icc_profile: Option<Bytes>,
    pub exif: Option<Bytes>,
}

impl SourceMetadata {
    /// Read the ICC profile and EXIF block from a JPEG, PNG or WebP container.
    ///
    /// EXIF is only kept for upright sources: the pixels are already rotated by the time
    /// they are encoded, and a stale orientation tag would make viewers turn them again.
    pub fn capture(data: &Bytes, orientation: u8) -> Self {
        let image = match DynImage::from_bytes(data.clone()) {
            Ok(Some(image)) => image,
            _ => return Self::default(),
        };

        Self {
            icc_profile: image.icc_profile(),
            exif: if orientation == 1 { image.exif() } else { None },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.icc_profile.is_none() && self.exif.is_none()
    }

    /// Write the captured chunks into an encoded file.
    ///
    /// AVIF output and containers img-parts cannot parse are returned untouched.
    pub fn embed(&self, encoded: Bytes, format: OutputFormat) -> Result<Bytes, anyhow::Error> {
        if self.is_empty() || format == OutputFormat::Avif {
            return Ok(encoded);
        }

        let Some(mut image) = DynImage::from_bytes(encoded.clone())? else {
            tracing::debug!(format = %format, "Output container not supported for metadata");
            return Ok(encoded);
        };

        if let Some(profile) = &self.icc_profile {
            image.set_icc_profile(Some(profile.clone()));
        }
        if let Some(exif) = &self.exif {
            image.set_exif(Some(exif.clone()));
        }

        Ok(image.encoder().bytes())
    }
}
