/// Extensions accepted when the client did not declare an `image/*` media type
const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "webp", "avif", "gif", "tif", "tiff", "bmp", "heic", "heif",
];

/// Item-level validation errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unsupported file. Images only.")]
    NotAnImage,

    #[error("The file does not look like a valid image.")]
    Undecodable,
}

/// Cheap checks that run before any pixel work
pub struct ImageValidator;

impl ImageValidator {
    /// An item is image-like if its declared media type is `image/*` or its name
    /// carries a known image extension.
    pub fn is_image_like(file_name: &str, content_type: Option<&str>) -> bool {
        let declared_image = content_type
            .map(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
            .unwrap_or(false);

        declared_image || Self::has_image_extension(file_name)
    }

    fn has_image_extension(file_name: &str) -> bool {
        let lower = file_name.to_ascii_lowercase();
        IMAGE_EXTENSIONS.iter().any(|ext| {
            lower
                .strip_suffix(ext)
                .is_some_and(|rest| rest.ends_with('.'))
        })
    }

    pub fn validate(file_name: &str, content_type: Option<&str>) -> Result<(), ValidationError> {
        if Self::is_image_like(file_name, content_type) {
            Ok(())
        } else {
            Err(ValidationError::NotAnImage)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_media_type() {
        assert!(ImageValidator::is_image_like("upload.bin", Some("image/png")));
        assert!(ImageValidator::is_image_like("upload", Some("IMAGE/Webp")));
        assert!(!ImageValidator::is_image_like("notes", Some("text/plain")));
    }

    #[test]
    fn test_extension_allowlist() {
        for name in ["a.PNG", "b.jpeg", "c.JPG", "d.heic", "e.tiff", "dir/f.avif", ".png"] {
            assert!(ImageValidator::is_image_like(name, None), "{name}");
        }
        for name in ["notes.txt", "archive.zip", "png", ".png.txt"] {
            assert!(!ImageValidator::is_image_like(name, None), "{name}");
        }
    }

    #[test]
    fn test_validate_message() {
        let err = ImageValidator::validate("notes.txt", Some("text/plain")).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file. Images only.");
        assert!(ImageValidator::validate("notes.txt", Some("image/gif")).is_ok());
    }
}
