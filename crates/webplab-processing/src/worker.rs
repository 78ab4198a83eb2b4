use std::sync::Arc;

use chrono::Utc;
use webplab_core::naming::{output_base_name, RenameContext};
use webplab_core::{BatchItem, TransformConfiguration, TransformOutcome, TransformSuccess};

use crate::transformer::ImageTransformer;

/// Reason recorded when the blocking task itself dies (panic or runtime shutdown)
const ABORTED_REASON: &str = "Image processing was interrupted.";

/// Transforms one batch item and never lets an error escape.
///
/// Every failure becomes a [`TransformOutcome::Failure`] so one bad file cannot
/// affect the rest of the batch.
#[derive(Clone)]
pub struct TransformWorker {
    config: Arc<TransformConfiguration>,
}

impl TransformWorker {
    pub fn new(config: Arc<TransformConfiguration>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransformConfiguration {
        &self.config
    }

    pub async fn transform(&self, index: usize, item: &BatchItem) -> TransformOutcome {
        let config = Arc::clone(&self.config);
        let file_name = item.file_name.clone();
        let content_type = item.content_type.clone();
        let data = item.data.clone();

        let result = tokio::task::spawn_blocking(move || {
            ImageTransformer::transform(&file_name, content_type.as_deref(), &data, &config)
        })
        .await;

        match result {
            Ok(Ok(transformed)) => {
                let base_name = output_base_name(
                    self.config.rename_pattern.as_deref(),
                    &RenameContext {
                        original_name: &item.file_name,
                        width: transformed.width,
                        height: transformed.height,
                        date: Utc::now().date_naive(),
                    },
                );

                tracing::debug!(
                    index = index,
                    file = %item.file_name,
                    input_bytes = item.size(),
                    output_bytes = transformed.data.len(),
                    "Transformed image"
                );

                TransformOutcome::Success(TransformSuccess {
                    index,
                    original_name: item.file_name.clone(),
                    safe_base_name: base_name,
                    format: self.config.format,
                    width: transformed.width,
                    height: transformed.height,
                    input_bytes: item.size(),
                    output_bytes: transformed.data.len() as u64,
                    data: transformed.data,
                })
            }
            Ok(Err(e)) => {
                tracing::warn!(index = index, file = %item.file_name, error = %e, "Failed to transform image");
                TransformOutcome::failure(index, item.file_name.clone(), e.to_string())
            }
            Err(e) => {
                tracing::error!(index = index, file = %item.file_name, error = %e, "Transform task aborted");
                TransformOutcome::failure(index, item.file_name.clone(), ABORTED_REASON)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use serde_json::json;
    use std::io::Cursor;
    use webplab_core::OutputFormat;

    fn png_item(name: &str, width: u32, height: u32) -> BatchItem {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([1, 2, 3, 255])));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        BatchItem::new(name, Some("image/png".to_string()), Bytes::from(buffer))
    }

    #[tokio::test]
    async fn test_success_carries_names_and_sizes() {
        let config = TransformConfiguration::normalize(&json!({ "format": "jpeg" }));
        let worker = TransformWorker::new(Arc::new(config));
        let item = png_item("Summer Trip.PNG", 10, 6);

        let outcome = worker.transform(3, &item).await;
        let success = outcome.as_success().expect("success");
        assert_eq!(success.index, 3);
        assert_eq!(success.original_name, "Summer Trip.PNG");
        assert_eq!(success.safe_base_name, "summer-trip");
        assert_eq!(success.format, OutputFormat::Jpeg);
        assert_eq!(success.file_name(), "summer-trip.jpg");
        assert_eq!(success.input_bytes, item.size());
        assert_eq!(success.output_bytes, success.data.len() as u64);
    }

    #[tokio::test]
    async fn test_rename_pattern_uses_output_dimensions() {
        let config = TransformConfiguration::normalize(&json!({
            "format": "png",
            "width": 5,
            "renamePattern": "[name]-[width]x[height]"
        }));
        let worker = TransformWorker::new(Arc::new(config));

        let outcome = worker.transform(0, &png_item("cat.png", 10, 6)).await;
        assert_eq!(outcome.as_success().unwrap().safe_base_name, "cat-5x3");
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let worker = TransformWorker::new(Arc::new(TransformConfiguration::default()));
        let item = BatchItem::new("notes.txt", Some("text/plain".to_string()), Bytes::from_static(b"hi"));

        let outcome = worker.transform(1, &item).await;
        let failure = outcome.as_failure().expect("failure");
        assert_eq!(failure.index, 1);
        assert_eq!(failure.original_name, "notes.txt");
        assert_eq!(failure.reason, "Unsupported file. Images only.");
    }
}
