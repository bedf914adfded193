//! Rule to limit the pixel dimensions of embedded bitmaps.
//!
//! # Rationale
//!
//! Oversized bitmaps bloat the document and slow down every editor that
//! opens it. Images should be exported at the size they are displayed.
//!
//! # Configuration
//!
//! - `maxWidth`: maximum pixel width
//! - `maxHeight`: maximum pixel height
//!
//! Reading image dimensions needs archive access through the host's
//! [`ImageMetadataProvider`](design_lint_core::ImageMetadataProvider). A
//! failed lookup ends the check with a rule error.

use async_trait::async_trait;
use design_lint_core::{CheckError, NodeClass, OptionSchema, Rule, RuleConfig, RuleUtils, SchemaError};
use tracing::debug;

/// Rule name for images-max-dimensions.
pub const NAME: &str = "images-max-dimensions";

/// Option holding the maximum width.
pub const MAX_WIDTH: &str = "maxWidth";

/// Option holding the maximum height.
pub const MAX_HEIGHT: &str = "maxHeight";

const IMAGE_KEY: &str = "image";
const REF_KEY: &str = "_ref";

/// Limits the pixel size of bitmap layers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImagesMaxDimensions;

impl ImagesMaxDimensions {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Rule for ImagesMaxDimensions {
    fn name(&self) -> &'static str {
        NAME
    }

    fn title(&self, config: &RuleConfig) -> String {
        match (config.option(MAX_WIDTH), config.option(MAX_HEIGHT)) {
            (Some(width), Some(height)) => format!("Images should be at most {width}x{height}"),
            _ => "Images should not be oversized".to_string(),
        }
    }

    fn options(&self) -> Result<Vec<OptionSchema>, SchemaError> {
        Ok(vec![
            OptionSchema::integer(MAX_WIDTH, "Maximum width", "Maximum pixel width")?
                .with_range(Some(1.0), None),
            OptionSchema::integer(MAX_HEIGHT, "Maximum height", "Maximum pixel height")?
                .with_range(Some(1.0), None),
        ])
    }

    async fn check(&self, utils: &RuleUtils<'_>) -> Result<(), CheckError> {
        let max_width: u32 = utils.option(MAX_WIDTH)?;
        let max_height: u32 = utils.option(MAX_HEIGHT)?;

        // Lazy iteration stops before the next lookup once the run is cancelled.
        for bitmap in utils.objects().of(NodeClass::Bitmap) {
            let Some(image_ref) = bitmap
                .get(IMAGE_KEY)
                .and_then(|image| image.get(REF_KEY))
                .and_then(|r| r.as_str())
            else {
                debug!("Bitmap {:?} has no image reference", bitmap.id());
                continue;
            };

            let metadata = utils.get_image_metadata(image_ref).await?;
            if metadata.width > max_width || metadata.height > max_height {
                utils.report(
                    format!(
                        "Image is {}x{}, larger than {max_width}x{max_height}",
                        metadata.width, metadata.height
                    ),
                    &[bitmap],
                )?;
            }
        }
        Ok(())
    }
}
