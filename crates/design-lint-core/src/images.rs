//! Image metadata lookups, memoized per run.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Dimensions of an image packed in the document archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// Image reference inside the archive.
    pub image_ref: String,
}

/// Image metadata could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to read image metadata for `{image_ref}`: {message}")]
pub struct ImageMetadataError {
    /// Image reference that failed.
    pub image_ref: String,
    /// Reason.
    pub message: String,
}

/// Reads image metadata from the document archive.
///
/// Implementations may do I/O; this is the only suspension point rule
/// checks have.
#[async_trait]
pub trait ImageMetadataProvider: Send + Sync {
    /// Reads the dimensions of `image_ref`. `filepath` is the document's path, when known.
    async fn image_metadata(
        &self,
        image_ref: &str,
        filepath: Option<&Path>,
    ) -> Result<ImageMetadata, ImageMetadataError>;
}

/// Provider for hosts without archive access. Every lookup fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImageMetadata;

#[async_trait]
impl ImageMetadataProvider for NoImageMetadata {
    async fn image_metadata(
        &self,
        image_ref: &str,
        _filepath: Option<&Path>,
    ) -> Result<ImageMetadata, ImageMetadataError> {
        Err(ImageMetadataError {
            image_ref: image_ref.to_string(),
            message: "image metadata is not available in this host".to_string(),
        })
    }
}

/// Memoizing wrapper around a provider. Successful lookups are cached for
/// the lifetime of the wrapper; failures are not.
pub struct ImageMetadataCache<'a> {
    provider: &'a dyn ImageMetadataProvider,
    entries: Mutex<HashMap<String, ImageMetadata>>,
}

impl<'a> ImageMetadataCache<'a> {
    /// Wraps a provider.
    #[must_use]
    pub fn new(provider: &'a dyn ImageMetadataProvider) -> Self {
        Self {
            provider,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the metadata of `image_ref`, asking the provider at most once per success.
    ///
    /// # Errors
    ///
    /// Propagates the provider's failure.
    pub async fn get(
        &self,
        image_ref: &str,
        filepath: Option<&Path>,
    ) -> Result<ImageMetadata, ImageMetadataError> {
        let cached = self.lock().get(image_ref).cloned();
        if let Some(hit) = cached {
            return Ok(hit);
        }

        debug!("Reading image metadata for {image_ref}");
        let metadata = self.provider.image_metadata(image_ref, filepath).await?;
        self.lock()
            .insert(image_ref.to_string(), metadata.clone());
        Ok(metadata)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, ImageMetadata>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ImageMetadataCache<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageMetadataCache")
            .field("entries", &self.lock().len())
            .finish_non_exhaustive()
    }
}
