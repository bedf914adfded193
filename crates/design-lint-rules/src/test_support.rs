//! Helpers shared by the rule tests.

use async_trait::async_trait;
use design_lint_core::{
    run_rule_set, CancellationToken, DocumentFile, IgnoreConfig, ImageMetadata,
    ImageMetadataCache, ImageMetadataError, ImageMetadataProvider, NoImageMetadata, ProcessedFile,
    Rule, RuleConfig, RuleSetConfig, RuleSetDefinition, RuleSetEnv, RuleSetResult, RunContext,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A document with one page holding `layers`.
pub(crate) fn page_document(layers: Value) -> Value {
    json!({
        "document": {
            "_class": "document",
            "do_objectID": "doc",
            "pages": [{"_class": "page", "do_objectID": "page", "name": "Page", "layers": layers}]
        },
        "meta": {},
        "user": {}
    })
}

pub(crate) async fn run_rule(rule: impl Rule + 'static, config: RuleConfig, contents: Value) -> RuleSetResult {
    run_rule_with_images(rule, config, contents, &NoImageMetadata).await
}

pub(crate) async fn run_rule_with_images(
    rule: impl Rule + 'static,
    config: RuleConfig,
    contents: Value,
    images: &dyn ImageMetadataProvider,
) -> RuleSetResult {
    run_rule_with_cancel(rule, config, contents, images, &CancellationToken::new()).await
}

pub(crate) async fn run_rule_with_cancel(
    rule: impl Rule + 'static,
    config: RuleConfig,
    contents: Value,
    images: &dyn ImageMetadataProvider,
    cancel: &CancellationToken,
) -> RuleSetResult {
    let name = rule.name();
    let definition = RuleSetDefinition::new("test")
        .with_rule(Arc::new(rule))
        .with_config(RuleSetConfig::new().rule(name, config));
    let file = DocumentFile::new(contents);
    let processed = ProcessedFile::new(&file, cancel);
    let env = RuleSetEnv::default();
    let images = ImageMetadataCache::new(images);
    let ignore = IgnoreConfig::new();
    let ctx = RunContext {
        processed: &processed,
        env: &env,
        cancel,
        images: &images,
        ignore: &ignore,
    };
    run_rule_set(&ctx, &definition).await.unwrap()
}

/// Image provider answering from a fixed table and counting lookups.
#[derive(Default)]
pub(crate) struct FixedImages {
    sizes: HashMap<String, (u32, u32)>,
    lookups: AtomicUsize,
    cancel_on_lookup: Option<CancellationToken>,
}

impl FixedImages {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, image_ref: &str, width: u32, height: u32) -> Self {
        self.sizes.insert(image_ref.to_string(), (width, height));
        self
    }

    /// Cancels `cancel` from inside every lookup.
    pub(crate) fn cancelling(mut self, cancel: CancellationToken) -> Self {
        self.cancel_on_lookup = Some(cancel);
        self
    }

    pub(crate) fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageMetadataProvider for FixedImages {
    async fn image_metadata(
        &self,
        image_ref: &str,
        _filepath: Option<&Path>,
    ) -> Result<ImageMetadata, ImageMetadataError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(cancel) = &self.cancel_on_lookup {
            cancel.cancel();
        }
        let (width, height) = self.sizes.get(image_ref).copied().ok_or_else(|| ImageMetadataError {
            image_ref: image_ref.to_string(),
            message: "unknown image".to_string(),
        })?;
        Ok(ImageMetadata {
            width,
            height,
            image_ref: image_ref.to_string(),
        })
    }
}
