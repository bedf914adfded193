//! Rule to limit the number of pages in a document.
//!
//! # Configuration
//!
//! - `maxPages`: maximum number of pages

use async_trait::async_trait;
use design_lint_core::{CheckError, OptionSchema, Rule, RuleConfig, RuleUtils, SchemaError};

/// Rule name for pages-max.
pub const NAME: &str = "pages-max";

/// Option holding the maximum page count.
pub const MAX_PAGES: &str = "maxPages";

/// Reports documents with too many pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct PagesMax;

impl PagesMax {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Rule for PagesMax {
    fn name(&self) -> &'static str {
        NAME
    }

    fn title(&self, config: &RuleConfig) -> String {
        match config.option(MAX_PAGES) {
            Some(max) => format!("Documents should have at most {max} pages"),
            None => "Documents should not have too many pages".to_string(),
        }
    }

    fn options(&self) -> Result<Vec<OptionSchema>, SchemaError> {
        Ok(vec![OptionSchema::integer(
            MAX_PAGES,
            "Maximum pages",
            "Maximum number of pages in the document",
        )?
        .with_range(Some(1.0), None)])
    }

    async fn check(&self, utils: &RuleUtils<'_>) -> Result<(), CheckError> {
        let max_pages: usize = utils.option(MAX_PAGES)?;
        // Ignored pages still count towards the total.
        let pages = utils.processed().pages().len();
        if pages > max_pages {
            utils.report(format!("Document has {pages} pages, more than {max_pages}"), &[])?;
        }
        Ok(())
    }
}
