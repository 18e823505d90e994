use crate::error::ConfigError;
use scraper::{Html, Selector};

/// Selector used when a resource does not name one: the whole document body
pub const DEFAULT_SELECTOR: &str = "body";

pub fn default_selector() -> String {
    DEFAULT_SELECTOR.to_string()
}

/// Picks the watched region out of a fetched page via a CSS selector.
#[derive(Debug, Clone)]
pub struct Extractor {
    source: String,
    selector: Selector,
}

impl Extractor {
    pub fn new(selector: &str) -> Result<Self, ConfigError> {
        let compiled = Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
            selector: selector.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            source: selector.to_string(),
            selector: compiled,
        })
    }

    pub fn selector(&self) -> &str {
        &self.source
    }

    /// Inner HTML of the first match, or an empty string when nothing matches.
    pub fn extract(&self, markup: &str) -> String {
        let document = Html::parse_document(markup);
        document
            .select(&self.selector)
            .next()
            .map(|element| element.inner_html())
            .unwrap_or_default()
    }
}
