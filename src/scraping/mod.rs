// Chamber page retrieval and seat-count extraction
// Fetching is isolated behind `PageSource` so extraction runs against literal page text in tests

pub mod fetcher;
pub mod rules;

use async_trait::async_trait;

use crate::error::FetchError;

pub use fetcher::{FetchOptions, HttpFetcher};
pub use rules::{LabelRule, RuleSet, Strategy};

/// Anything that can hand back the text of a page
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;
}
