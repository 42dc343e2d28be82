mod client;

pub use client::CatalogClient;

use async_trait::async_trait;

use crate::models::MovieSummary;

/// Catalog failure classification
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Not found")]
    NotFound,

    #[error("Rate limited")]
    RateLimited,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("API error: status {0}")]
    Api(u16),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Source of movie metadata keyed by catalog id. The aggregation engine
/// only sees this trait, so tests can substitute a mock catalog.
#[async_trait]
pub trait MovieSource: Send + Sync {
    /// Fetch the summary for a single movie. Each call is independent;
    /// no ordering guarantee relative to other calls.
    async fn movie_summary(&self, id: i64) -> Result<MovieSummary, CatalogError>;
}
