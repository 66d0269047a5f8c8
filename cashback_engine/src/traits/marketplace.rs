use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{Platform, ProductMetadata, RawOrderEvent};

#[derive(Debug, Clone, Error)]
pub enum MarketplaceError {
    #[error("The {0} API is not configured")]
    NotConfigured(Platform),
    #[error("The marketplace could not be reached. {0}")]
    Unavailable(String),
    #[error("The marketplace rejected the request. {0}")]
    Rejected(String),
    #[error("The marketplace response could not be understood. {0}")]
    InvalidResponse(String),
}

/// A marketplace order API that reports purchases made through affiliate links.
#[allow(async_fn_in_trait)]
pub trait OrderSource {
    fn platform(&self) -> Platform;

    /// Fetches every purchase event that the marketplace reports between `window_start` and `window_end`.
    ///
    /// Any failure fails the whole fetch. Partial results are never returned.
    async fn fetch_recent(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<RawOrderEvent>, MarketplaceError>;
}

/// Rewrites product URLs into affiliate-tracked links for one marketplace.
#[allow(async_fn_in_trait)]
pub trait AffiliateLinkProvider {
    fn platform(&self) -> Platform;

    /// Pulls the marketplace product id out of a (resolved) product URL.
    fn extract_product_id(&self, url: &str) -> Option<String>;

    /// Expands share links (e.g. `vt.tiktok.com/...`) into the full product URL. The default implementation returns
    /// the URL unchanged.
    async fn resolve_url(&self, url: &str) -> Result<String, MarketplaceError> {
        Ok(url.to_string())
    }

    /// Produces a shareable affiliate URL that carries `tracking_ids` back to us on every resulting order.
    async fn generate_link(&self, url: &str, tracking_ids: &[String]) -> Result<String, MarketplaceError>;

    /// Best-effort product details. `None` when nothing useful could be found.
    async fn fetch_product_metadata(&self, product_id: &str, resolved_url: &str) -> Option<ProductMetadata>;
}
