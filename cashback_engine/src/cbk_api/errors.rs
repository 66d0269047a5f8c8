use thiserror::Error;

use crate::{
    db_types::Platform,
    traits::{LedgerError, MarketplaceError},
};

#[derive(Debug, Clone, Error)]
pub enum LinkApiError {
    #[error("The URL is not a supported marketplace product link: {0}")]
    UnsupportedPlatform(String),
    #[error("A {provider} link provider cannot convert {url}")]
    PlatformMismatch { provider: Platform, url: String },
    #[error("The affiliate link could not be generated. {0}")]
    LinkGeneration(MarketplaceError),
    #[error("{0}")]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, Clone, Error)]
pub enum SyncError {
    #[error("Could not fetch orders from {0}. {1}")]
    SourceUnavailable(Platform, MarketplaceError),
    #[error("The sync lease could not be managed. {0}")]
    Lease(#[from] LedgerError),
}
