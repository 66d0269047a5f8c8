use affiliate_tools::MarketplaceApiError;
use cashback_engine::{LedgerError, LinkApiError, SyncError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(#[from] LedgerError),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("Could not set up the marketplace client. {0}")]
    MarketplaceError(#[from] MarketplaceApiError),
    #[error("Sync failed. {0}")]
    SyncError(#[from] SyncError),
    #[error("Link conversion failed. {0}")]
    LinkError(#[from] LinkApiError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Could not serialize the result. {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// A marketplace record that could not be turned into an order event.
#[derive(Debug, Error)]
#[error("Could not convert marketplace order {order_id} into an order event. {reason}")]
pub struct OrderConversionError {
    pub order_id: String,
    pub reason: String,
}

impl OrderConversionError {
    pub fn new<S: Into<String>>(order_id: &str, reason: S) -> Self {
        Self { order_id: order_id.to_string(), reason: reason.into() }
    }
}
