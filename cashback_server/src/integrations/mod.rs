//! Marketplace integrations.
//!
//! Each marketplace client from `affiliate_tools` is wrapped so that it speaks the engine's [`OrderSource`] and
//! [`AffiliateLinkProvider`] traits: payloads become [`RawOrderEvent`]s and client errors become
//! [`MarketplaceError`]s.
//!
//! [`OrderSource`]: cashback_engine::OrderSource
//! [`AffiliateLinkProvider`]: cashback_engine::AffiliateLinkProvider
//! [`RawOrderEvent`]: cashback_engine::db_types::RawOrderEvent
use affiliate_tools::MarketplaceApiError;
use cashback_engine::{db_types::Platform, MarketplaceError};

pub mod ledger_events;
pub mod marketplace;
pub mod shopee;
pub mod tiktok;

pub use marketplace::Marketplace;
pub use shopee::ShopeeIntegration;
pub use tiktok::TikTokIntegration;

pub fn marketplace_error(platform: Platform, e: MarketplaceApiError) -> MarketplaceError {
    match e {
        MarketplaceApiError::MissingCredentials => MarketplaceError::NotConfigured(platform),
        MarketplaceApiError::RestRequestError(_) | MarketplaceApiError::RestResponseError(_) => {
            MarketplaceError::Unavailable(e.to_string())
        },
        MarketplaceApiError::QueryError { .. } |
        MarketplaceApiError::ApiError { .. } |
        MarketplaceApiError::GraphQLError(_) |
        MarketplaceApiError::InvalidGraphQL(_) => MarketplaceError::Rejected(e.to_string()),
        MarketplaceApiError::Initialization(_) |
        MarketplaceApiError::JsonError(_) |
        MarketplaceApiError::EmptyResponse |
        MarketplaceApiError::InvalidCurrencyAmount(_) |
        MarketplaceApiError::InvalidRate(_) |
        MarketplaceApiError::InvalidUrl(_) => MarketplaceError::InvalidResponse(e.to_string()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn error_mapping() {
        let e = marketplace_error(Platform::TikTok, MarketplaceApiError::MissingCredentials);
        assert!(matches!(e, MarketplaceError::NotConfigured(Platform::TikTok)));
        let e = marketplace_error(Platform::Shopee, MarketplaceApiError::RestResponseError("timed out".into()));
        assert!(matches!(e, MarketplaceError::Unavailable(_)));
        let e = marketplace_error(Platform::TikTok, MarketplaceApiError::ApiError { code: 105002, message: "".into() });
        assert!(matches!(e, MarketplaceError::Rejected(_)));
        let e = marketplace_error(Platform::Shopee, MarketplaceApiError::EmptyResponse);
        assert!(matches!(e, MarketplaceError::InvalidResponse(_)));
    }
}
