use affiliate_tools::MarketplaceApiError;
use cashback_engine::{
    db_types::{Platform, ProductMetadata, RawOrderEvent},
    AffiliateLinkProvider,
    MarketplaceError,
    OrderSource,
};
use chrono::{DateTime, Utc};
use log::*;

use crate::{
    config::ServerConfig,
    integrations::{ShopeeIntegration, TikTokIntegration},
};

/// Any supported marketplace, so that the sync and link APIs can hold a mixed list of them.
#[derive(Clone)]
pub enum Marketplace {
    Shopee(ShopeeIntegration),
    TikTok(TikTokIntegration),
}

impl Marketplace {
    pub fn for_platform(platform: Platform, config: &ServerConfig) -> Result<Self, MarketplaceApiError> {
        match platform {
            Platform::Shopee => Ok(Self::Shopee(ShopeeIntegration::new(config.shopee.clone())?)),
            Platform::TikTok => Ok(Self::TikTok(TikTokIntegration::new(config.tiktok.clone())?)),
        }
    }

    /// The order sources enabled in the configuration.
    pub fn enabled_sources(config: &ServerConfig) -> Result<Vec<Self>, MarketplaceApiError> {
        let mut sources = Vec::with_capacity(2);
        if config.shopee_enabled {
            sources.push(Self::for_platform(Platform::Shopee, config)?);
        } else {
            info!("🛍️ Shopee sync is disabled");
        }
        if config.tiktok_enabled {
            sources.push(Self::for_platform(Platform::TikTok, config)?);
        } else {
            info!("🛍️ TikTok sync is disabled");
        }
        Ok(sources)
    }
}

impl OrderSource for Marketplace {
    fn platform(&self) -> Platform {
        match self {
            Self::Shopee(_) => Platform::Shopee,
            Self::TikTok(_) => Platform::TikTok,
        }
    }

    async fn fetch_recent(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<RawOrderEvent>, MarketplaceError> {
        match self {
            Self::Shopee(m) => m.fetch_recent(window_start, window_end).await,
            Self::TikTok(m) => m.fetch_recent(window_start, window_end).await,
        }
    }
}

impl AffiliateLinkProvider for Marketplace {
    fn platform(&self) -> Platform {
        OrderSource::platform(self)
    }

    fn extract_product_id(&self, url: &str) -> Option<String> {
        match self {
            Self::Shopee(m) => m.extract_product_id(url),
            Self::TikTok(m) => m.extract_product_id(url),
        }
    }

    async fn resolve_url(&self, url: &str) -> Result<String, MarketplaceError> {
        match self {
            Self::Shopee(m) => m.resolve_url(url).await,
            Self::TikTok(m) => m.resolve_url(url).await,
        }
    }

    async fn generate_link(&self, url: &str, tracking_ids: &[String]) -> Result<String, MarketplaceError> {
        match self {
            Self::Shopee(m) => m.generate_link(url, tracking_ids).await,
            Self::TikTok(m) => m.generate_link(url, tracking_ids).await,
        }
    }

    async fn fetch_product_metadata(&self, product_id: &str, resolved_url: &str) -> Option<ProductMetadata> {
        match self {
            Self::Shopee(m) => m.fetch_product_metadata(product_id, resolved_url).await,
            Self::TikTok(m) => m.fetch_product_metadata(product_id, resolved_url).await,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sources_follow_the_enabled_flags() {
        let config = ServerConfig { shopee_enabled: false, ..Default::default() };
        let sources = Marketplace::enabled_sources(&config).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(OrderSource::platform(&sources[0]), Platform::TikTok);
        let config = ServerConfig::default();
        let platforms =
            Marketplace::enabled_sources(&config).unwrap().iter().map(OrderSource::platform).collect::<Vec<_>>();
        assert_eq!(platforms, vec![Platform::Shopee, Platform::TikTok]);
    }
}
