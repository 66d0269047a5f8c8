use affiliate_tools::{
    helpers::{parse_amount, parse_percent_rate},
    links::{is_short_link, og_info, tiktok_product_id},
    tiktok_objects::{ShowcaseProduct, TikTokOrder},
    MarketplaceApiError,
    TikTokApi,
    TikTokConfig,
};
use cashback_engine::{
    db_types::{Platform, ProductMetadata, RawOrderEvent},
    AffiliateLinkProvider,
    MarketplaceError,
    OrderSource,
};
use chrono::{DateTime, Utc};
use log::*;

use crate::{errors::OrderConversionError, integrations::marketplace_error};

#[derive(Clone)]
pub struct TikTokIntegration {
    api: TikTokApi,
}

impl TikTokIntegration {
    pub fn new(config: TikTokConfig) -> Result<Self, MarketplaceApiError> {
        Ok(Self { api: TikTokApi::new(config)? })
    }

    pub fn api(&self) -> &TikTokApi {
        &self.api
    }

    async fn showcase_product(&self, product_id: &str) -> Result<Option<ShowcaseProduct>, MarketplaceApiError> {
        self.api.add_to_showcase(product_id).await?;
        self.api.showcase_product(product_id).await
    }
}

pub fn order_event_from_tiktok(order: &TikTokOrder) -> Result<RawOrderEvent, OrderConversionError> {
    trace!("🛍️ Converting TikTok order {}", order.order_id);
    let total_amount = order
        .total_amount
        .as_deref()
        .map(parse_amount)
        .transpose()
        .map_err(|e| OrderConversionError::new(&order.order_id, e.to_string()))?
        .unwrap_or_default();
    let commission_rate = order
        .commission_rate
        .as_deref()
        .map(parse_percent_rate)
        .transpose()
        .map_err(|e| OrderConversionError::new(&order.order_id, e.to_string()))?
        .unwrap_or_default();
    Ok(RawOrderEvent {
        platform: Platform::TikTok,
        external_order_id: order.order_id.clone(),
        tracking_id: order.tracking_id(),
        external_item_id: order.product_id.clone(),
        total_amount,
        commission_rate,
        external_status: order.order_status.clone(),
        created_at: order.create_time.unwrap_or_else(|| Utc::now().timestamp()),
        product_name: order.product_name.clone(),
        product_image: order.product_image.clone(),
        quantity: order.quantity,
    })
}

impl OrderSource for TikTokIntegration {
    fn platform(&self) -> Platform {
        Platform::TikTok
    }

    async fn fetch_recent(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<RawOrderEvent>, MarketplaceError> {
        let orders = self
            .api
            .search_orders(window_start, window_end)
            .await
            .map_err(|e| marketplace_error(Platform::TikTok, e))?;
        let events = orders
            .iter()
            .map(order_event_from_tiktok)
            .filter_map(|r| r.map_err(|e| error!("🛍️ Skipping TikTok order. {e}")).ok())
            .collect::<Vec<_>>();
        debug!("🛍️ {} TikTok orders yielded {} order events", orders.len(), events.len());
        Ok(events)
    }
}

impl AffiliateLinkProvider for TikTokIntegration {
    fn platform(&self) -> Platform {
        Platform::TikTok
    }

    fn extract_product_id(&self, url: &str) -> Option<String> {
        tiktok_product_id(url)
    }

    async fn resolve_url(&self, url: &str) -> Result<String, MarketplaceError> {
        if !is_short_link(url) {
            return Ok(url.to_string());
        }
        self.api.resolve_short_link(url).await.map_err(|e| marketplace_error(Platform::TikTok, e))
    }

    /// Uses the creator API when it is configured and the URL names a product. Otherwise, or if the API call fails,
    /// the link is built locally and carries the tracking id as `sub1`. This never fails.
    async fn generate_link(&self, url: &str, tracking_ids: &[String]) -> Result<String, MarketplaceError> {
        if self.api.config().is_configured() {
            if let Some(product_id) = tiktok_product_id(url) {
                match self.api.generate_affiliate_link(&product_id).await {
                    Ok(link) => return Ok(link),
                    Err(e) => {
                        warn!("🛍️ TikTok link generation failed for product {product_id}. Using a fallback link. {e}")
                    },
                }
            }
        }
        let link = self.api.fallback_link(url, tracking_ids.first().map(String::as_str));
        debug!("🛍️ Built fallback TikTok link {link}");
        Ok(link)
    }

    /// Title and image come from the share link's `og_info`; price and commission from the creator showcase. Either
    /// half may be missing.
    async fn fetch_product_metadata(&self, product_id: &str, resolved_url: &str) -> Option<ProductMetadata> {
        let mut metadata = og_info(resolved_url).map(|(name, image)| ProductMetadata {
            product_id: product_id.to_string(),
            name,
            image,
            ..Default::default()
        });
        if !self.api.config().is_configured() {
            return metadata;
        }
        match self.showcase_product(product_id).await {
            Ok(Some(product)) => {
                let base = metadata
                    .take()
                    .unwrap_or_else(|| ProductMetadata { product_id: product_id.to_string(), ..Default::default() });
                metadata = Some(ProductMetadata {
                    product_id: base.product_id,
                    name: product.title.clone().filter(|s| !s.is_empty()).or(base.name),
                    image: product.image().or(base.image),
                    price_min: product.min_price(),
                    commission_rate: product.commission(),
                });
            },
            Ok(None) => debug!("🛍️ No showcase entry for TikTok product {product_id}"),
            Err(e) => warn!("🛍️ Could not fetch showcase details for TikTok product {product_id}. {e}"),
        }
        metadata
    }
}

#[cfg(test)]
mod test {
    use affiliate_tools::tiktok_objects::TikTokTrackingInfo;
    use cbk_common::{Rate, Vnd};

    use super::*;

    #[test]
    fn order_to_event() {
        let order = TikTokOrder {
            order_id: "577001234".into(),
            order_status: "AWAITING_SHIPMENT".into(),
            sub_ids: vec![],
            tracking_info: Some(TikTokTrackingInfo { sub_id: Some("U1".into()) }),
            product_id: Some("1729587".into()),
            product_name: Some("Son môi".into()),
            product_image: None,
            quantity: Some(2),
            total_amount: Some("100000".into()),
            commission_rate: Some("10".into()),
            create_time: Some(1_725_000_000),
        };
        let event = order_event_from_tiktok(&order).unwrap();
        assert_eq!(event.platform, Platform::TikTok);
        assert_eq!(event.tracking_id.as_deref(), Some("U1"));
        assert_eq!(event.external_item_id.as_deref(), Some("1729587"));
        assert_eq!(event.total_amount, Vnd::from(100_000));
        assert_eq!(event.commission_rate, Rate::from_bps(1000));
        assert_eq!(event.external_status, "AWAITING_SHIPMENT");
        assert_eq!(event.created_at, 1_725_000_000);
    }

    #[test]
    fn missing_amounts_are_zero_but_garbage_is_an_error() {
        let order = TikTokOrder { order_id: "1".into(), order_status: "UNPAID".into(), ..Default::default() };
        let event = order_event_from_tiktok(&order).unwrap();
        assert_eq!(event.total_amount, Vnd::from(0));
        assert_eq!(event.commission_rate, Rate::ZERO);
        let order = TikTokOrder { total_amount: Some("n/a".into()), ..order };
        assert!(order_event_from_tiktok(&order).is_err());
    }

    #[tokio::test]
    async fn fallback_links_without_credentials() {
        let config = TikTokConfig { app_key: "app123".into(), ..Default::default() };
        let tiktok = TikTokIntegration::new(config).unwrap();
        let url = "https://shop.tiktok.com/view/product/1729587?_r=1&og_info=%7B%22title%22%3A%22Kem%22%7D";
        let link = tiktok.generate_link(url, &["U1".to_string()]).await.unwrap();
        assert!(link.contains("affiliate_id=app123"));
        assert!(link.contains("sub1=U1"));
        assert!(!link.contains("_r="));
        let meta = tiktok.fetch_product_metadata("1729587", url).await.unwrap();
        assert_eq!(meta.name.as_deref(), Some("Kem"));
        assert_eq!(meta.price_min, None);
        assert_eq!(tiktok.resolve_url(url).await.unwrap(), url);
    }
}
