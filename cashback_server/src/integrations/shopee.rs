use affiliate_tools::{
    helpers::implied_rate,
    links::{is_short_link, shopee_product_ref},
    shopee_objects::{ShopeeConversion, ShopeeConversionOrder},
    ShopeeApi,
    ShopeeConfig,
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
pub struct ShopeeIntegration {
    api: ShopeeApi,
}

impl ShopeeIntegration {
    pub fn new(config: ShopeeConfig) -> Result<Self, affiliate_tools::MarketplaceApiError> {
        Ok(Self { api: ShopeeApi::new(config)? })
    }

    pub fn api(&self) -> &ShopeeApi {
        &self.api
    }
}

/// One order event per marketplace order inside the conversion.
///
/// Shopee reports commission as an amount per item rather than a rate, so the order's rate is derived from the total
/// commission and truncated to whole basis points.
pub fn order_events_from_conversion(
    conversion: &ShopeeConversion,
) -> Vec<Result<RawOrderEvent, OrderConversionError>> {
    conversion.orders.iter().map(|order| order_event_from_shopee(conversion, order)).collect()
}

pub fn order_event_from_shopee(
    conversion: &ShopeeConversion,
    order: &ShopeeConversionOrder,
) -> Result<RawOrderEvent, OrderConversionError> {
    trace!("🛍️ Converting Shopee order {} of conversion {}", order.order_id, conversion.conversion_id);
    let total_amount = order.total_amount().map_err(|e| OrderConversionError::new(&order.order_id, e.to_string()))?;
    let commission =
        order.total_commission().map_err(|e| OrderConversionError::new(&order.order_id, e.to_string()))?;
    let first_item = order.first_item();
    Ok(RawOrderEvent {
        platform: Platform::Shopee,
        external_order_id: order.order_id.clone(),
        tracking_id: conversion.tracking_id(),
        external_item_id: first_item.map(|i| i.item_id.clone()),
        total_amount,
        commission_rate: implied_rate(commission, total_amount)
            .map_err(|e| OrderConversionError::new(&order.order_id, e.to_string()))?,
        external_status: order.order_status.clone(),
        created_at: conversion.purchase_time,
        product_name: first_item.and_then(|i| i.item_name.clone()),
        product_image: first_item.and_then(|i| i.image_url.clone()),
        quantity: Some(order.quantity()),
    })
}

impl OrderSource for ShopeeIntegration {
    fn platform(&self) -> Platform {
        Platform::Shopee
    }

    async fn fetch_recent(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<RawOrderEvent>, MarketplaceError> {
        let conversions = self
            .api
            .conversion_report(window_start, window_end)
            .await
            .map_err(|e| marketplace_error(Platform::Shopee, e))?;
        let events = conversions
            .iter()
            .flat_map(order_events_from_conversion)
            .filter_map(|r| r.map_err(|e| error!("🛍️ Skipping Shopee order. {e}")).ok())
            .collect::<Vec<_>>();
        debug!("🛍️ {} Shopee conversions yielded {} order events", conversions.len(), events.len());
        Ok(events)
    }
}

impl AffiliateLinkProvider for ShopeeIntegration {
    fn platform(&self) -> Platform {
        Platform::Shopee
    }

    fn extract_product_id(&self, url: &str) -> Option<String> {
        shopee_product_ref(url).map(|r| r.item_id)
    }

    async fn resolve_url(&self, url: &str) -> Result<String, MarketplaceError> {
        if !is_short_link(url) {
            return Ok(url.to_string());
        }
        self.api.resolve_short_link(url).await.map_err(|e| marketplace_error(Platform::Shopee, e))
    }

    async fn generate_link(&self, url: &str, tracking_ids: &[String]) -> Result<String, MarketplaceError> {
        self.api.generate_short_link(url, tracking_ids).await.map_err(|e| marketplace_error(Platform::Shopee, e))
    }

    async fn fetch_product_metadata(&self, product_id: &str, resolved_url: &str) -> Option<ProductMetadata> {
        let shop_id = shopee_product_ref(resolved_url).filter(|r| r.item_id == product_id).map(|r| r.shop_id);
        match self.api.product_offer(product_id, shop_id.as_deref()).await {
            Ok(Some(offer)) => Some(ProductMetadata {
                product_id: product_id.to_string(),
                name: offer.product_name.clone().filter(|s| !s.is_empty()),
                image: offer.image_url.clone().filter(|s| !s.is_empty()),
                price_min: offer.min_price(),
                commission_rate: offer.commission(),
            }),
            Ok(None) => {
                debug!("🛍️ Shopee has no offer for item {product_id}");
                None
            },
            Err(e) => {
                warn!("🛍️ Could not fetch the Shopee offer for item {product_id}. {e}");
                None
            },
        }
    }
}

#[cfg(test)]
mod test {
    use affiliate_tools::shopee_objects::ShopeeConversionItem;
    use cbk_common::{Rate, Vnd};

    use super::*;

    fn item(id: &str, price: &str, qty: i64, commission: Option<&str>) -> ShopeeConversionItem {
        ShopeeConversionItem {
            item_id: id.into(),
            item_name: Some(format!("Item {id}")),
            item_price: price.into(),
            qty,
            item_total_commission: commission.map(String::from),
            image_url: None,
        }
    }

    #[test]
    fn conversion_to_events() {
        let conversion = ShopeeConversion {
            conversion_id: "c1".into(),
            purchase_time: 1_725_000_000,
            total_commission: Some("13000".into()),
            utm_content: Some("U1----".into()),
            orders: vec![
                ShopeeConversionOrder {
                    order_id: "SO1".into(),
                    order_status: "PENDING".into(),
                    items: vec![item("11", "50000", 2, Some("10000"))],
                },
                ShopeeConversionOrder {
                    order_id: "SO2".into(),
                    order_status: "COMPLETED".into(),
                    items: vec![item("12", "30000", 1, Some("3000")), item("13", "oops", 1, None)],
                },
            ],
        };
        let events = order_events_from_conversion(&conversion);
        assert_eq!(events.len(), 2);
        let first = events[0].as_ref().unwrap();
        assert_eq!(first.platform, Platform::Shopee);
        assert_eq!(first.external_order_id, "SO1");
        assert_eq!(first.tracking_id.as_deref(), Some("U1"));
        assert_eq!(first.external_item_id.as_deref(), Some("11"));
        assert_eq!(first.total_amount, Vnd::from(100_000));
        assert_eq!(first.commission_rate, Rate::from_bps(1000));
        assert_eq!(first.created_at, 1_725_000_000);
        assert_eq!(first.quantity, Some(2));
        assert_eq!(first.product_name.as_deref(), Some("Item 11"));
        let err = events[1].as_ref().unwrap_err();
        assert_eq!(err.order_id, "SO2");
    }

    #[test]
    fn product_ids() {
        let shopee = ShopeeIntegration::new(ShopeeConfig::default()).unwrap();
        assert_eq!(shopee.extract_product_id("https://shopee.vn/Son-i.123.456").as_deref(), Some("456"));
        assert_eq!(shopee.extract_product_id("https://shopee.vn/"), None);
    }
}
