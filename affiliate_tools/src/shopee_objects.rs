use cbk_common::{Rate, Vnd};
use serde::{Deserialize, Serialize};

use crate::{
    helpers::{optional_string_or_number, parse_amount, parse_fraction_rate, string_or_number},
    MarketplaceApiError,
};

/// A `productOfferV2` node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopeeProductOffer {
    #[serde(deserialize_with = "string_or_number")]
    pub item_id: String,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub price_min: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub price_max: Option<String>,
    /// A fraction, e.g. `"0.05"`.
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub commission_rate: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub seller_commission_rate: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub offer_link: Option<String>,
}

impl ShopeeProductOffer {
    pub fn min_price(&self) -> Option<Vnd> {
        self.price_min.as_deref().and_then(|p| parse_amount(p).ok()).filter(|p| p.is_positive())
    }

    pub fn commission(&self) -> Option<Rate> {
        self.commission_rate.as_deref().and_then(|r| parse_fraction_rate(r).ok()).filter(|r| !r.is_zero())
    }
}

/// A `conversionReport` node. One conversion can hold several marketplace orders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopeeConversion {
    #[serde(deserialize_with = "string_or_number")]
    pub conversion_id: String,
    /// Epoch seconds
    pub purchase_time: i64,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub total_commission: Option<String>,
    /// The sub ids of the affiliate link, joined with `-`. Unused trailing slots are left empty.
    #[serde(default)]
    pub utm_content: Option<String>,
    #[serde(default)]
    pub orders: Vec<ShopeeConversionOrder>,
}

impl ShopeeConversion {
    /// The first sub id we attached when generating the link, if any.
    ///
    /// Shopee reports the sub ids as `sub1-sub2-…`, padded with dashes. Only the padding is stripped, so a tracking id
    /// that itself contains dashes survives as long as it was the only sub id.
    pub fn tracking_id(&self) -> Option<String> {
        self.utm_content.as_deref().map(|s| s.trim().trim_end_matches('-')).filter(|s| !s.is_empty()).map(String::from)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopeeConversionOrder {
    #[serde(deserialize_with = "string_or_number")]
    pub order_id: String,
    pub order_status: String,
    #[serde(default)]
    pub items: Vec<ShopeeConversionItem>,
}

impl ShopeeConversionOrder {
    pub fn total_amount(&self) -> Result<Vnd, MarketplaceApiError> {
        let mut total = Vnd::default();
        for item in &self.items {
            total = parse_amount(&item.item_price)?
                .checked_mul(item.qty.max(1))
                .and_then(|line| total.checked_add(line))
                .ok_or_else(|| overflow(&self.order_id))?;
        }
        Ok(total)
    }

    pub fn total_commission(&self) -> Result<Vnd, MarketplaceApiError> {
        let mut total = Vnd::default();
        for item in &self.items {
            if let Some(commission) = &item.item_total_commission {
                total = total.checked_add(parse_amount(commission)?).ok_or_else(|| overflow(&self.order_id))?;
            }
        }
        Ok(total)
    }

    pub fn quantity(&self) -> i64 {
        self.items.iter().fold(0i64, |n, i| n.saturating_add(i.qty.max(1))).max(1)
    }

    pub fn first_item(&self) -> Option<&ShopeeConversionItem> {
        self.items.first()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopeeConversionItem {
    #[serde(deserialize_with = "string_or_number")]
    pub item_id: String,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub item_price: String,
    #[serde(default)]
    pub qty: i64,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub item_total_commission: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub scroll_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionReportPage {
    #[serde(default)]
    pub nodes: Vec<ShopeeConversion>,
    #[serde(default)]
    pub page_info: PageInfo,
}

fn overflow(order_id: &str) -> MarketplaceApiError {
    MarketplaceApiError::InvalidCurrencyAmount(format!("The totals of order {order_id} are out of range"))
}

#[cfg(test)]
mod test {
    use super::*;

    const REPORT: &str = r#"{
        "nodes": [{
            "conversionId": 7700123,
            "purchaseTime": 1725000000,
            "totalCommission": "15000",
            "utmContent": "8f14e45f-ceea-4e7a-9e2b-3f1d2c4b5a6e----",
            "orders": [{
                "orderId": "240830ABCDEF",
                "orderStatus": "PENDING",
                "items": [
                    { "itemId": 17638112223, "itemName": "Áo thun", "itemPrice": "75000", "qty": 2,
                      "itemTotalCommission": "10500" },
                    { "itemId": 17638112224, "itemName": "Mũ", "itemPrice": 30000, "qty": 1,
                      "itemTotalCommission": 4500 }
                ]
            }]
        }],
        "pageInfo": { "hasNextPage": true, "scrollId": "scroll-2" }
    }"#;

    #[test]
    fn conversion_report() {
        let page = serde_json::from_str::<ConversionReportPage>(REPORT).unwrap();
        assert!(page.page_info.has_next_page);
        assert_eq!(page.page_info.scroll_id.as_deref(), Some("scroll-2"));
        let conversion = &page.nodes[0];
        assert_eq!(conversion.conversion_id, "7700123");
        assert_eq!(conversion.tracking_id().as_deref(), Some("8f14e45f-ceea-4e7a-9e2b-3f1d2c4b5a6e"));
        let order = &conversion.orders[0];
        assert_eq!(order.total_amount().unwrap(), Vnd::from(180_000));
        assert_eq!(order.total_commission().unwrap(), Vnd::from(15_000));
        assert_eq!(order.quantity(), 3);
        assert_eq!(order.first_item().unwrap().item_id, "17638112223");
    }

    #[test]
    fn overflowing_totals_are_errors() {
        let item = |price: &str, qty: i64, commission: &str| ShopeeConversionItem {
            item_id: "1".into(),
            item_price: price.into(),
            qty,
            item_total_commission: Some(commission.into()),
            ..Default::default()
        };
        let order = ShopeeConversionOrder {
            order_id: "O1".into(),
            order_status: "PENDING".into(),
            items: vec![item("9223372036854775807", 2, "9223372036854775807"), item("1", 1, "1")],
        };
        assert!(matches!(order.total_amount(), Err(MarketplaceApiError::InvalidCurrencyAmount(_))));
        assert!(matches!(order.total_commission(), Err(MarketplaceApiError::InvalidCurrencyAmount(_))));
        let order = ShopeeConversionOrder { items: vec![item("1", i64::MAX, "0"), item("1", 5, "0")], ..order };
        assert_eq!(order.quantity(), i64::MAX);
    }

    #[test]
    fn missing_tracking() {
        let conversion = ShopeeConversion { utm_content: Some("-----".into()), ..Default::default() };
        assert_eq!(conversion.tracking_id(), None);
        assert_eq!(ShopeeConversion::default().tracking_id(), None);
    }

    #[test]
    fn product_offer() {
        let offer = serde_json::from_str::<ShopeeProductOffer>(
            r#"{"itemId": 1, "productName": "Son", "priceMin": "120000", "priceMax": "150000",
                "commissionRate": "0.05", "imageUrl": "https://cf.shopee.vn/file/a"}"#,
        )
        .unwrap();
        assert_eq!(offer.min_price(), Some(Vnd::from(120_000)));
        assert_eq!(offer.commission(), Some(Rate::from_bps(500)));
        let offer = serde_json::from_str::<ShopeeProductOffer>(r#"{"itemId": "2", "priceMin": "0"}"#).unwrap();
        assert_eq!(offer.min_price(), None);
        assert_eq!(offer.commission(), None);
    }
}
