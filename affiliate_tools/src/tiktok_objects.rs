use cbk_common::{Rate, Vnd};
use serde::{Deserialize, Serialize};

use crate::helpers::{optional_string_or_number, parse_amount, parse_percent_rate, string_or_number};

/// Every TikTok Shop response is wrapped in this envelope. `code == 0` means success.
#[derive(Debug, Clone, Deserialize)]
pub struct TikTokResponse<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TikTokOrderPage {
    #[serde(default)]
    pub orders: Vec<TikTokOrder>,
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub total_count: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TikTokTrackingInfo {
    #[serde(default)]
    pub sub_id: Option<String>,
}

/// An affiliate order as reported by `affiliate_creator/…/orders/search`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TikTokOrder {
    #[serde(deserialize_with = "string_or_number")]
    pub order_id: String,
    #[serde(default)]
    pub order_status: String,
    #[serde(default)]
    pub sub_ids: Vec<String>,
    #[serde(default)]
    pub tracking_info: Option<TikTokTrackingInfo>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub product_id: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub product_image: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub total_amount: Option<String>,
    /// A percentage, e.g. `"10"`.
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub commission_rate: Option<String>,
    /// Epoch seconds
    #[serde(default)]
    pub create_time: Option<i64>,
}

impl TikTokOrder {
    /// `sub1` of the affiliate link, falling back to the tracking info block.
    pub fn tracking_id(&self) -> Option<String> {
        self.sub_ids
            .first()
            .cloned()
            .or_else(|| self.tracking_info.as_ref().and_then(|t| t.sub_id.clone()))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratedLinks {
    #[serde(default)]
    pub links: Vec<GeneratedLink>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratedLink {
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShowcaseProducts {
    #[serde(default)]
    pub products: Vec<ShowcaseProduct>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShowcaseImage {
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceRange {
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub minimum_amount: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShowcasePrice {
    #[serde(default)]
    pub original_price: Option<PriceRange>,
    #[serde(default)]
    pub sale_price: Option<PriceRange>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub min_amount: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShowcaseProduct {
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub product_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub images: Vec<ShowcaseImage>,
    #[serde(default)]
    pub price: Option<ShowcasePrice>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub commission_rate: Option<String>,
}

impl ShowcaseProduct {
    pub fn is_product(&self, product_id: &str) -> bool {
        self.id.as_deref() == Some(product_id) || self.product_id.as_deref() == Some(product_id)
    }

    /// Original price, then sale price, then the flat minimum.
    pub fn min_price(&self) -> Option<Vnd> {
        let price = self.price.as_ref()?;
        let from_range = |r: &Option<PriceRange>| r.as_ref().and_then(|r| r.minimum_amount.clone());
        from_range(&price.original_price)
            .or_else(|| from_range(&price.sale_price))
            .or_else(|| price.min_amount.clone())
            .and_then(|p| parse_amount(&p).ok())
            .filter(|p| p.is_positive())
    }

    pub fn commission(&self) -> Option<Rate> {
        self.commission_rate.as_deref().and_then(|r| parse_percent_rate(r).ok()).filter(|r| !r.is_zero())
    }

    pub fn image(&self) -> Option<String> {
        self.images.first().map(|i| i.url.clone())
    }
}
