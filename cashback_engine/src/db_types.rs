use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use cbk_common::{Rate, Vnd};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

//--------------------------------------       Platform       ---------------------------------------------------------
/// The marketplaces that the cashback platform issues affiliate links for and polls for orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum Platform {
    Shopee,
    TikTok,
}

impl Platform {
    /// Detects the marketplace from a product URL.
    ///
    /// `shopee` or `shp.ee` anywhere in the URL selects Shopee; `tiktok` selects TikTok Shop. Anything else is
    /// unsupported.
    pub fn detect_from_url(url: &str) -> Option<Self> {
        let url = url.to_ascii_lowercase();
        if url.contains("shopee") || url.contains("shp.ee") {
            Some(Self::Shopee)
        } else if url.contains("tiktok") {
            Some(Self::TikTok)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Shopee => "Shopee",
            Platform::TikTok => "TikTok",
        }
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shopee" => Ok(Self::Shopee),
            "tiktok" => Ok(Self::TikTok),
            s => Err(ConversionError(format!("Invalid platform: {s}"))),
        }
    }
}

//--------------------------------------        UserId         ---------------------------------------------------------
/// Identifies a platform user. The same value is sent to the marketplaces as the affiliate tracking id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for UserId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

//--------------------------------------     UserAccount       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub available_balance: Vnd,
    pub pending_balance: Vnd,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A signed change to both balance buckets of a user, applied atomically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalanceAdjustment {
    pub available_delta: Vnd,
    pub pending_delta: Vnd,
}

impl BalanceAdjustment {
    pub fn credit_pending(amount: Vnd) -> Self {
        Self { available_delta: Vnd::from(0), pending_delta: amount }
    }

    pub fn credit_available(amount: Vnd) -> Self {
        Self { available_delta: amount, pending_delta: Vnd::from(0) }
    }

    /// Moves `amount` out of the pending bucket and into the available bucket.
    pub fn release(amount: Vnd) -> Self {
        Self { available_delta: amount, pending_delta: -amount }
    }

    pub fn is_zero(&self) -> bool {
        self.available_delta.is_zero() && self.pending_delta.is_zero()
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The purchase has been seen but the marketplace has not finalised it yet. The sole entry state.
    Pending,
    /// The marketplace has settled the order. Cashback is available to the user.
    Completed,
    /// The order was cancelled before completion.
    Cancelled,
    /// The goods were returned or the payment was refunded.
    Refunded,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Completed => write!(f, "Completed"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
            OrderStatusType::Refunded => write!(f, "Refunded"),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            "Refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
/// A marketplace purchase attributed to a user. `(platform, external_order_id)` is unique.
///
/// Amounts and rates are snapshotted when the row is created and are never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub platform: Platform,
    pub external_order_id: String,
    pub user_id: UserId,
    pub external_item_id: Option<String>,
    pub product_name: String,
    pub product_image: Option<String>,
    pub product_price: Vnd,
    pub quantity: i64,
    pub total_amount: Vnd,
    pub commission_rate: Rate,
    pub commission_amount: Vnd,
    pub cashback_rate: Rate,
    pub cashback_amount: Vnd,
    pub status: OrderStatusType,
    /// Set once the cashback for this order has entered the user's available balance. Never cleared.
    pub cashback_credited: bool,
    pub purchased_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} order {} for {} ({}, cashback {})",
            self.platform, self.external_order_id, self.user_id, self.status, self.cashback_amount
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub platform: Platform,
    pub external_order_id: String,
    pub user_id: UserId,
    pub external_item_id: Option<String>,
    pub product_name: String,
    pub product_image: Option<String>,
    pub product_price: Vnd,
    pub quantity: i64,
    pub total_amount: Vnd,
    pub commission_rate: Rate,
    pub commission_amount: Vnd,
    pub cashback_rate: Rate,
    pub cashback_amount: Vnd,
    pub status: OrderStatusType,
    pub purchased_at: DateTime<Utc>,
}

impl NewOrder {
    /// `completed_at` for a freshly created row.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        (self.status == OrderStatusType::Completed).then(Utc::now)
    }
}

//--------------------------------------    LinkConversion     ---------------------------------------------------------
/// A record of a user converting a product URL into an affiliate link.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct LinkConversion {
    pub id: i64,
    pub user_id: UserId,
    pub platform: Platform,
    pub original_url: String,
    pub affiliate_url: String,
    pub product_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLinkConversion {
    pub user_id: UserId,
    pub platform: Platform,
    pub original_url: String,
    pub affiliate_url: String,
    pub product_id: Option<String>,
}

//--------------------------------------    RawOrderEvent      ---------------------------------------------------------
/// A purchase event as reported by a marketplace, after its payload has been decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOrderEvent {
    pub platform: Platform,
    pub external_order_id: String,
    pub tracking_id: Option<String>,
    pub external_item_id: Option<String>,
    pub total_amount: Vnd,
    pub commission_rate: Rate,
    /// The marketplace's own status token, e.g. `UNPAID` or `COMPLETED`.
    pub external_status: String,
    /// Purchase time in epoch seconds.
    pub created_at: i64,
    pub product_name: Option<String>,
    pub product_image: Option<String>,
    pub quantity: Option<i64>,
}

impl RawOrderEvent {
    pub fn new<S: Into<String>>(platform: Platform, external_order_id: S, total_amount: Vnd, status: &str) -> Self {
        Self {
            platform,
            external_order_id: external_order_id.into(),
            tracking_id: None,
            external_item_id: None,
            total_amount,
            commission_rate: Rate::ZERO,
            external_status: status.to_string(),
            created_at: Utc::now().timestamp(),
            product_name: None,
            product_image: None,
            quantity: None,
        }
    }

    pub fn with_tracking_id<S: Into<String>>(mut self, tracking_id: S) -> Self {
        self.tracking_id = Some(tracking_id.into());
        self
    }

    pub fn with_item_id<S: Into<String>>(mut self, item_id: S) -> Self {
        self.external_item_id = Some(item_id.into());
        self
    }

    pub fn with_commission_rate(mut self, rate: Rate) -> Self {
        self.commission_rate = rate;
        self
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.external_status = status.to_string();
        self
    }

    pub fn with_product<S: Into<String>>(mut self, name: S, image: Option<String>) -> Self {
        self.product_name = Some(name.into());
        self.product_image = image;
        self
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn purchased_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.created_at, 0).unwrap_or_else(Utc::now)
    }
}

//--------------------------------------   ProductMetadata     ---------------------------------------------------------
/// Best-effort product details from a marketplace. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMetadata {
    pub product_id: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub price_min: Option<Vnd>,
    pub commission_rate: Option<Rate>,
}
