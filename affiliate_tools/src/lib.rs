//! Clients for the marketplace affiliate APIs.
//!
//! * [`ShopeeApi`] talks to the Shopee affiliate open API: a single GraphQL endpoint, signed with the app secret.
//! * [`TikTokApi`] talks to the TikTok Shop creator API: signed REST calls wrapped in a `{ code, message, data }`
//!   envelope.
//!
//! The payload types mirror the marketplace JSON closely. Turning them into ledger events is left to the caller.
mod config;
mod error;
mod shopee_api;
mod signing;
mod tiktok_api;

pub mod helpers;
pub mod links;
pub mod shopee_objects;
pub mod tiktok_objects;

pub use config::{ShopeeConfig, TikTokConfig, DEFAULT_REQUEST_TIMEOUT};
pub use error::MarketplaceApiError;
pub use shopee_api::ShopeeApi;
pub use signing::{shopee_authorization, tiktok_signature};
pub use tiktok_api::TikTokApi;

/// Share-link hosts serve an app-install page to unknown clients, so redirects are followed as a desktop browser.
pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
