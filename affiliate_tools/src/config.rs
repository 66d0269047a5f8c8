use std::time::Duration;

use cbk_common::Secret;
use log::*;

pub const DEFAULT_SHOPEE_API_URL: &str = "https://open-api.affiliate.shopee.vn/graphql";
pub const DEFAULT_TIKTOK_API_URL: &str = "https://open-api.tiktokglobalshop.com";
pub const DEFAULT_TIKTOK_API_VERSION: &str = "202405";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct ShopeeConfig {
    pub app_id: String,
    pub secret_key: Secret,
    pub api_url: String,
    pub timeout: Duration,
}

impl Default for ShopeeConfig {
    fn default() -> Self {
        Self {
            app_id: String::default(),
            secret_key: Secret::default(),
            api_url: DEFAULT_SHOPEE_API_URL.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ShopeeConfig {
    pub fn new_from_env_or_default() -> Self {
        let app_id = std::env::var("CBK_SHOPEE_APP_ID").unwrap_or_else(|_| {
            warn!("🪛️ CBK_SHOPEE_APP_ID not set. Shopee API calls will fail");
            String::default()
        });
        let secret_key = Secret::from_env("CBK_SHOPEE_SECRET_KEY").unwrap_or_else(|| {
            warn!("🪛️ CBK_SHOPEE_SECRET_KEY not set. Shopee API calls will fail");
            Secret::default()
        });
        let api_url = std::env::var("CBK_SHOPEE_API_URL").unwrap_or_else(|_| DEFAULT_SHOPEE_API_URL.to_string());
        Self { app_id, secret_key, api_url, timeout: DEFAULT_REQUEST_TIMEOUT }
    }

    pub fn is_configured(&self) -> bool {
        !self.app_id.is_empty() && !self.secret_key.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct TikTokConfig {
    pub app_key: String,
    pub app_secret: Secret,
    pub access_token: Secret,
    /// Only needed for seller-scoped endpoints. The creator endpoints used here work without it.
    pub shop_cipher: Option<String>,
    pub api_url: String,
    pub api_version: String,
    pub timeout: Duration,
}

impl Default for TikTokConfig {
    fn default() -> Self {
        Self {
            app_key: String::default(),
            app_secret: Secret::default(),
            access_token: Secret::default(),
            shop_cipher: None,
            api_url: DEFAULT_TIKTOK_API_URL.to_string(),
            api_version: DEFAULT_TIKTOK_API_VERSION.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl TikTokConfig {
    pub fn new_from_env_or_default() -> Self {
        let app_key = std::env::var("CBK_TIKTOK_APP_KEY").unwrap_or_else(|_| {
            warn!("🪛️ CBK_TIKTOK_APP_KEY not set. TikTok links will not carry an affiliate id");
            String::default()
        });
        let app_secret = Secret::from_env("CBK_TIKTOK_APP_SECRET").unwrap_or_else(|| {
            warn!("🪛️ CBK_TIKTOK_APP_SECRET not set. TikTok API calls will fail");
            Secret::default()
        });
        let access_token = Secret::from_env("CBK_TIKTOK_ACCESS_TOKEN").unwrap_or_else(|| {
            warn!("🪛️ CBK_TIKTOK_ACCESS_TOKEN not set. TikTok API calls will fail");
            Secret::default()
        });
        let shop_cipher = std::env::var("CBK_TIKTOK_SHOP_CIPHER").ok().filter(|s| !s.trim().is_empty());
        let api_url = std::env::var("CBK_TIKTOK_API_URL").unwrap_or_else(|_| DEFAULT_TIKTOK_API_URL.to_string());
        let api_version = std::env::var("CBK_TIKTOK_API_VERSION").unwrap_or_else(|_| {
            debug!("🪛️ CBK_TIKTOK_API_VERSION not set, using {DEFAULT_TIKTOK_API_VERSION}");
            DEFAULT_TIKTOK_API_VERSION.to_string()
        });
        Self { app_key, app_secret, access_token, shop_cipher, api_url, api_version, timeout: DEFAULT_REQUEST_TIMEOUT }
    }

    /// True when signed API calls can be made. Fallback links only need the app key.
    pub fn is_configured(&self) -> bool {
        !self.app_key.is_empty() && !self.app_secret.is_empty() && !self.access_token.is_empty()
    }
}
