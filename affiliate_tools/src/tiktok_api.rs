use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;

use crate::{
    config::TikTokConfig,
    helpers::follow_redirects,
    links::tiktok_fallback_link,
    signing::tiktok_signature,
    tiktok_objects::{GeneratedLinks, ShowcaseProduct, ShowcaseProducts, TikTokOrder, TikTokOrderPage, TikTokResponse},
    MarketplaceApiError,
};

pub const ORDER_PAGE_SIZE: u32 = 50;
/// Upper bound on pages fetched for a single order search.
pub const MAX_ORDER_PAGES: usize = 20;
const SHOWCASE_PAGE_SIZE: &str = "20";

/// Client for the TikTok Shop creator (affiliate) API. Requests are signed REST calls.
#[derive(Clone)]
pub struct TikTokApi {
    config: TikTokConfig,
    client: Arc<Client>,
}

impl TikTokApi {
    pub fn new(config: TikTokConfig) -> Result<Self, MarketplaceApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(crate::BROWSER_USER_AGENT));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| MarketplaceApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &TikTokConfig {
        &self.config
    }

    /// The full path of a creator endpoint, e.g. `/affiliate_creator/202405/orders/search`.
    pub fn creator_path(&self, endpoint: &str) -> String {
        format!("/affiliate_creator/{}/{endpoint}", self.config.api_version)
    }

    /// Sends a signed request and unwraps the response envelope.
    pub async fn signed_request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<T, MarketplaceApiError> {
        if !self.config.is_configured() {
            return Err(MarketplaceApiError::MissingCredentials);
        }
        let body = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| MarketplaceApiError::JsonError(e.to_string()))?;
        let mut query = vec![
            ("app_key".to_string(), self.config.app_key.clone()),
            ("timestamp".to_string(), Utc::now().timestamp().to_string()),
        ];
        query.extend(params.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        let secret = self.config.app_secret.reveal();
        let sign = tiktok_signature(path, &query, body.as_deref(), secret)?;
        query.push(("sign".to_string(), sign));
        let access_token = self.config.access_token.reveal();
        query.push(("access_token".to_string(), access_token.to_string()));
        let url = format!("{}{path}", self.config.api_url);
        trace!("🛍️ Sending TikTok request: {method} {path}");
        let mut req = self.client.request(method, url).query(&query).header("x-tts-access-token", access_token);
        if let Some(body) = body {
            req = req.body(body);
        }
        let response = req.send().await.map_err(|e| MarketplaceApiError::RestResponseError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| MarketplaceApiError::RestResponseError(e.to_string()))?;
            return Err(MarketplaceApiError::QueryError { status, message });
        }
        let envelope =
            response.json::<TikTokResponse<T>>().await.map_err(|e| MarketplaceApiError::JsonError(e.to_string()))?;
        if envelope.code != 0 {
            return Err(MarketplaceApiError::ApiError { code: envelope.code, message: envelope.message });
        }
        envelope.data.ok_or(MarketplaceApiError::EmptyResponse)
    }

    pub async fn search_orders_page(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        page_token: Option<&str>,
    ) -> Result<TikTokOrderPage, MarketplaceApiError> {
        let path = self.creator_path("orders/search");
        let body = json!({
            "create_time_from": start.timestamp(),
            "create_time_to": end.timestamp(),
            "page_size": ORDER_PAGE_SIZE,
        });
        let params = page_token.map(|t| vec![("page_token", t)]).unwrap_or_default();
        self.signed_request(Method::POST, &path, &params, Some(&body)).await
    }

    /// Every affiliate order created inside `[start, end]`, across all pages.
    pub async fn search_orders(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TikTokOrder>, MarketplaceApiError> {
        let mut orders = Vec::new();
        let mut page_token: Option<String> = None;
        for page_no in 1..=MAX_ORDER_PAGES {
            let page = self.search_orders_page(start, end, page_token.as_deref()).await?;
            trace!("🛍️ TikTok order page {page_no}: {} orders", page.orders.len());
            let last_page = page.orders.is_empty();
            orders.extend(page.orders);
            match page.next_page_token.filter(|t| !t.is_empty() && !last_page) {
                Some(token) => page_token = Some(token),
                None => break,
            }
            if page_no == MAX_ORDER_PAGES {
                warn!("🛍️ TikTok order search still has more pages after {MAX_ORDER_PAGES}. The rest are skipped");
            }
        }
        debug!("🛍️ Fetched {} TikTok orders", orders.len());
        Ok(orders)
    }

    /// Asks TikTok for a promotion link for a single product.
    pub async fn generate_affiliate_link(&self, product_id: &str) -> Result<String, MarketplaceApiError> {
        let path = self.creator_path("affiliate_sharing_links/general_publishers/generate_batch");
        let body = json!({ "material": { "ids": [product_id], "type": "PRODUCT" } });
        let links = self.signed_request::<GeneratedLinks, _>(Method::POST, &path, &[], Some(&body)).await?;
        links.links.into_iter().next().map(|l| l.url).ok_or(MarketplaceApiError::EmptyResponse)
    }

    /// Adds a product to the creator's showcase. Adding a product twice is harmless.
    pub async fn add_to_showcase(&self, product_id: &str) -> Result<(), MarketplaceApiError> {
        let path = self.creator_path("showcases/products/add");
        let body = json!({ "product_ids": [product_id], "add_type": "PRODUCT_ID" });
        self.signed_request::<serde_json::Value, _>(Method::POST, &path, &[], Some(&body)).await?;
        debug!("🛍️ Product {product_id} is in the TikTok showcase");
        Ok(())
    }

    /// Looks a product up in the creator's showcase, which is where TikTok exposes prices and commission rates.
    pub async fn showcase_product(&self, product_id: &str) -> Result<Option<ShowcaseProduct>, MarketplaceApiError> {
        let path = self.creator_path("showcases/products");
        let params = [("origin", "SHOWCASE"), ("page_size", SHOWCASE_PAGE_SIZE)];
        let products = self.signed_request::<ShowcaseProducts, ()>(Method::GET, &path, &params, None).await?;
        let product = products.products.into_iter().find(|p| p.is_product(product_id));
        if product.is_none() {
            debug!("🛍️ Product {product_id} is not in the first page of the TikTok showcase");
        }
        Ok(product)
    }

    /// Expands `vt.tiktok.com` / `vm.tiktok.com` share links.
    pub async fn resolve_short_link(&self, url: &str) -> Result<String, MarketplaceApiError> {
        follow_redirects(&self.client, url).await
    }

    pub fn fallback_link(&self, resolved_url: &str, tracking_id: Option<&str>) -> String {
        tiktok_fallback_link(resolved_url, &self.config.app_key, tracking_id)
    }
}
