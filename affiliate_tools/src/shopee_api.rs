use std::sync::Arc;

use chrono::{DateTime, Utc};
use graphql_parser::parse_query;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT},
    Client,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

use crate::{
    config::ShopeeConfig,
    helpers::follow_redirects,
    shopee_objects::{ConversionReportPage, ShopeeConversion, ShopeeProductOffer},
    signing::shopee_authorization,
    MarketplaceApiError,
};

/// Conversion report page size. Shopee caps it at 500.
pub const REPORT_PAGE_SIZE: u32 = 500;
/// Upper bound on pages fetched for a single report window.
pub const MAX_REPORT_PAGES: usize = 20;

const PRODUCT_OFFER_FIELDS: &str =
    "{ nodes { itemId productName priceMin priceMax commissionRate sellerCommissionRate imageUrl offerLink } }";
const CONVERSION_FIELDS: &str = "{ nodes { conversionId purchaseTime totalCommission utmContent orders { orderId \
                                 orderStatus items { itemId itemName itemPrice qty itemTotalCommission imageUrl } } } \
                                 pageInfo { hasNextPage scrollId } }";

/// Client for the Shopee affiliate open API. Everything goes through one signed GraphQL endpoint.
#[derive(Clone)]
pub struct ShopeeApi {
    config: ShopeeConfig,
    client: Arc<Client>,
}

impl ShopeeApi {
    pub fn new(config: ShopeeConfig) -> Result<Self, MarketplaceApiError> {
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

    pub fn config(&self) -> &ShopeeConfig {
        &self.config
    }

    /// Validates and sends a GraphQL document, returning the `data` member of the response.
    pub async fn graphql_query<T: DeserializeOwned>(&self, query: &str) -> Result<T, MarketplaceApiError> {
        if !self.config.is_configured() {
            return Err(MarketplaceApiError::MissingCredentials);
        }
        let query = parse_query::<String>(query).map_err(|e| MarketplaceApiError::InvalidGraphQL(e.to_string()))?;
        // The signature covers the exact body bytes, so serialize once and send that string.
        let payload = serde_json::json!({ "query": query.to_string() }).to_string();
        let timestamp = Utc::now().timestamp();
        let auth = shopee_authorization(&self.config.app_id, timestamp, &payload, self.config.secret_key.reveal());
        let auth = HeaderValue::from_str(&auth).map_err(|e| MarketplaceApiError::RestRequestError(e.to_string()))?;
        trace!("🛍️ Sending Shopee GraphQL query: {payload}");
        let response = self
            .client
            .post(&self.config.api_url)
            .header(AUTHORIZATION, auth)
            .body(payload)
            .send()
            .await
            .map_err(|e| MarketplaceApiError::RestResponseError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| MarketplaceApiError::RestResponseError(e.to_string()))?;
            return Err(MarketplaceApiError::QueryError { status, message });
        }
        let result = response.json::<Value>().await.map_err(|e| MarketplaceApiError::JsonError(e.to_string()))?;
        if let Some(errors) = result["errors"].as_array() {
            let e = errors
                .iter()
                .map(|e| e["message"].as_str().map(String::from).unwrap_or_else(|| e.to_string()))
                .collect::<Vec<String>>()
                .join(", ");
            return Err(MarketplaceApiError::GraphQLError(e));
        }
        let data = result["data"].clone();
        trace!("🛍️ Shopee GraphQL response: {data}");
        if data.is_null() {
            return Err(MarketplaceApiError::EmptyResponse);
        }
        serde_json::from_value(data).map_err(|e| MarketplaceApiError::JsonError(e.to_string()))
    }

    /// Wraps `origin_url` in a Shopee short link that reports `sub_ids` back on every resulting conversion.
    pub async fn generate_short_link(&self, origin_url: &str, sub_ids: &[String]) -> Result<String, MarketplaceApiError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ShortLink {
            short_link: String,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Response {
            generate_short_link: ShortLink,
        }
        let origin_url = graphql_string(origin_url)?;
        let sub_ids = serde_json::to_string(sub_ids).map_err(|e| MarketplaceApiError::JsonError(e.to_string()))?;
        let mutation = format!(
            "mutation {{ generateShortLink(input: {{ originUrl: {origin_url}, subIds: {sub_ids} }}) {{ shortLink }} }}"
        );
        debug!("🛍️ Requesting Shopee short link for {origin_url}");
        let response = self.graphql_query::<Response>(&mutation).await?;
        Ok(response.generate_short_link.short_link)
    }

    /// Looks up the affiliate offer for a single product.
    pub async fn product_offer(
        &self,
        item_id: &str,
        shop_id: Option<&str>,
    ) -> Result<Option<ShopeeProductOffer>, MarketplaceApiError> {
        #[derive(Deserialize)]
        struct Nodes {
            nodes: Vec<ShopeeProductOffer>,
        }
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Response {
            product_offer_v2: Nodes,
        }
        let item_id = numeric_id(item_id)?;
        let shop_id = shop_id.map(numeric_id).transpose()?.unwrap_or(0);
        let query =
            format!("query {{ productOfferV2(itemId: {item_id}, shopId: {shop_id}, limit: 1) {PRODUCT_OFFER_FIELDS} }}");
        let response = self.graphql_query::<Response>(&query).await?;
        Ok(response.product_offer_v2.nodes.into_iter().next())
    }

    pub async fn conversion_report_page(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        scroll_id: Option<&str>,
    ) -> Result<ConversionReportPage, MarketplaceApiError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Response {
            conversion_report: ConversionReportPage,
        }
        let scroll = match scroll_id {
            Some(id) => format!(", scrollId: {}", graphql_string(id)?),
            None => String::default(),
        };
        let query = format!(
            "query {{ conversionReport(purchaseTimeStart: {}, purchaseTimeEnd: {}, limit: {REPORT_PAGE_SIZE}{scroll}) \
             {CONVERSION_FIELDS} }}",
            start.timestamp(),
            end.timestamp()
        );
        let response = self.graphql_query::<Response>(&query).await?;
        Ok(response.conversion_report)
    }

    /// Every conversion with a purchase time inside `[start, end]`, across as many pages as the report has.
    pub async fn conversion_report(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ShopeeConversion>, MarketplaceApiError> {
        let mut conversions = Vec::new();
        let mut scroll_id = None;
        for page_no in 1..=MAX_REPORT_PAGES {
            let page = self.conversion_report_page(start, end, scroll_id.as_deref()).await?;
            trace!("🛍️ Shopee conversion report page {page_no}: {} conversions", page.nodes.len());
            conversions.extend(page.nodes);
            match page.page_info.scroll_id.filter(|_| page.page_info.has_next_page) {
                Some(next) => scroll_id = Some(next),
                None => break,
            }
            if page_no == MAX_REPORT_PAGES {
                warn!("🛍️ Shopee conversion report still has more pages after {MAX_REPORT_PAGES}. The rest are skipped");
            }
        }
        debug!("🛍️ Fetched {} Shopee conversions", conversions.len());
        Ok(conversions)
    }

    /// Expands `shp.ee` / `s.shopee.vn` share links.
    pub async fn resolve_short_link(&self, url: &str) -> Result<String, MarketplaceApiError> {
        follow_redirects(&self.client, url).await
    }
}

/// A GraphQL string literal. JSON string escaping is a subset of what GraphQL accepts.
fn graphql_string(s: &str) -> Result<String, MarketplaceApiError> {
    serde_json::to_string(s).map_err(|e| MarketplaceApiError::JsonError(e.to_string()))
}

fn numeric_id(id: &str) -> Result<u64, MarketplaceApiError> {
    id.trim().parse::<u64>().map_err(|e| MarketplaceApiError::RestRequestError(format!("Invalid Shopee id '{id}'. {e}")))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn literals() {
        assert_eq!(graphql_string(r#"https://shopee.vn/a"b"#).unwrap(), r#""https://shopee.vn/a\"b""#);
        assert_eq!(numeric_id(" 17638112223 ").unwrap(), 17_638_112_223);
        assert!(numeric_id("abc").is_err());
    }

    #[test]
    fn generated_documents_parse() {
        let mutation = format!(
            "mutation {{ generateShortLink(input: {{ originUrl: {}, subIds: {} }}) {{ shortLink }} }}",
            graphql_string("https://shopee.vn/x-i.1.2").unwrap(),
            serde_json::to_string(&["U1".to_string()]).unwrap()
        );
        assert!(parse_query::<String>(&mutation).is_ok());
        let query = format!("query {{ productOfferV2(itemId: 2, shopId: 1, limit: 1) {PRODUCT_OFFER_FIELDS} }}");
        assert!(parse_query::<String>(&query).is_ok());
        let query = format!(
            "query {{ conversionReport(purchaseTimeStart: 1, purchaseTimeEnd: 2, limit: 500, scrollId: \"s\") \
             {CONVERSION_FIELDS} }}"
        );
        assert!(parse_query::<String>(&query).is_ok());
    }

    #[tokio::test]
    async fn unconfigured_client_refuses_to_send() {
        let api = ShopeeApi::new(ShopeeConfig::default()).unwrap();
        let err = api.generate_short_link("https://shopee.vn/x-i.1.2", &[]).await.unwrap_err();
        assert!(matches!(err, MarketplaceApiError::MissingCredentials));
    }
}
