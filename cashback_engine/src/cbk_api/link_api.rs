use std::fmt::Debug;

use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    cbk_api::errors::LinkApiError,
    db_types::{LinkConversion, NewLinkConversion, Platform, ProductMetadata, Rate, UserId, Vnd},
    traits::{AffiliateLinkProvider, LinkConversionManagement},
};

/// The share of the estimated commission shown to users before they buy: 50%.
pub const DEFAULT_ESTIMATE_SHARE: Rate = Rate::from_bps(5000);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConversionResult {
    pub conversion: LinkConversion,
    /// The product URL after share-link expansion.
    pub resolved_url: String,
    pub metadata: Option<ProductMetadata>,
    pub estimated_cashback: Option<Vnd>,
}

/// Turns product URLs into affiliate links that carry the user id as tracking id, and records every conversion.
pub struct LinkApi<B> {
    db: B,
    estimate_share: Rate,
}

impl<B> Debug for LinkApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LinkApi (estimate share {})", self.estimate_share)
    }
}

impl<B> LinkApi<B>
where B: LinkConversionManagement
{
    pub fn new(db: B, estimate_share: Rate) -> Self {
        Self { db, estimate_share }
    }

    /// Converts `url` into an affiliate link for `user_id` using `provider`.
    ///
    /// Share-link resolution and product metadata are best-effort: their failures are logged and the conversion
    /// carries on with the original URL and without an estimate. Failing to generate the link aborts the conversion
    /// and nothing is recorded.
    pub async fn convert_link<P>(
        &self,
        user_id: &UserId,
        url: &str,
        provider: &P,
    ) -> Result<LinkConversionResult, LinkApiError>
    where
        P: AffiliateLinkProvider,
    {
        let url = url.trim();
        let platform =
            Platform::detect_from_url(url).ok_or_else(|| LinkApiError::UnsupportedPlatform(url.to_string()))?;
        if platform != provider.platform() {
            return Err(LinkApiError::PlatformMismatch { provider: provider.platform(), url: url.to_string() });
        }
        let resolved_url = match provider.resolve_url(url).await {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!("🔗️ Could not resolve {url}. Using it as is. {e}");
                url.to_string()
            },
        };
        trace!("🔗️ {url} resolved to {resolved_url}");
        let tracking_ids = vec![user_id.to_string()];
        let affiliate_url =
            provider.generate_link(&resolved_url, &tracking_ids).await.map_err(LinkApiError::LinkGeneration)?;
        let product_id = provider.extract_product_id(&resolved_url).or_else(|| provider.extract_product_id(url));
        let metadata = match &product_id {
            Some(id) => provider.fetch_product_metadata(id, &resolved_url).await,
            None => {
                debug!("🔗️ No product id found in {resolved_url}");
                None
            },
        };
        let estimated_cashback = metadata.as_ref().and_then(|m| estimate_cashback(m, self.estimate_share));
        let conversion = NewLinkConversion {
            user_id: user_id.clone(),
            platform,
            original_url: url.to_string(),
            affiliate_url,
            product_id,
        };
        let conversion = self.db.insert_link_conversion(conversion).await?;
        info!("🔗️ {platform} link converted for {user_id}: {}", conversion.affiliate_url);
        Ok(LinkConversionResult { conversion, resolved_url, metadata, estimated_cashback })
    }
}

/// `price_min × commission_rate × share`, or `None` if either the price or the commission rate is unknown.
pub fn estimate_cashback(metadata: &ProductMetadata, share: Rate) -> Option<Vnd> {
    let price = metadata.price_min?;
    let rate = metadata.commission_rate?;
    Some(share.apply(rate.apply(price)))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn estimate_needs_price_and_rate() {
        let mut meta = ProductMetadata { product_id: "1".into(), ..Default::default() };
        assert_eq!(estimate_cashback(&meta, DEFAULT_ESTIMATE_SHARE), None);
        meta.price_min = Some(Vnd::from(200_000));
        assert_eq!(estimate_cashback(&meta, DEFAULT_ESTIMATE_SHARE), None);
        meta.commission_rate = Some(Rate::from_bps(1000));
        assert_eq!(estimate_cashback(&meta, DEFAULT_ESTIMATE_SHARE), Some(Vnd::from(10_000)));
    }
}
