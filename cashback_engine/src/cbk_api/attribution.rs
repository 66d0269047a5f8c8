use std::fmt::Display;

use log::*;

use crate::{
    db_types::{Platform, UserId},
    traits::{BalanceManagement, LedgerError, LinkConversionManagement},
};

/// The user an order event was matched to, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribution {
    /// The event carried a tracking id naming a known user.
    TrackingId(UserId),
    /// The user most recently converted a link for the purchased item.
    LinkConversion(UserId),
    Unattributable,
}

impl Attribution {
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Attribution::TrackingId(id) | Attribution::LinkConversion(id) => Some(id),
            Attribution::Unattributable => None,
        }
    }
}

impl Display for Attribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Attribution::TrackingId(id) => write!(f, "{id} (tracking id)"),
            Attribution::LinkConversion(id) => write!(f, "{id} (link conversion)"),
            Attribution::Unattributable => write!(f, "unattributable"),
        }
    }
}

/// Maps a tracking id, or failing that a previously converted product, to a platform user.
#[derive(Debug, Clone)]
pub struct AttributionResolver<B> {
    db: B,
}

impl<B> AttributionResolver<B>
where B: BalanceManagement + LinkConversionManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// First match wins:
    /// 1. a tracking id equal to a known user id,
    /// 2. the owner of the most recent link conversion for `(platform, item_id)`.
    ///
    /// A tracking id that names no known user falls through to the item lookup. Blank identifiers are ignored.
    pub async fn resolve(
        &self,
        platform: Platform,
        tracking_id: Option<&str>,
        item_id: Option<&str>,
    ) -> Result<Attribution, LedgerError> {
        if let Some(tracking_id) = tracking_id.map(str::trim).filter(|s| !s.is_empty()) {
            let user_id = UserId::from(tracking_id);
            if self.db.fetch_user_account(&user_id).await?.is_some() {
                trace!("🔄️ Tracking id {tracking_id} matches a user");
                return Ok(Attribution::TrackingId(user_id));
            }
            debug!("🔄️ Tracking id {tracking_id} does not match any user");
        }
        if let Some(item_id) = item_id.map(str::trim).filter(|s| !s.is_empty()) {
            if let Some(conversion) = self.db.latest_link_conversion(platform, item_id).await? {
                trace!("🔄️ {platform} item {item_id} was last converted by {}", conversion.user_id);
                return Ok(Attribution::LinkConversion(conversion.user_id));
            }
        }
        Ok(Attribution::Unattributable)
    }
}
