//! Collapses marketplace order status tokens into the four ledger statuses.
use log::warn;

use crate::db_types::{OrderStatusType, Platform};

/// Tokens for orders the marketplace has not finalised yet.
pub const PENDING_TOKENS: &[&str] =
    &["UNPAID", "ON_HOLD", "AWAITING_SHIPMENT", "AWAITING_COLLECTION", "IN_TRANSIT", "DELIVERED", "PENDING"];
/// Tokens for orders the marketplace has settled.
pub const COMPLETED_TOKENS: &[&str] = &["COMPLETED", "SETTLED"];
pub const CANCELLED_TOKENS: &[&str] = &["CANCELLED"];
pub const REFUNDED_TOKENS: &[&str] = &["RETURNED", "REFUNDED"];

/// Maps a marketplace status token to a ledger status.
///
/// Matching ignores case and surrounding whitespace. Unknown tokens map to `Pending` so that an unfamiliar status can
/// never release cashback.
pub fn map_external_status(platform: Platform, token: &str) -> OrderStatusType {
    let normalized = token.trim().to_ascii_uppercase();
    let is_in = |tokens: &[&str]| tokens.contains(&normalized.as_str());
    if is_in(PENDING_TOKENS) {
        OrderStatusType::Pending
    } else if is_in(COMPLETED_TOKENS) {
        OrderStatusType::Completed
    } else if is_in(CANCELLED_TOKENS) {
        OrderStatusType::Cancelled
    } else if is_in(REFUNDED_TOKENS) {
        OrderStatusType::Refunded
    } else {
        warn!("🔄️ Unknown {platform} order status '{token}'. Treating it as Pending");
        OrderStatusType::Pending
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn known_tokens() {
        use OrderStatusType::*;
        let cases = [
            ("UNPAID", Pending),
            ("ON_HOLD", Pending),
            ("AWAITING_SHIPMENT", Pending),
            ("AWAITING_COLLECTION", Pending),
            ("IN_TRANSIT", Pending),
            ("DELIVERED", Pending),
            ("PENDING", Pending),
            ("COMPLETED", Completed),
            ("SETTLED", Completed),
            ("CANCELLED", Cancelled),
            ("RETURNED", Refunded),
            ("REFUNDED", Refunded),
        ];
        for (token, expected) in cases {
            assert_eq!(map_external_status(Platform::TikTok, token), expected, "{token}");
        }
    }

    #[test]
    fn matching_ignores_case_and_whitespace() {
        assert_eq!(map_external_status(Platform::Shopee, "  completed "), OrderStatusType::Completed);
        assert_eq!(map_external_status(Platform::Shopee, "Settled"), OrderStatusType::Completed);
        assert_eq!(map_external_status(Platform::Shopee, "in_transit"), OrderStatusType::Pending);
    }

    #[test]
    fn unknown_tokens_are_pending() {
        let _ = env_logger::try_init();
        assert_eq!(map_external_status(Platform::TikTok, "PARTIALLY_SHIPPED"), OrderStatusType::Pending);
        assert_eq!(map_external_status(Platform::TikTok, ""), OrderStatusType::Pending);
    }

    #[test]
    fn mapping_is_deterministic() {
        for token in PENDING_TOKENS.iter().chain(COMPLETED_TOKENS).chain(CANCELLED_TOKENS).chain(REFUNDED_TOKENS) {
            let first = map_external_status(Platform::Shopee, token);
            let second = map_external_status(Platform::TikTok, &token.to_lowercase());
            assert_eq!(first, second, "{token}");
        }
    }
}
