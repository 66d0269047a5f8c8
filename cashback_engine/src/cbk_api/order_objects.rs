use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatusType, Platform, UserAccount, UserId, Vnd};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub user_id: Option<UserId>,
    pub platform: Option<Platform>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub status: Option<Vec<OrderStatusType>>,
}

impl OrderQueryFilter {
    pub fn with_user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() &&
            self.platform.is_none() &&
            self.status.as_ref().map_or(true, |s| s.is_empty()) &&
            self.since.is_none() &&
            self.until.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters.")?;
            return Ok(());
        }
        if let Some(user_id) = &self.user_id {
            write!(f, "user_id: {user_id}. ")?;
        }
        if let Some(platform) = &self.platform {
            write!(f, "platform: {platform}. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until {until}. ")?;
        }
        if let Some(statuses) = &self.status {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: [{statuses}]. ")?;
        }
        Ok(())
    }
}

/// Counts for one reconciliation batch. `synced + skipped + failed` always equals the batch size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileSummary {
    /// New orders that were created and credited.
    pub synced: usize,
    /// Events that created nothing: unattributable, unchanged, status-only updates and lost races.
    pub skipped: usize,
    /// Events whose processing failed.
    pub failed: usize,
}

impl ReconcileSummary {
    pub fn total(&self) -> usize {
        self.synced + self.skipped + self.failed
    }

    pub fn record(&mut self, outcome: &EventOutcome) {
        if outcome.is_synced() {
            self.synced += 1;
        } else {
            self.skipped += 1;
        }
    }
}

impl Display for ReconcileSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} synced, {} skipped, {} failed", self.synced, self.skipped, self.failed)
    }
}

/// What happened to a single order event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// A new order row was created.
    Created(Order),
    /// The order exists and its status moved. `credited` is the cashback released into the available bucket, if any.
    StatusUpdated { order: Order, credited: Option<Vnd> },
    /// The order exists and the status is unchanged.
    Unchanged,
    /// No user could be matched to the event.
    Unattributable,
    /// Another writer changed the order while this event was being processed.
    Conflict,
    /// The event was malformed and was ignored.
    Invalid(String),
}

impl EventOutcome {
    pub fn is_synced(&self) -> bool {
        matches!(self, EventOutcome::Created(_))
    }
}

/// A user's balances together with totals over their orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub account: UserAccount,
    pub order_count: usize,
    pub pending_orders: usize,
    pub completed_orders: usize,
    pub total_commission: Vnd,
    /// Cashback over all orders that have not been cancelled or refunded.
    pub total_cashback: Vnd,
}

impl AccountSummary {
    pub fn new(account: UserAccount, orders: &[Order]) -> Self {
        let count = |s: OrderStatusType| orders.iter().filter(|o| o.status == s).count();
        let live = orders
            .iter()
            .filter(|o| matches!(o.status, OrderStatusType::Pending | OrderStatusType::Completed))
            .collect::<Vec<&Order>>();
        Self {
            account,
            order_count: orders.len(),
            pending_orders: count(OrderStatusType::Pending),
            completed_orders: count(OrderStatusType::Completed),
            total_commission: live.iter().map(|o| o.commission_amount).sum(),
            total_cashback: live.iter().map(|o| o.cashback_amount).sum(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn with_status_accumulates() {
        let filter = OrderQueryFilter::default()
            .with_status(OrderStatusType::Pending)
            .with_status(OrderStatusType::Completed);
        assert_eq!(filter.status, Some(vec![OrderStatusType::Pending, OrderStatusType::Completed]));
        assert!(!filter.is_empty());
        assert_eq!(filter.to_string(), "statuses: [Pending,Completed]. ");
        assert_eq!(OrderQueryFilter::default().to_string(), "No filters.");
    }

    #[test]
    fn summary_counts() {
        let mut summary = ReconcileSummary::default();
        summary.record(&EventOutcome::Unattributable);
        summary.record(&EventOutcome::Unchanged);
        summary.failed += 1;
        assert_eq!(summary, ReconcileSummary { synced: 0, skipped: 2, failed: 1 });
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.to_string(), "0 synced, 2 skipped, 1 failed");
    }
}
