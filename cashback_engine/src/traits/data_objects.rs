use serde::{Deserialize, Serialize};

use crate::db_types::{BalanceAdjustment, NewOrder, Order, OrderStatusType, Vnd};

/// The balance movement that accompanies an order write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceEffect {
    None,
    /// A new, not yet completed order. Cashback goes to the pending bucket.
    CreditPending(Vnd),
    /// A new order that is already completed. Cashback goes straight to the available bucket.
    CreditAvailable(Vnd),
    /// The first transition into `Completed`. Cashback moves from pending to available.
    Release(Vnd),
}

impl BalanceEffect {
    pub fn for_new_order(order: &NewOrder) -> Self {
        match order.status {
            OrderStatusType::Completed => Self::CreditAvailable(order.cashback_amount),
            _ => Self::CreditPending(order.cashback_amount),
        }
    }

    /// Cashback is released only when entering `Completed` from another status, and only if it has never been
    /// released before. Leaving `Completed` never touches balances.
    pub fn for_transition(order: &Order, new_status: OrderStatusType) -> Self {
        let entering_completed =
            new_status == OrderStatusType::Completed && order.status != OrderStatusType::Completed;
        if entering_completed && !order.cashback_credited {
            Self::Release(order.cashback_amount)
        } else {
            Self::None
        }
    }

    pub fn adjustment(&self) -> Option<BalanceAdjustment> {
        match *self {
            BalanceEffect::None => None,
            BalanceEffect::CreditPending(v) => Some(BalanceAdjustment::credit_pending(v)),
            BalanceEffect::CreditAvailable(v) => Some(BalanceAdjustment::credit_available(v)),
            BalanceEffect::Release(v) => Some(BalanceAdjustment::release(v)),
        }
    }

    /// True if this effect puts the order's cashback into the available bucket, i.e. the order must be flagged as
    /// credited in the same transaction.
    pub fn credits_available(&self) -> bool {
        matches!(self, BalanceEffect::CreditAvailable(_) | BalanceEffect::Release(_))
    }

    pub fn amount(&self) -> Vnd {
        match *self {
            BalanceEffect::None => Vnd::from(0),
            BalanceEffect::CreditPending(v) | BalanceEffect::CreditAvailable(v) | BalanceEffect::Release(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewOrderResult {
    Created { order: Order, effect: BalanceEffect },
    AlreadyExists(Order),
}

impl NewOrderResult {
    pub fn order(&self) -> &Order {
        match self {
            NewOrderResult::Created { order, .. } => order,
            NewOrderResult::AlreadyExists(order) => order,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, NewOrderResult::Created { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusChangeResult {
    Updated { old_order: Order, new_order: Order, effect: BalanceEffect },
    /// The stored status no longer matched the expected one. Nothing was written.
    Conflict,
}

#[cfg(test)]
mod test {
    use chrono::Utc;

    use super::*;
    use crate::db_types::{Platform, Rate, UserId};

    fn order(status: OrderStatusType, credited: bool) -> Order {
        Order {
            id: 1,
            platform: Platform::TikTok,
            external_order_id: "O1".into(),
            user_id: UserId::from("U1"),
            external_item_id: None,
            product_name: "".into(),
            product_image: None,
            product_price: Vnd::from(0),
            quantity: 1,
            total_amount: Vnd::from(100_000),
            commission_rate: Rate::from_bps(1000),
            commission_amount: Vnd::from(10_000),
            cashback_rate: Rate::from_bps(7000),
            cashback_amount: Vnd::from(7000),
            status,
            cashback_credited: credited,
            purchased_at: Utc::now(),
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn release_only_on_first_entry_into_completed() {
        use OrderStatusType::*;
        let effect = BalanceEffect::for_transition(&order(Pending, false), Completed);
        assert_eq!(effect, BalanceEffect::Release(Vnd::from(7000)));
        assert!(effect.credits_available());
        assert_eq!(BalanceEffect::for_transition(&order(Completed, true), Completed), BalanceEffect::None);
        assert_eq!(BalanceEffect::for_transition(&order(Refunded, true), Completed), BalanceEffect::None);
        assert_eq!(BalanceEffect::for_transition(&order(Completed, true), Refunded), BalanceEffect::None);
        assert_eq!(BalanceEffect::for_transition(&order(Pending, false), Cancelled), BalanceEffect::None);
        assert_eq!(
            BalanceEffect::for_transition(&order(Cancelled, false), Completed),
            BalanceEffect::Release(Vnd::from(7000))
        );
    }

    #[test]
    fn effect_adjustments() {
        let adj = BalanceEffect::CreditPending(Vnd::from(5)).adjustment().unwrap();
        assert_eq!(adj, BalanceAdjustment::credit_pending(Vnd::from(5)));
        let adj = BalanceEffect::Release(Vnd::from(5)).adjustment().unwrap();
        assert_eq!(adj.pending_delta, Vnd::from(-5));
        assert!(BalanceEffect::None.adjustment().is_none());
        assert!(!BalanceEffect::CreditPending(Vnd::from(5)).credits_available());
    }
}
