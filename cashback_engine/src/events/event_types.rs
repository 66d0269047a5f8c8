use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatusType, Vnd};

/// A new attributed order row was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

impl OrderCreatedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Cashback for `order` entered the owner's available balance, either at creation or on completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashbackCreditedEvent {
    pub order: Order,
    pub amount: Vnd,
}

impl CashbackCreditedEvent {
    pub fn new(order: Order, amount: Vnd) -> Self {
        Self { order, amount }
    }
}

/// A credited order left `Completed`. Balances were not touched; this needs manual follow-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReopenedEvent {
    pub order: Order,
    pub previous: OrderStatusType,
}

impl OrderReopenedEvent {
    pub fn new(order: Order, previous: OrderStatusType) -> Self {
        Self { order, previous }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    OrderCreated(OrderCreatedEvent),
    CashbackCredited(CashbackCreditedEvent),
    OrderReopened(OrderReopenedEvent),
}
