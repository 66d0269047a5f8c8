use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderStatusType, Platform, UserId},
    traits::{
        data_objects::{NewOrderResult, StatusChangeResult},
        BalanceManagement,
        LinkConversionManagement,
        OrderManagement,
    },
};

/// This trait defines the highest level of behaviour for backends supporting the cashback ledger.
///
/// Every method runs in a single atomic transaction. The balance movement that accompanies an order write is
/// decided by [`crate::traits::BalanceEffect`] and applied in the same transaction as the write itself, so a
/// crash can never leave an order and its balances out of step.
#[allow(async_fn_in_trait)]
pub trait ReconciliationDatabase: Clone + OrderManagement + BalanceManagement + LinkConversionManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Inserts a new order and credits its cashback to the owner's pending bucket, or directly to the available
    /// bucket when the order is already `Completed`.
    ///
    /// If an order with the same `(platform, external_order_id)` already exists, nothing is written and the
    /// existing row is returned as [`NewOrderResult::AlreadyExists`].
    async fn record_new_order(&self, order: NewOrder) -> Result<NewOrderResult, LedgerError>;

    /// Moves `order` to `new_status`.
    ///
    /// The update only succeeds if the stored status still equals `order.status`. If another writer got there first,
    /// nothing is written and [`StatusChangeResult::Conflict`] is returned. On a first transition into `Completed` the
    /// cashback is moved from pending to available and the order is flagged as credited.
    async fn record_status_change(
        &self,
        order: &Order,
        new_status: OrderStatusType,
    ) -> Result<StatusChangeResult, LedgerError>;
}

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The requested user {0} does not exist")]
    UserNotFound(UserId),
    #[error("The {0} order {1} does not exist")]
    OrderNotFound(Platform, String),
    #[error("The order event is invalid. {0}")]
    InvalidEvent(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}
