use crate::{
    cbk_api::order_objects::OrderQueryFilter,
    db_types::{Order, Platform},
    traits::LedgerError,
};

/// Read access to attributed orders.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Fetches the order with the given marketplace identity, if it exists.
    async fn fetch_order_by_external_id(
        &self,
        platform: Platform,
        external_order_id: &str,
    ) -> Result<Option<Order>, LedgerError>;

    /// Fetches orders matching all the criteria in `query`, oldest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, LedgerError>;
}
