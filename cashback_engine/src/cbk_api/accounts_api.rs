use std::fmt::Debug;

use log::*;

use crate::{
    cbk_api::order_objects::{AccountSummary, OrderQueryFilter},
    db_types::{Order, OrderStatusType, UserAccount, UserId},
    traits::{BalanceManagement, LedgerError, OrderManagement},
};

/// Read access to user balances and order histories, plus account creation.
pub struct AccountApi<B> {
    db: B,
}

impl<B> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi")
    }
}

impl<B> AccountApi<B>
where B: BalanceManagement + OrderManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn account(&self, user_id: &UserId) -> Result<Option<UserAccount>, LedgerError> {
        self.db.fetch_user_account(user_id).await
    }

    pub async fn create_account(&self, user_id: &UserId) -> Result<UserAccount, LedgerError> {
        info!("🗃️ Registering account for {user_id}");
        self.db.create_user_account(user_id).await
    }

    /// The user's orders, oldest first. An empty `statuses` slice returns orders in every status.
    pub async fn orders_for_user(
        &self,
        user_id: &UserId,
        statuses: &[OrderStatusType],
    ) -> Result<Vec<Order>, LedgerError> {
        let query = statuses
            .iter()
            .fold(OrderQueryFilter::default().with_user_id(user_id.clone()), |q, s| q.with_status(*s));
        trace!("🗃️ Fetching orders: {query}");
        self.db.search_orders(query).await
    }

    pub async fn summary(&self, user_id: &UserId) -> Result<Option<AccountSummary>, LedgerError> {
        let Some(account) = self.db.fetch_user_account(user_id).await? else {
            return Ok(None);
        };
        let orders = self.orders_for_user(user_id, &[]).await?;
        Ok(Some(AccountSummary::new(account, &orders)))
    }
}
