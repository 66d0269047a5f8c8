//! `SqliteDatabase` is a concrete implementation of a cashback engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{db_url, link_conversions, new_pool, orders, sync_lease, user_accounts};
use crate::{
    cbk_api::order_objects::OrderQueryFilter,
    db_types::{
        BalanceAdjustment,
        LinkConversion,
        NewLinkConversion,
        NewOrder,
        Order,
        OrderStatusType,
        Platform,
        UserAccount,
        UserId,
    },
    traits::{
        BalanceEffect,
        BalanceManagement,
        LedgerError,
        LinkConversionManagement,
        NewOrderResult,
        OrderManagement,
        ReconciliationDatabase,
        StatusChangeResult,
        SyncLeaseManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl ReconciliationDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn record_new_order(&self, order: NewOrder) -> Result<NewOrderResult, LedgerError> {
        let effect = BalanceEffect::for_new_order(&order);
        let user_id = order.user_id.clone();
        let mut tx = self.pool.begin().await?;
        let (order, inserted) = orders::idempotent_insert(order, &mut tx).await?;
        if !inserted {
            debug!("🗃️ {order} already exists. Nothing was written");
            return Ok(NewOrderResult::AlreadyExists(order));
        }
        if let Some(adjustment) = effect.adjustment() {
            user_accounts::adjust_balances(&user_id, adjustment, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ {order} saved with id {}. Balance effect: {effect:?}", order.id);
        Ok(NewOrderResult::Created { order, effect })
    }

    async fn record_status_change(
        &self,
        order: &Order,
        new_status: OrderStatusType,
    ) -> Result<StatusChangeResult, LedgerError> {
        let effect = BalanceEffect::for_transition(order, new_status);
        let mut tx = self.pool.begin().await?;
        let updated = orders::compare_and_set_status(order.id, order.status, new_status, &mut tx).await?;
        let Some(mut new_order) = updated else {
            debug!("🗃️ Order #{} is no longer {}. Status change to {new_status} abandoned", order.id, order.status);
            return Ok(StatusChangeResult::Conflict);
        };
        if effect.credits_available() {
            if !orders::mark_cashback_credited(order.id, &mut tx).await? {
                warn!("🗃️ Order #{} was credited by another writer. Rolling back status change", order.id);
                return Ok(StatusChangeResult::Conflict);
            }
            if let Some(adjustment) = effect.adjustment() {
                user_accounts::adjust_balances(&order.user_id, adjustment, &mut tx).await?;
            }
            new_order.cashback_credited = true;
        }
        tx.commit().await?;
        debug!("🗃️ Order #{} moved from {} to {new_status}. Balance effect: {effect:?}", order.id, order.status);
        Ok(StatusChangeResult::Updated { old_order: order.clone(), new_order, effect })
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order_by_external_id(
        &self,
        platform: Platform,
        external_order_id: &str,
    ) -> Result<Option<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_external_id(platform, external_order_id, &mut conn).await?;
        Ok(order)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }
}

impl BalanceManagement for SqliteDatabase {
    async fn fetch_user_account(&self, user_id: &UserId) -> Result<Option<UserAccount>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let account = user_accounts::user_account_by_id(user_id, &mut conn).await?;
        Ok(account)
    }

    async fn create_user_account(&self, user_id: &UserId) -> Result<UserAccount, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        user_accounts::create_account(user_id, &mut conn).await
    }

    async fn adjust_balance(
        &self,
        user_id: &UserId,
        adjustment: BalanceAdjustment,
    ) -> Result<UserAccount, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        user_accounts::adjust_balances(user_id, adjustment, &mut conn).await
    }
}

impl LinkConversionManagement for SqliteDatabase {
    async fn insert_link_conversion(&self, conversion: NewLinkConversion) -> Result<LinkConversion, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let record = link_conversions::insert_link_conversion(conversion, &mut conn).await?;
        Ok(record)
    }

    async fn latest_link_conversion(
        &self,
        platform: Platform,
        product_id: &str,
    ) -> Result<Option<LinkConversion>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let record = link_conversions::latest_for_product(platform, product_id, &mut conn).await?;
        Ok(record)
    }
}

impl SyncLeaseManagement for SqliteDatabase {
    async fn try_acquire_sync_lease(&self, holder: &str, duration: Duration) -> Result<bool, LedgerError> {
        let now = Utc::now();
        let mut conn = self.pool.acquire().await?;
        let taken = sync_lease::try_acquire(holder, now, now + duration, &mut conn).await?;
        Ok(taken)
    }

    async fn release_sync_lease(&self, holder: &str) -> Result<(), LedgerError> {
        let mut conn = self.pool.acquire().await?;
        if !sync_lease::release(holder, &mut conn).await? {
            warn!("🗃️ The sync lease of {holder} had already been taken over");
        }
        Ok(())
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date.
    pub async fn run_migrations(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) {
        self.pool.close().await;
    }
}
