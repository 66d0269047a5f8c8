//! Cashback Engine
//!
//! The cashback engine attributes marketplace purchases made through affiliate links to platform users, and keeps
//! each user's cashback balance in step with the status of those purchases. It is marketplace-agnostic: the
//! marketplaces are reached through the [`OrderSource`] and [`AffiliateLinkProvider`] traits.
//!
//! The library is divided into two main sections:
//! 1. Storage ([`mod@traits`] and the SQLite backend). You should never need to access the database directly. Use the
//!    public API instead. The exception is the data types used in the database, which live in [`mod@db_types`].
//! 2. The public API ([`mod@cbk_api`]): reconciliation of order events, the sync entrypoint, link conversion and
//!    account queries.
//!
//! Every order event runs through the same rules: an order is created once per `(platform, external order id)`, and
//! its cashback moves from the pending to the available bucket at most once, however many times the event is
//! replayed.
//!
//! The engine also publishes events (order created, cashback credited, order reopened) through a small actor
//! framework, so that you can hook into them and perform custom actions.
mod cbk_api;
#[cfg(feature = "sqlite")]
mod sqlite;

pub mod db_types;
pub mod events;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use cbk_api::{
    accounts_api::AccountApi,
    attribution::{Attribution, AttributionResolver},
    errors::{LinkApiError, SyncError},
    ledger_api::{LedgerConfig, OrderLedgerApi, DEFAULT_CASHBACK_RATE},
    link_api::{estimate_cashback, LinkApi, LinkConversionResult, DEFAULT_ESTIMATE_SHARE},
    order_objects,
    status_map,
    sync_api::{SyncApi, SyncOutcome, SyncReport},
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    AffiliateLinkProvider,
    BalanceManagement,
    LedgerError,
    LinkConversionManagement,
    MarketplaceError,
    OrderManagement,
    OrderSource,
    ReconciliationDatabase,
    SyncLeaseManagement,
};
