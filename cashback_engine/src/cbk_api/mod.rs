//! # Cashback engine public API
//!
//! The `cbk_api` module exposes the programmatic API of the cashback engine. Each API is created by supplying a
//! database backend that implements the backend traits it needs.
//!
//! * [`ledger_api`] reconciles marketplace order events into orders and balance movements.
//! * [`sync_api`] wraps the ledger with a lookback window, a set of order sources and a single-run guard.
//! * [`link_api`] converts product URLs into affiliate links.
//! * [`accounts_api`] reads balances and order histories.
//!
//! ```rust,ignore
//! use cashback_engine::{events::EventProducers, LedgerConfig, OrderLedgerApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = OrderLedgerApi::new(db, LedgerConfig::default(), EventProducers::default());
//! let summary = api.reconcile(&events).await;
//! ```
pub mod accounts_api;
pub mod attribution;
pub mod errors;
pub mod ledger_api;
pub mod link_api;
pub mod order_objects;
pub mod status_map;
pub mod sync_api;
