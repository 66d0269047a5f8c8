//! # Backend and collaborator contracts
//!
//! This module defines the behaviour that the cashback engine needs from its storage backend and from the
//! marketplaces it talks to.
//!
//! ## Storage
//! * [`ReconciliationDatabase`] is the highest level of behaviour: atomic creation of orders and atomic status
//!   transitions, each together with the balance movement that goes with it.
//! * [`OrderManagement`] provides order queries.
//! * [`BalanceManagement`] provides user accounts and the two balance buckets.
//! * [`LinkConversionManagement`] records affiliate link conversions, which double as an attribution fallback.
//! * [`SyncLeaseManagement`] keeps order syncs from overlapping, even across processes.
//!
//! ## Marketplaces
//! * [`OrderSource`] fetches purchase events for a time window.
//! * [`AffiliateLinkProvider`] rewrites product URLs into tracked affiliate links.
mod balance_management;
mod data_objects;
mod link_conversions;
mod marketplace;
mod order_management;
mod reconciliation_database;
mod sync_lease;

pub use balance_management::BalanceManagement;
pub use data_objects::{BalanceEffect, NewOrderResult, StatusChangeResult};
pub use link_conversions::LinkConversionManagement;
pub use marketplace::{AffiliateLinkProvider, MarketplaceError, OrderSource};
pub use order_management::OrderManagement;
pub use reconciliation_database::{LedgerError, ReconciliationDatabase};
pub use sync_lease::SyncLeaseManagement;
