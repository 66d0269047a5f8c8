//! # Cashback server
//!
//! The operator-facing half of the cashback platform. It wires the Shopee and TikTok Shop affiliate clients into the
//! cashback engine and runs:
//! * the periodic order sync, which pulls recent orders from every enabled marketplace and reconciles them into the
//!   ledger,
//! * a small CLI for one-off jobs: a manual sync, link conversion, user registration and balance lookups.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information, or run
//! `cashback_server env` to print the current values.
pub mod cli;
pub mod config;
pub mod errors;
pub mod integrations;
pub mod server;
pub mod sync_worker;
