//! SQLite backend for the cashback engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
