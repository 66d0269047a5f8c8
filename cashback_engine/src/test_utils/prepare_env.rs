//! Throwaway ledger databases for integration tests.
//!
//! Each call to [`prepare_test_env`] hands out a migrated database in its own file under the system temp
//! directory, so tests can run in parallel without sharing balances.
use std::path::PathBuf;

use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::{traits::ReconciliationDatabase, SqliteDatabase};

/// Set this to keep the database files of finished tests around for inspection.
pub const KEEP_TEST_DB_VAR: &str = "CBK_KEEP_TEST_DB";

/// Loads `.env.test`, starts logging and returns an empty, migrated ledger database.
pub async fn prepare_test_env(max_connections: u32) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let url = random_db_url();
    let db = SqliteDatabase::new_with_url(&url, max_connections).await.expect("Error opening test database");
    db.run_migrations().await.expect("Error running DB migrations");
    debug!("🚀️ Test ledger ready at {url}");
    db
}

fn test_db_dir() -> PathBuf {
    let dir = std::env::temp_dir().join("cbk_tests");
    std::fs::create_dir_all(&dir).expect("Error creating test database directory");
    dir
}

/// A database URL that no other test uses. The file is created when the database is first opened.
pub fn random_db_url() -> String {
    format!("sqlite://{}/ledger_{:016x}.db", test_db_dir().display(), rand::random::<u64>())
}

/// Closes `db` and deletes its file, unless [`KEEP_TEST_DB_VAR`] is set.
pub async fn remove_test_database(mut db: SqliteDatabase) {
    let url = db.url().to_string();
    db.close().await;
    if std::env::var(KEEP_TEST_DB_VAR).is_ok() {
        info!("🚀️ Keeping test database {url}");
        return;
    }
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🚀️ Could not remove test database {url}: {e}");
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn urls_are_unique() {
        let a = random_db_url();
        let b = random_db_url();
        assert_ne!(a, b);
        assert!(a.starts_with("sqlite://") && a.ends_with(".db"));
    }
}
