use std::{path::Path, sync::Arc};

use cashback_engine::{
    db_types::{Platform, UserId},
    events::{EventHandlers, EventProducers},
    order_objects::AccountSummary,
    AccountApi,
    LinkApi,
    LinkApiError,
    LinkConversionResult,
    OrderLedgerApi,
    SqliteDatabase,
    SyncApi,
    SyncOutcome,
};
use futures::future::join_all;
use log::*;
use tokio::task::JoinHandle;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::{ledger_events::create_ledger_event_handlers, Marketplace},
    sync_worker::{start_sync_worker, MarketplaceSyncApi},
};

const MAX_DB_CONNECTIONS: u32 = 25;

/// Connects to the configured SQLite database, creating the file and its directory if needed, and brings the schema
/// up to date.
pub async fn open_database(config: &ServerConfig) -> Result<SqliteDatabase, ServerError> {
    if let Some(dir) = sqlite_parent_dir(&config.database_url) {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            debug!("🗃️ Creating database directory {}", dir.display());
            std::fs::create_dir_all(dir)?;
        }
    }
    let db = SqliteDatabase::new_with_url(&config.database_url, MAX_DB_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(format!("Could not open {}. {e}", config.database_url)))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(format!("Migrations failed. {e}")))?;
    Ok(db)
}

/// Runs the sync scheduler until the process receives Ctrl-C.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = open_database(&config).await?;
    let handlers = create_ledger_event_handlers();
    let producers = handlers.producers();
    let event_jobs = spawn_event_handlers(handlers);
    let api = Arc::new(create_sync_api(&config, db, producers)?);
    let worker = start_sync_worker(Arc::clone(&api), config.sync_interval);
    tokio::signal::ctrl_c().await?;
    info!("🚀️ Shutdown requested. Stopping the sync worker");
    worker.abort();
    if let Err(e) = worker.await {
        trace!("🚀️ Sync worker stopped: {e}");
    }
    drop(api);
    join_all(event_jobs).await;
    Ok(())
}

/// Runs a single sync over every enabled marketplace and waits for the ledger event subscribers to finish.
pub async fn sync_now(config: &ServerConfig) -> Result<SyncOutcome, ServerError> {
    let db = open_database(config).await?;
    let handlers = create_ledger_event_handlers();
    let producers = handlers.producers();
    let event_jobs = spawn_event_handlers(handlers);
    let api = create_sync_api(config, db, producers)?;
    let outcome = api.trigger().await;
    drop(api);
    join_all(event_jobs).await;
    Ok(outcome?)
}

/// Converts `url` into an affiliate link tracked to `user`. The user must already be registered.
pub async fn convert_link(config: &ServerConfig, user: &str, url: &str) -> Result<LinkConversionResult, ServerError> {
    let platform = Platform::detect_from_url(url.trim()).ok_or_else(|| LinkApiError::UnsupportedPlatform(url.into()))?;
    let provider = Marketplace::for_platform(platform, config)?;
    let db = open_database(config).await?;
    let user_id = UserId::from(user.trim());
    if AccountApi::new(db.clone()).account(&user_id).await?.is_none() {
        return Err(ServerError::NoRecordFound(format!("User {user_id} is not registered")));
    }
    let api = LinkApi::new(db, config.estimate_share);
    let result = api.convert_link(&user_id, url, &provider).await?;
    Ok(result)
}

pub async fn add_user(config: &ServerConfig, user: &str) -> Result<(), ServerError> {
    let user = user.trim();
    if user.is_empty() {
        return Err(ServerError::ConfigurationError("A user id cannot be blank".into()));
    }
    let db = open_database(config).await?;
    let account = AccountApi::new(db).create_account(&UserId::from(user)).await?;
    info!("🗃️ User {} registered at {}", account.id, account.created_at);
    Ok(())
}

pub async fn show_balance(config: &ServerConfig, user: &str) -> Result<AccountSummary, ServerError> {
    let db = open_database(config).await?;
    let user_id = UserId::from(user.trim());
    AccountApi::new(db).summary(&user_id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("User {user_id}")))
}

pub fn create_sync_api(
    config: &ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<MarketplaceSyncApi, ServerError> {
    let sources = Marketplace::enabled_sources(config)?;
    if sources.is_empty() {
        warn!("🕰️ Every marketplace is disabled. Syncs will not fetch any orders");
    }
    let ledger = OrderLedgerApi::new(db, config.ledger, producers);
    Ok(SyncApi::new(ledger, sources, config.sync_lookback))
}

/// Starts every configured event handler. Each task ends once all of its producers have been dropped.
fn spawn_event_handlers(handlers: EventHandlers) -> Vec<JoinHandle<()>> {
    let EventHandlers { on_order_created, on_cashback_credited, on_order_reopened } = handlers;
    let mut jobs = Vec::with_capacity(3);
    if let Some(handler) = on_order_created {
        jobs.push(tokio::spawn(handler.start_handler()));
    }
    if let Some(handler) = on_cashback_credited {
        jobs.push(tokio::spawn(handler.start_handler()));
    }
    if let Some(handler) = on_order_reopened {
        jobs.push(tokio::spawn(handler.start_handler()));
    }
    jobs
}

/// The directory holding the database file of a `sqlite:` URL, if the URL names a file.
fn sqlite_parent_dir(url: &str) -> Option<&Path> {
    let path = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Path::new(path).parent()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parent_dir_of_sqlite_urls() {
        assert_eq!(sqlite_parent_dir("sqlite://data/cashback.db"), Some(Path::new("data")));
        assert_eq!(sqlite_parent_dir("sqlite:/var/lib/cbk/cashback.db?mode=rwc"), Some(Path::new("/var/lib/cbk")));
        assert_eq!(sqlite_parent_dir("sqlite::memory:"), None);
        assert_eq!(sqlite_parent_dir("postgres://localhost/cbk"), None);
        assert_eq!(sqlite_parent_dir("sqlite://cashback.db"), Some(Path::new("")));
    }
}
