use std::{fmt::Debug, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use log::*;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    cbk_api::{errors::SyncError, ledger_api::OrderLedgerApi, order_objects::ReconcileSummary},
    traits::{OrderSource, ReconciliationDatabase, SyncLeaseManagement},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub fetched: usize,
    pub summary: ReconcileSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed(SyncReport),
    /// Another sync was in progress, in this process or another one sharing the database. Nothing was done.
    AlreadyRunning,
}

/// How long a sync lease lasts, in minutes. A process that dies mid-sync blocks other runs for at most this long.
pub const DEFAULT_SYNC_LEASE_MINUTES: i64 = 30;

/// The single sync entrypoint shared by the scheduler and the manual trigger.
///
/// At most one run is in flight at a time. Within a process this is a mutex. Across processes it is a lease row in
/// the database, so `sync-now` and a running server never overlap.
///
/// A run fetches every source for the lookback window first and only then reconciles, so a source failure aborts
/// the run before anything is written.
pub struct SyncApi<B, S> {
    ledger: OrderLedgerApi<B>,
    sources: Vec<S>,
    lookback: Duration,
    lease: Duration,
    holder: String,
    guard: Arc<Mutex<()>>,
}

impl<B, S> Debug for SyncApi<B, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SyncApi ({} sources, lookback {})", self.sources.len(), self.lookback)
    }
}

impl<B, S> SyncApi<B, S> {
    pub fn new(ledger: OrderLedgerApi<B>, sources: Vec<S>, lookback: Duration) -> Self {
        let holder = format!("{}-{:016x}", std::process::id(), rand::random::<u64>());
        Self { ledger, sources, lookback, lease: Duration::minutes(DEFAULT_SYNC_LEASE_MINUTES), holder, guard: Arc::new(Mutex::new(())) }
    }

    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    /// The name this instance writes into the sync lease.
    pub fn holder(&self) -> &str {
        &self.holder
    }

    pub fn ledger(&self) -> &OrderLedgerApi<B> {
        &self.ledger
    }

    pub fn is_running(&self) -> bool {
        self.guard.try_lock().is_err()
    }
}

impl<B, S> SyncApi<B, S>
where
    B: ReconciliationDatabase + SyncLeaseManagement,
    S: OrderSource,
{
    pub async fn run_sync(&self) -> Result<SyncOutcome, SyncError> {
        let Ok(_running) = self.guard.try_lock() else {
            info!("🕰️ A sync is already running. Skipping this one");
            return Ok(SyncOutcome::AlreadyRunning);
        };
        let db = self.ledger.db();
        if !db.try_acquire_sync_lease(&self.holder, self.lease).await? {
            info!("🕰️ Another process holds the sync lease. Skipping this one");
            return Ok(SyncOutcome::AlreadyRunning);
        }
        let result = self.fetch_and_reconcile().await;
        if let Err(e) = db.release_sync_lease(&self.holder).await {
            warn!("🕰️ Could not release the sync lease. It lapses in {}. {e}", self.lease);
        }
        result.map(SyncOutcome::Completed)
    }

    /// Runs a sync on demand. Shares the single-run guard with scheduled runs.
    pub async fn trigger(&self) -> Result<SyncOutcome, SyncError> {
        info!("🕰️ Manual sync requested");
        self.run_sync().await
    }

    async fn fetch_and_reconcile(&self) -> Result<SyncReport, SyncError> {
        let window_end = Utc::now();
        let window_start = window_end - self.lookback;
        debug!("🕰️ Syncing orders from {window_start} to {window_end}");
        let mut events = Vec::new();
        for source in &self.sources {
            let platform = source.platform();
            let batch = source.fetch_recent(window_start, window_end).await.map_err(|e| {
                error!("🕰️ Fetching {platform} orders failed. The sync is abandoned. {e}");
                SyncError::SourceUnavailable(platform, e)
            })?;
            debug!("🕰️ {} order events fetched from {platform}", batch.len());
            events.extend(batch);
        }
        let fetched = events.len();
        let summary = self.ledger.reconcile(&events).await;
        info!("🕰️ Sync complete. {fetched} events: {summary}");
        Ok(SyncReport { window_start, window_end, fetched, summary })
    }
}
