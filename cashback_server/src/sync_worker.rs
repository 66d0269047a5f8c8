use std::sync::Arc;

use cashback_engine::{SqliteDatabase, SyncApi, SyncOutcome};
use log::*;
use tokio::task::JoinHandle;

use crate::integrations::Marketplace;

pub type MarketplaceSyncApi = SyncApi<SqliteDatabase, Marketplace>;

/// Starts the periodic sync worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// The first sync runs immediately. A tick that arrives while a manual sync is still running is skipped by the
/// sync guard, and missed ticks are not made up.
pub fn start_sync_worker(api: Arc<MarketplaceSyncApi>, interval: chrono::Duration) -> JoinHandle<()> {
    let period = interval.to_std().unwrap_or_else(|e| {
        error!("🕰️ Invalid sync interval {interval}. {e}. Falling back to 30 minutes");
        std::time::Duration::from_secs(30 * 60)
    });
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(period);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        info!("🕰️ Order sync worker started. Syncing every {} minutes", period.as_secs() / 60);
        loop {
            timer.tick().await;
            info!("🕰️ Running scheduled order sync");
            match api.run_sync().await {
                Ok(SyncOutcome::Completed(report)) => {
                    info!(
                        "🕰️ Scheduled sync finished. {} events fetched between {} and {}: {}",
                        report.fetched, report.window_start, report.window_end, report.summary
                    );
                },
                Ok(SyncOutcome::AlreadyRunning) => {
                    info!("🕰️ Previous sync still in progress. Skipping this tick");
                },
                Err(e) => {
                    error!("🕰️ Error running scheduled order sync: {e}");
                },
            }
        }
    })
}
