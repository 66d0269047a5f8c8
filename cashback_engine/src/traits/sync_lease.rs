use chrono::Duration;

use crate::traits::LedgerError;

/// A lease that serialises order syncs across every process sharing the database.
#[allow(async_fn_in_trait)]
pub trait SyncLeaseManagement {
    /// Takes the lease for `holder` for `duration`. Returns `false` if another holder has an unexpired lease.
    async fn try_acquire_sync_lease(&self, holder: &str, duration: Duration) -> Result<bool, LedgerError>;

    /// Releases the lease if `holder` still holds it. Releasing a lease that was taken over is a no-op.
    async fn release_sync_lease(&self, holder: &str) -> Result<(), LedgerError>;
}
