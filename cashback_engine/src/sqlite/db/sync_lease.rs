use chrono::{DateTime, Utc};
use log::trace;
use sqlx::SqliteConnection;

/// Takes the sync lease for `holder` until `expires_at`, if nobody holds it or the current lease has expired.
/// Returns `true` if the lease was taken.
pub async fn try_acquire(
    holder: &str,
    now: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let taken = sqlx::query(
        r#"
            UPDATE sync_lease SET holder = $1, expires_at = $2
            WHERE id = 1 AND (holder IS NULL OR expires_at <= $3);
        "#,
    )
    .bind(holder)
    .bind(expires_at.timestamp_millis())
    .bind(now.timestamp_millis())
    .execute(conn)
    .await?
    .rows_affected();
    let taken = taken == 1;
    trace!("🗃️ Sync lease {} by {holder}", if taken { "taken" } else { "refused" });
    Ok(taken)
}

/// Gives the lease up, but only if `holder` still holds it.
pub async fn release(holder: &str, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let released = sqlx::query("UPDATE sync_lease SET holder = NULL, expires_at = 0 WHERE id = 1 AND holder = $1")
        .bind(holder)
        .execute(conn)
        .await?
        .rows_affected();
    Ok(released == 1)
}
