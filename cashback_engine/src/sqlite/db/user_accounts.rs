use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{BalanceAdjustment, UserAccount, UserId},
    traits::LedgerError,
};

pub async fn user_account_by_id(
    user_id: &UserId,
    conn: &mut SqliteConnection,
) -> Result<Option<UserAccount>, sqlx::Error> {
    let account = sqlx::query_as("SELECT * FROM user_accounts WHERE id = $1")
        .bind(user_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(account)
}

/// Creates a zero-balance account. This function is idempotent due to the primary key on the table.
pub async fn create_account(user_id: &UserId, conn: &mut SqliteConnection) -> Result<UserAccount, LedgerError> {
    let inserted = sqlx::query("INSERT INTO user_accounts (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
        .bind(user_id.as_str())
        .execute(&mut *conn)
        .await?
        .rows_affected();
    if inserted > 0 {
        debug!("🗃️ Created account for user {user_id}");
    }
    user_account_by_id(user_id, conn).await?.ok_or_else(|| LedgerError::UserNotFound(user_id.clone()))
}

/// Adds both deltas to the user's balance buckets in a single statement.
pub async fn adjust_balances(
    user_id: &UserId,
    adjustment: BalanceAdjustment,
    conn: &mut SqliteConnection,
) -> Result<UserAccount, LedgerError> {
    let BalanceAdjustment { available_delta, pending_delta } = adjustment;
    let account: Option<UserAccount> = sqlx::query_as(
        r#"
            UPDATE user_accounts SET
                available_balance = available_balance + $1,
                pending_balance = pending_balance + $2,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $3
            RETURNING *;
        "#,
    )
    .bind(available_delta.value())
    .bind(pending_delta.value())
    .bind(user_id.as_str())
    .fetch_optional(conn)
    .await?;
    let account = account.ok_or_else(|| LedgerError::UserNotFound(user_id.clone()))?;
    trace!(
        "🗃️ Balances for {user_id} adjusted by {available_delta} available, {pending_delta} pending. Now {} / {}",
        account.available_balance,
        account.pending_balance
    );
    Ok(account)
}
