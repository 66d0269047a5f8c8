use crate::{
    db_types::{BalanceAdjustment, UserAccount, UserId},
    traits::LedgerError,
};

/// Access to user accounts and their `available` and `pending` balance buckets.
#[allow(async_fn_in_trait)]
pub trait BalanceManagement {
    async fn fetch_user_account(&self, user_id: &UserId) -> Result<Option<UserAccount>, LedgerError>;

    /// Creates a zero-balance account for `user_id`. Calling this for an existing user returns the existing account
    /// unchanged.
    async fn create_user_account(&self, user_id: &UserId) -> Result<UserAccount, LedgerError>;

    /// Applies both deltas of `adjustment` in one atomic update.
    ///
    /// Returns [`LedgerError::UserNotFound`] if there is no such user.
    async fn adjust_balance(&self, user_id: &UserId, adjustment: BalanceAdjustment)
        -> Result<UserAccount, LedgerError>;
}
