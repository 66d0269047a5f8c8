#![allow(dead_code)]

use cashback_engine::{
    db_types::{Platform, Rate, RawOrderEvent, UserAccount, UserId, Vnd},
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_env, remove_test_database},
    BalanceManagement,
    LedgerConfig,
    OrderLedgerApi,
    SqliteDatabase,
};

pub async fn setup() -> SqliteDatabase {
    prepare_test_env(5).await
}

pub async fn ledger_with_users(users: &[&str], producers: EventProducers) -> OrderLedgerApi<SqliteDatabase> {
    let db = setup().await;
    for user in users {
        db.create_user_account(&UserId::from(*user)).await.expect("Error creating user");
    }
    OrderLedgerApi::new(db, LedgerConfig::default(), producers)
}

pub async fn tear_down(db: SqliteDatabase) {
    remove_test_database(db).await;
}

pub async fn balances(db: &SqliteDatabase, user: &str) -> (Vnd, Vnd) {
    let UserAccount { available_balance, pending_balance, .. } =
        db.fetch_user_account(&UserId::from(user)).await.expect("Error fetching account").expect("No such user");
    (available_balance, pending_balance)
}

/// A TikTok order event for 100.000₫ at 10% commission.
pub fn tiktok_event(order_id: &str, tracking_id: &str, status: &str) -> RawOrderEvent {
    RawOrderEvent::new(Platform::TikTok, order_id, Vnd::from(100_000), status)
        .with_tracking_id(tracking_id)
        .with_commission_rate(Rate::from_bps(1000))
}
