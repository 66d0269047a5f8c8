use std::path::PathBuf;

use cashback_engine::{
    db_types::{Platform, RawOrderEvent, UserId, Vnd},
    events::EventProducers,
    BalanceManagement,
    LinkApiError,
    MarketplaceError,
    OrderLedgerApi,
    OrderSource,
    SyncApi,
    SyncError,
    SyncLeaseManagement,
    SyncOutcome,
};
use cashback_server::{
    config::ServerConfig,
    errors::ServerError,
    server::{add_user, convert_link, open_database, show_balance, sync_now},
};
use cbk_common::Rate;
use chrono::{DateTime, Duration, Utc};
use mockall::mock;

mock! {
    pub Source {}
    impl OrderSource for Source {
        fn platform(&self) -> Platform;
        async fn fetch_recent(
            &self,
            window_start: DateTime<Utc>,
            window_end: DateTime<Utc>,
        ) -> Result<Vec<RawOrderEvent>, MarketplaceError>;
    }
}

fn test_dir(name: &str) -> PathBuf {
    let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    std::env::temp_dir().join(format!("cbk_server_{name}_{stamp}"))
}

fn config_for(name: &str) -> ServerConfig {
    let _ = env_logger::try_init();
    let dir = test_dir(name);
    ServerConfig {
        database_url: format!("sqlite://{}/data/cashback.db", dir.display()),
        shopee_enabled: false,
        tiktok_enabled: false,
        ..Default::default()
    }
}

fn shopee_event(order_id: &str, user: &str, status: &str) -> RawOrderEvent {
    RawOrderEvent::new(Platform::Shopee, order_id, Vnd::from(200_000), status)
        .with_tracking_id(user)
        .with_item_id("23456789")
        .with_commission_rate(Rate::from_bps(1000))
}

#[tokio::test]
async fn database_directory_is_created() {
    let config = config_for("open");
    let path = config.database_url.trim_start_matches("sqlite://").to_string();
    let db = open_database(&config).await.expect("database should open");
    assert!(PathBuf::from(&path).exists());
    assert!(db.fetch_user_account(&UserId::from("nobody")).await.unwrap().is_none());
}

#[tokio::test]
async fn registered_users_start_with_empty_balances() {
    let config = config_for("balance");
    add_user(&config, " alice ").await.expect("user should be added");
    let summary = show_balance(&config, "alice").await.expect("user should exist");
    assert_eq!(summary.account.id, UserId::from("alice"));
    assert_eq!(summary.account.available_balance, Vnd::from(0));
    assert_eq!(summary.account.pending_balance, Vnd::from(0));
    assert_eq!(summary.order_count, 0);
    // Adding the same user twice is harmless
    add_user(&config, "alice").await.expect("user should be added again");
    let err = show_balance(&config, "bob").await.unwrap_err();
    assert!(matches!(err, ServerError::NoRecordFound(_)), "{err}");
    let err = add_user(&config, "  ").await.unwrap_err();
    assert!(matches!(err, ServerError::ConfigurationError(_)), "{err}");
}

#[tokio::test]
async fn links_are_only_converted_for_known_users_and_marketplaces() {
    let config = config_for("convert");
    let err = convert_link(&config, "alice", "https://www.lazada.vn/products/abc-i123.html").await.unwrap_err();
    assert!(matches!(err, ServerError::LinkError(LinkApiError::UnsupportedPlatform(_))), "{err}");
    let err = convert_link(&config, "alice", "https://shopee.vn/product/1234/5678").await.unwrap_err();
    assert!(matches!(err, ServerError::NoRecordFound(_)), "{err}");
}

#[tokio::test]
async fn sync_with_every_marketplace_disabled_is_empty() {
    let config = config_for("sync_now");
    match sync_now(&config).await.expect("sync should run") {
        SyncOutcome::Completed(report) => {
            assert_eq!(report.fetched, 0);
            assert_eq!(report.summary.total(), 0);
            assert_eq!(report.window_end - report.window_start, config.sync_lookback);
        },
        SyncOutcome::AlreadyRunning => panic!("No other sync should be running"),
    }
}

#[tokio::test]
async fn sync_now_stands_down_while_the_server_is_syncing() {
    let config = config_for("sync_lease");
    let db = open_database(&config).await.unwrap();
    assert!(db.try_acquire_sync_lease("cashback_server run", Duration::minutes(5)).await.unwrap());
    assert_eq!(sync_now(&config).await.expect("sync should answer"), SyncOutcome::AlreadyRunning);
    db.release_sync_lease("cashback_server run").await.unwrap();
    assert!(matches!(sync_now(&config).await.unwrap(), SyncOutcome::Completed(_)));
}

#[tokio::test]
async fn mocked_source_is_reconciled_into_balances() {
    let config = config_for("mock_sync");
    add_user(&config, "alice").await.unwrap();
    let db = open_database(&config).await.unwrap();
    let lookback = Duration::days(3);

    let mut first = MockSource::new();
    first.expect_platform().return_const(Platform::Shopee);
    first
        .expect_fetch_recent()
        .withf(move |start, end| *end - *start == lookback)
        .times(1)
        .returning(|_, _| Ok(vec![shopee_event("S1", "alice", "PENDING"), shopee_event("S2", "stranger", "PENDING")]));
    let ledger = OrderLedgerApi::new(db.clone(), config.ledger, EventProducers::default());
    let api = SyncApi::new(ledger, vec![first], lookback);
    let SyncOutcome::Completed(report) = api.run_sync().await.unwrap() else {
        panic!("Sync should have completed");
    };
    assert_eq!(report.fetched, 2);
    assert_eq!(report.summary.synced, 1);
    assert_eq!(report.summary.skipped, 1);
    // 200,000 × 10% commission × 70% cashback
    let account = db.fetch_user_account(&UserId::from("alice")).await.unwrap().unwrap();
    assert_eq!(account.pending_balance, Vnd::from(14_000));
    assert_eq!(account.available_balance, Vnd::from(0));

    let mut second = MockSource::new();
    second.expect_platform().return_const(Platform::Shopee);
    second
        .expect_fetch_recent()
        .times(2)
        .returning(|_, _| Ok(vec![shopee_event("S1", "alice", "COMPLETED")]));
    let ledger = OrderLedgerApi::new(db.clone(), config.ledger, EventProducers::default());
    let api = SyncApi::new(ledger, vec![second], lookback);
    api.run_sync().await.unwrap();
    api.run_sync().await.unwrap();
    let account = db.fetch_user_account(&UserId::from("alice")).await.unwrap().unwrap();
    assert_eq!(account.pending_balance, Vnd::from(0));
    assert_eq!(account.available_balance, Vnd::from(14_000));
}

#[tokio::test]
async fn a_failing_source_writes_nothing() {
    let config = config_for("mock_fail");
    add_user(&config, "alice").await.unwrap();
    let db = open_database(&config).await.unwrap();

    let mut shopee = MockSource::new();
    shopee.expect_platform().return_const(Platform::Shopee);
    shopee.expect_fetch_recent().returning(|_, _| Ok(vec![shopee_event("S1", "alice", "COMPLETED")]));
    let mut tiktok = MockSource::new();
    tiktok.expect_platform().return_const(Platform::TikTok);
    tiktok.expect_fetch_recent().returning(|_, _| Err(MarketplaceError::Unavailable("HTTP 503".into())));
    let ledger = OrderLedgerApi::new(db.clone(), config.ledger, EventProducers::default());
    let api = SyncApi::new(ledger, vec![shopee, tiktok], config.sync_lookback);

    let err = api.run_sync().await.unwrap_err();
    assert!(matches!(err, SyncError::SourceUnavailable(Platform::TikTok, _)), "{err}");
    let summary = show_balance(&config, "alice").await.unwrap();
    assert_eq!(summary.order_count, 0);
    assert_eq!(summary.account.available_balance, Vnd::from(0));
}
