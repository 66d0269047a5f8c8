use cashback_engine::{
    db_types::{Rate, RawOrderEvent},
    events::EventProducers,
    order_objects::ReconcileSummary,
    test_utils::prepare_env::{prepare_test_env, remove_test_database},
    LedgerConfig,
    OrderLedgerApi,
    ReconciliationDatabase,
    SqliteDatabase,
};
use cucumber::World;
use log::*;

#[derive(Default, Debug, World)]
pub struct LedgerWorld {
    pub system: Option<LedgerSystem>,
    /// The events received since the last sync.
    pub inbox: Vec<RawOrderEvent>,
    pub last_summary: Option<ReconcileSummary>,
}

#[derive(Debug)]
pub struct LedgerSystem {
    pub db: SqliteDatabase,
    pub api: OrderLedgerApi<SqliteDatabase>,
}

impl LedgerWorld {
    pub fn system(&self) -> &LedgerSystem {
        self.system.as_ref().expect("Ledger not initialised")
    }

    pub fn api(&self) -> &OrderLedgerApi<SqliteDatabase> {
        &self.system().api
    }
}

impl LedgerSystem {
    pub async fn new(cashback_rate: Rate) -> Self {
        let db = prepare_test_env(1).await;
        debug!("Created database: {}", db.url());
        let config = LedgerConfig { cashback_rate };
        let api = OrderLedgerApi::new(db.clone(), config, EventProducers::default());
        Self { db, api }
    }

    /// Deletes the scenario's database if it passed. A failed scenario leaves its database behind for inspection.
    pub async fn clean_up(&self, passed: bool) {
        if passed {
            remove_test_database(self.db.clone()).await;
        } else {
            error!("🚀️ Scenario failed. Its database is at {}", self.db.url());
        }
    }
}
