use cashback_engine::{
    db_types::{Rate, UserId},
    BalanceManagement,
    DEFAULT_CASHBACK_RATE,
};
use cucumber::given;

use crate::cucumber::{ledger_world::LedgerSystem, LedgerWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut LedgerWorld) {
    world.system = Some(LedgerSystem::new(DEFAULT_CASHBACK_RATE).await);
}

#[given(expr = "a fresh install with a cashback rate of {float}")]
async fn fresh_database_with_rate(world: &mut LedgerWorld, rate: f64) {
    let rate = Rate::from_fraction_str(&rate.to_string()).expect("Invalid cashback rate");
    world.system = Some(LedgerSystem::new(rate).await);
}

#[given(expr = "a user {word}")]
async fn a_user(world: &mut LedgerWorld, user: String) {
    world.system().db.create_user_account(&UserId::from(user)).await.expect("Error creating user");
}
