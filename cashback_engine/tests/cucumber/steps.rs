use cashback_engine::{
    db_types::{OrderStatusType, Platform, Rate, RawOrderEvent, UserId, Vnd},
    order_objects::ReconcileSummary,
    BalanceManagement,
    OrderManagement,
};
use cucumber::{gherkin::Step, then, when};

use crate::cucumber::LedgerWorld;

fn platform(name: &str) -> Platform {
    name.parse().expect("Unknown platform")
}

// When TikTok reports order O1 tracked to U1 for 100000 VND at 10% commission with status UNPAID
#[when(
    expr = "{word} reports order {word} tracked to {word} for {int} VND at {word} commission with status {word}"
)]
async fn report_order(
    world: &mut LedgerWorld,
    marketplace: String,
    order_id: String,
    tracking_id: String,
    amount: i64,
    rate: String,
    status: String,
) {
    let rate = rate.parse::<Rate>().expect("Invalid commission rate");
    let event = RawOrderEvent::new(platform(&marketplace), order_id, Vnd::from(amount), &status)
        .with_tracking_id(tracking_id)
        .with_commission_rate(rate);
    world.inbox.push(event);
}

#[when(expr = "{word} reports order {word} for item {word} for {int} VND at {word} commission with status {word}")]
async fn report_untracked_order(
    world: &mut LedgerWorld,
    marketplace: String,
    order_id: String,
    item_id: String,
    amount: i64,
    rate: String,
    status: String,
) {
    let rate = rate.parse::<Rate>().expect("Invalid commission rate");
    let event = RawOrderEvent::new(platform(&marketplace), order_id, Vnd::from(amount), &status)
        .with_item_id(item_id)
        .with_commission_rate(rate);
    world.inbox.push(event);
}

#[when("the marketplaces report the following orders")]
async fn report_orders_table(world: &mut LedgerWorld, step: &Step) {
    let table = step.table.as_ref().expect("Expected a data table");
    for row in table.rows.iter().skip(1) {
        let [marketplace, order_id, tracking_id, amount, rate, status] = &row[..] else {
            panic!("Expected 6 columns: platform, order, tracking id, amount, commission, status");
        };
        let amount = amount.parse::<i64>().expect("Invalid amount");
        let rate = rate.parse::<Rate>().expect("Invalid commission rate");
        let event = RawOrderEvent::new(platform(marketplace), order_id.clone(), Vnd::from(amount), status)
            .with_tracking_id(tracking_id.clone())
            .with_commission_rate(rate);
        world.inbox.push(event);
    }
}

#[when("the orders are synced")]
async fn sync_orders(world: &mut LedgerWorld) {
    let events = std::mem::take(&mut world.inbox);
    let summary = world.api().reconcile(&events).await;
    world.last_summary = Some(summary);
}

#[then(expr = "the sync reports {int} synced, {int} skipped and {int} failed")]
async fn check_summary(world: &mut LedgerWorld, synced: usize, skipped: usize, failed: usize) {
    let summary = world.last_summary.expect("No sync has run");
    assert_eq!(summary, ReconcileSummary { synced, skipped, failed });
}

#[then(expr = "{word} order {word} has status {word}")]
async fn check_status(world: &mut LedgerWorld, marketplace: String, order_id: String, status: String) {
    let order = world
        .system()
        .db
        .fetch_order_by_external_id(platform(&marketplace), &order_id)
        .await
        .expect("Error fetching order")
        .expect("Order does not exist");
    let expected = status.parse::<OrderStatusType>().expect("Invalid status");
    assert_eq!(order.status, expected);
    assert_eq!(order.completed_at.is_some(), expected == OrderStatusType::Completed);
}

#[then(expr = "{word} order {word} has commission {int} and cashback {int}")]
async fn check_amounts(world: &mut LedgerWorld, marketplace: String, order_id: String, commission: i64, cashback: i64) {
    let order = world
        .system()
        .db
        .fetch_order_by_external_id(platform(&marketplace), &order_id)
        .await
        .expect("Error fetching order")
        .expect("Order does not exist");
    assert_eq!(order.commission_amount, Vnd::from(commission));
    assert_eq!(order.cashback_amount, Vnd::from(cashback));
}

#[then(expr = "{word} order {word} does not exist")]
async fn check_absent(world: &mut LedgerWorld, marketplace: String, order_id: String) {
    let order = world
        .system()
        .db
        .fetch_order_by_external_id(platform(&marketplace), &order_id)
        .await
        .expect("Error fetching order");
    assert!(order.is_none());
}

#[then(expr = "{word} has {int} available and {int} pending")]
async fn check_balances(world: &mut LedgerWorld, user: String, available: i64, pending: i64) {
    let account = world
        .system()
        .db
        .fetch_user_account(&UserId::from(user))
        .await
        .expect("Error fetching account")
        .expect("Account does not exist");
    assert_eq!(account.available_balance, Vnd::from(available), "available balance");
    assert_eq!(account.pending_balance, Vnd::from(pending), "pending balance");
}
