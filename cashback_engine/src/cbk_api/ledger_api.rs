use std::fmt::Debug;

use log::*;

use crate::{
    cbk_api::{
        attribution::AttributionResolver,
        order_objects::{EventOutcome, ReconcileSummary},
        status_map::map_external_status,
    },
    db_types::{NewOrder, Order, OrderStatusType, Platform, Rate, RawOrderEvent, UserId},
    events::{CashbackCreditedEvent, EventProducers, OrderCreatedEvent, OrderReopenedEvent},
    traits::{
        BalanceEffect,
        BalanceManagement,
        LedgerError,
        LinkConversionManagement,
        NewOrderResult,
        ReconciliationDatabase,
        StatusChangeResult,
    },
};

/// The default share of the commission that is paid back to the user: 70%.
pub const DEFAULT_CASHBACK_RATE: Rate = Rate::from_bps(7000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    /// The share of each order's commission credited to the user. Snapshotted onto every new order.
    pub cashback_rate: Rate,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self { cashback_rate: DEFAULT_CASHBACK_RATE }
    }
}

/// `OrderLedgerApi` reconciles marketplace order events against the stored orders and moves cashback between the
/// pending and available balance buckets as orders progress.
///
/// Each event is handled independently and each write happens in a single backend transaction, so running the same
/// batch any number of times leaves balances exactly where one run would.
pub struct OrderLedgerApi<B> {
    db: B,
    resolver: AttributionResolver<B>,
    config: LedgerConfig,
    producers: EventProducers,
}

impl<B> Debug for OrderLedgerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderLedgerApi ({:?})", self.config)
    }
}

impl<B> OrderLedgerApi<B>
where B: BalanceManagement + LinkConversionManagement + Clone
{
    pub fn new(db: B, config: LedgerConfig, producers: EventProducers) -> Self {
        let resolver = AttributionResolver::new(db.clone());
        Self { db, resolver, config, producers }
    }
}

impl<B> OrderLedgerApi<B> {
    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }
}

impl<B> OrderLedgerApi<B>
where B: ReconciliationDatabase
{
    /// Applies a batch of order events.
    ///
    /// A failure on one event is logged and counted; it never stops the rest of the batch.
    pub async fn reconcile(&self, events: &[RawOrderEvent]) -> ReconcileSummary {
        let mut summary = ReconcileSummary::default();
        for event in events {
            match self.process_event(event).await {
                Ok(outcome) => {
                    trace!("🔄️ {} {}: {outcome:?}", event.platform, event.external_order_id);
                    summary.record(&outcome);
                },
                Err(e) => {
                    error!("🔄️ Could not process {} order {}. {e}", event.platform, event.external_order_id);
                    summary.failed += 1;
                },
            }
        }
        info!("🔄️ Reconciled {} order events: {summary}", events.len());
        summary
    }

    /// Applies a single order event.
    ///
    /// * An unknown order is attributed to a user and created, and its cashback credited to the pending bucket, or the
    ///   available bucket if the order is already completed.
    /// * A known order with a new status is moved to that status. Entering `Completed` for the first time releases its
    ///   cashback from pending to available.
    /// * A known order with an unchanged status is left alone.
    pub async fn process_event(&self, event: &RawOrderEvent) -> Result<EventOutcome, LedgerError> {
        let external_id = event.external_order_id.trim();
        if external_id.is_empty() {
            warn!("🔄️ Ignoring {} order event without an order id", event.platform);
            return Ok(EventOutcome::Invalid("missing external order id".into()));
        }
        if event.total_amount.value() < 0 || event.commission_rate.bps() < 0 {
            warn!("🔄️ Ignoring {} order {external_id} with a negative amount or rate", event.platform);
            return Ok(EventOutcome::Invalid("negative amount or commission rate".into()));
        }
        if !event.commission_rate.is_proportion() {
            let rate = event.commission_rate;
            warn!("🔄️ Ignoring {} order {external_id} with a commission rate of {rate}", event.platform);
            return Ok(EventOutcome::Invalid("commission rate above 100%".into()));
        }
        let status = map_external_status(event.platform, &event.external_status);
        match self.db.fetch_order_by_external_id(event.platform, external_id).await? {
            Some(order) => self.update_existing_order(order, status).await,
            None => self.create_order(event, external_id, status).await,
        }
    }

    async fn create_order(
        &self,
        event: &RawOrderEvent,
        external_id: &str,
        status: OrderStatusType,
    ) -> Result<EventOutcome, LedgerError> {
        let attribution = self
            .resolver
            .resolve(event.platform, event.tracking_id.as_deref(), event.external_item_id.as_deref())
            .await?;
        let Some(user_id) = attribution.user_id().cloned() else {
            warn!("🔄️ Cannot match {} order {external_id} to any user", event.platform);
            return Ok(EventOutcome::Unattributable);
        };
        debug!("🔄️ {} order {external_id} attributed to {attribution}", event.platform);
        let new_order = self.new_order(event, external_id, user_id, status);
        match self.db.record_new_order(new_order).await? {
            NewOrderResult::Created { order, effect } => {
                info!("🔄️ Synced {order}");
                self.call_order_created_hook(&order).await;
                if effect.credits_available() {
                    self.call_cashback_credited_hook(&order, effect).await;
                }
                Ok(EventOutcome::Created(order))
            },
            NewOrderResult::AlreadyExists(order) => {
                debug!("🔄️ {order} was created by another writer in the meantime");
                Ok(EventOutcome::Conflict)
            },
        }
    }

    async fn update_existing_order(&self, order: Order, status: OrderStatusType) -> Result<EventOutcome, LedgerError> {
        if order.status == status {
            trace!("🔄️ {order} is unchanged");
            return Ok(EventOutcome::Unchanged);
        }
        match self.db.record_status_change(&order, status).await? {
            StatusChangeResult::Conflict => Ok(EventOutcome::Conflict),
            StatusChangeResult::Updated { old_order, new_order, effect } => {
                info!(
                    "🔄️ {} order {} moved from {} to {status}",
                    new_order.platform, new_order.external_order_id, old_order.status
                );
                if effect.credits_available() {
                    self.call_cashback_credited_hook(&new_order, effect).await;
                }
                if is_reopened(&old_order, status) {
                    warn!(
                        "🔄️ {} order {} left {} after its cashback of {} was credited to {}. Balances are unchanged; \
                         this needs manual review.",
                        new_order.platform,
                        new_order.external_order_id,
                        old_order.status,
                        old_order.cashback_amount,
                        old_order.user_id
                    );
                    self.call_order_reopened_hook(&new_order, old_order.status).await;
                }
                let credited = effect.credits_available().then(|| effect.amount());
                Ok(EventOutcome::StatusUpdated { order: new_order, credited })
            },
        }
    }

    fn new_order(&self, event: &RawOrderEvent, external_id: &str, user_id: UserId, status: OrderStatusType) -> NewOrder {
        let commission_amount = event.commission_rate.apply(event.total_amount);
        let cashback_rate = self.config.cashback_rate;
        let cashback_amount = cashback_rate.apply(commission_amount);
        let product_name = event
            .product_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .unwrap_or_else(|| default_product_name(event.platform));
        NewOrder {
            platform: event.platform,
            external_order_id: external_id.to_string(),
            user_id,
            external_item_id: event.external_item_id.clone(),
            product_name,
            product_image: event.product_image.clone(),
            product_price: event.total_amount,
            quantity: event.quantity.filter(|q| *q > 0).unwrap_or(1),
            total_amount: event.total_amount,
            commission_rate: event.commission_rate,
            commission_amount,
            cashback_rate,
            cashback_amount,
            status,
            purchased_at: event.purchased_at(),
        }
    }

    async fn call_order_created_hook(&self, order: &Order) {
        for emitter in &self.producers.order_created_producer {
            debug!("🔄️📬️ Notifying order created hook subscribers");
            emitter.publish_event(OrderCreatedEvent::new(order.clone())).await;
        }
    }

    async fn call_cashback_credited_hook(&self, order: &Order, effect: BalanceEffect) {
        for emitter in &self.producers.cashback_credited_producer {
            debug!("🔄️📬️ Notifying cashback credited hook subscribers");
            emitter.publish_event(CashbackCreditedEvent::new(order.clone(), effect.amount())).await;
        }
    }

    async fn call_order_reopened_hook(&self, order: &Order, previous: OrderStatusType) {
        for emitter in &self.producers.order_reopened_producer {
            debug!("🔄️📬️ Notifying order reopened hook subscribers");
            emitter.publish_event(OrderReopenedEvent::new(order.clone(), previous)).await;
        }
    }
}

/// A credited order leaving `Completed` for `Cancelled` or `Refunded`. Cashback is not clawed back automatically.
fn is_reopened(old_order: &Order, new_status: OrderStatusType) -> bool {
    old_order.status == OrderStatusType::Completed &&
        old_order.cashback_credited &&
        matches!(new_status, OrderStatusType::Cancelled | OrderStatusType::Refunded)
}

fn default_product_name(platform: Platform) -> String {
    format!("{platform} Product")
}
