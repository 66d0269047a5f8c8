use cashback_engine::events::{CashbackCreditedEvent, EventHandlers, EventHooks, OrderCreatedEvent, OrderReopenedEvent};
use log::*;

pub const LEDGER_EVENT_BUFFER_SIZE: usize = 25;

/// Subscribes to the ledger's events and writes an audit line for each.
///
/// Reopened orders are logged at `warn`: their cashback was already paid out and has to be reviewed by hand.
pub fn create_ledger_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_order_created(|ev: OrderCreatedEvent| {
        let order = ev.order;
        Box::pin(async move {
            info!(
                "📬️ New {} order {} for {}. Cashback {} ({})",
                order.platform, order.external_order_id, order.user_id, order.cashback_amount, order.status
            );
        })
    });
    hooks.on_cashback_credited(|ev: CashbackCreditedEvent| {
        let CashbackCreditedEvent { order, amount } = ev;
        Box::pin(async move {
            info!(
                "📬️ {amount} cashback is now available to {} from {} order {}",
                order.user_id, order.platform, order.external_order_id
            );
        })
    });
    hooks.on_order_reopened(|ev: OrderReopenedEvent| {
        let OrderReopenedEvent { order, previous } = ev;
        Box::pin(async move {
            warn!(
                "📬️ MANUAL REVIEW: {} order {} went from {previous} to {} after {} cashback was paid to {}",
                order.platform, order.external_order_id, order.status, order.cashback_amount, order.user_id
            );
        })
    });
    EventHandlers::new(LEDGER_EVENT_BUFFER_SIZE, hooks)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn every_ledger_event_has_a_subscriber() {
        let handlers = create_ledger_event_handlers();
        let producers = handlers.producers();
        assert_eq!(producers.order_created_producer.len(), 1);
        assert_eq!(producers.cashback_credited_producer.len(), 1);
        assert_eq!(producers.order_reopened_producer.len(), 1);
    }
}
