use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{CashbackCreditedEvent, EventHandler, EventProducer, Handler, OrderCreatedEvent, OrderReopenedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_created_producer: Vec<EventProducer<OrderCreatedEvent>>,
    pub cashback_credited_producer: Vec<EventProducer<CashbackCreditedEvent>>,
    pub order_reopened_producer: Vec<EventProducer<OrderReopenedEvent>>,
}

pub struct EventHandlers {
    pub on_order_created: Option<EventHandler<OrderCreatedEvent>>,
    pub on_cashback_credited: Option<EventHandler<CashbackCreditedEvent>>,
    pub on_order_reopened: Option<EventHandler<OrderReopenedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_created = hooks.on_order_created.map(|f| EventHandler::new(buffer_size, f));
        let on_cashback_credited = hooks.on_cashback_credited.map(|f| EventHandler::new(buffer_size, f));
        let on_order_reopened = hooks.on_order_reopened.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_created, on_cashback_credited, on_order_reopened }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_created {
            result.order_created_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_cashback_credited {
            result.cashback_credited_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_reopened {
            result.order_reopened_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_created {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_cashback_credited {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_order_reopened {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_created: Option<Handler<OrderCreatedEvent>>,
    pub on_cashback_credited: Option<Handler<CashbackCreditedEvent>>,
    pub on_order_reopened: Option<Handler<OrderReopenedEvent>>,
}

impl EventHooks {
    pub fn on_order_created<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderCreatedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_created = Some(Arc::new(f));
        self
    }

    pub fn on_cashback_credited<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(CashbackCreditedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_cashback_credited = Some(Arc::new(f));
        self
    }

    pub fn on_order_reopened<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderReopenedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_reopened = Some(Arc::new(f));
        self
    }
}
