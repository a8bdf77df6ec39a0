//! Market API
//!
//! Entry point for order submission and transaction subscriptions, plus the
//! timer-driven task that runs one clearing cycle per tick and hands its
//! batch to the broadcast hub.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::broadcast::{BroadcastHub, DeliveryReport, Subscription};
use crate::engine::entry::{NewOrder, Side, Transaction};
use crate::engine::matchengine::MatchEngine;
use crate::error::MarketError;
use crate::metrics;

/// Summary of one completed cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    pub tick: u64,
    pub transactions: usize,
    pub expired: usize,
    pub clearing_price: Option<u64>,
    pub delivery: DeliveryReport,
}

pub struct Market {
    engine: MatchEngine,
    hub: BroadcastHub,
}

impl Market {
    pub fn new(hub: BroadcastHub) -> Self {
        Self {
            engine: MatchEngine::new(),
            hub,
        }
    }

    pub fn engine(&self) -> &MatchEngine {
        &self.engine
    }

    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    /// Validates and queues an order for the next cycle
    ///
    /// # Returns
    /// The engine-assigned order id, or why the order was refused
    pub fn register_order(&self, new_order: NewOrder) -> Result<String, MarketError> {
        if new_order.account_id.is_empty() {
            return Err(MarketError::MissingAccount);
        }
        if new_order.quantity == 0 {
            return Err(MarketError::ZeroQuantity);
        }
        let side = new_order.side;
        let id = self.engine.submit_order(new_order);
        let label = match side {
            Side::Bid => "bid",
            Side::Ask => "ask",
        };
        metrics::ORDER_COUNTER_VEC.with_label_values(&[label]).inc();
        Ok(id)
    }

    /// Opens a stream of every transaction emitted from the next delivered
    /// cycle onwards
    pub fn open_transaction_stream(&self) -> TransactionStream {
        TransactionStream::new(self.hub.subscribe())
    }

    /// Runs one clearing cycle, delivers its batch, then advances the tick
    pub async fn clear(&self) -> CycleSummary {
        let start = Instant::now();
        let report = self.engine.run_cycle();
        let tick = report.tick;
        let expired = report.expired;
        let clearing_price = report.clearing_price;
        let batch = report.into_batch();
        let transactions = batch.len();

        let delivery = self.hub.deliver(batch).await;
        log::info!(
            "tick {}: broadcasted {} transactions to {} listeners",
            tick,
            transactions,
            delivery.delivered
        );
        self.engine.advance_tick();

        metrics::TICK_GAUGE.set(i64::try_from(tick).unwrap_or(i64::MAX));
        metrics::TRANSACTION_COUNTER.inc_by(transactions as f64);
        metrics::EXPIRED_ORDER_COUNTER.inc_by(expired as f64);
        metrics::DISCONNECTED_SUBSCRIBER_COUNTER.inc_by(delivery.disconnected.len() as f64);
        metrics::SUBSCRIBER_GAUGE.set(self.hub.subscriber_count() as i64);
        metrics::CYCLE_HISTOGRAM.observe(start.elapsed().as_secs_f64());

        CycleSummary {
            tick,
            transactions,
            expired,
            clearing_price,
            delivery,
        }
    }

    /// Clears once per `tick_interval` until `shutdown` flips or its sender
    /// is dropped. The first cycle runs one interval after start.
    pub async fn run(self: Arc<Self>, tick_interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        log::info!("clearing every {:?}", tick_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.clear().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        log::info!("clearing stopped at tick {}", self.engine.current_tick());
    }
}

/// Transactions of successive cycles, flattened in tick then emission order
pub struct TransactionStream {
    subscription: Subscription,
    pending: VecDeque<Transaction>,
}

impl TransactionStream {
    fn new(subscription: Subscription) -> Self {
        Self {
            subscription,
            pending: VecDeque::new(),
        }
    }

    pub fn subscriber_id(&self) -> u64 {
        self.subscription.id()
    }

    /// Next transaction, or None once the subscription is closed
    pub async fn next(&mut self) -> Option<Transaction> {
        loop {
            if let Some(transaction) = self.pending.pop_front() {
                return Some(transaction);
            }
            let batch = self.subscription.recv().await?;
            self.pending.extend(batch.transactions.iter().cloned());
        }
    }
}
