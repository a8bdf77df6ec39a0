//! Broadcast hub
//!
//! Every cycle's batch (empty ones included) is offered exactly once to each
//! subscriber registered when the delivery pass starts. Stream subscribers own
//! a bounded channel; one that cannot take a batch within the delivery timeout
//! is disconnected so it never holds up the others or the next cycle. Lossless
//! subscribers own an unbounded channel and are never waited on.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinSet;

use crate::engine::entry::TransactionBatch;

pub type SharedBatch = Arc<TransactionBatch>;

/// What the hub does when a subscriber's channel is full
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryPolicy {
    /// Wait up to the hub's delivery timeout, then disconnect
    Bounded,
    /// Queue without limit. Reserved for in-process consumers that must see
    /// every batch, such as the ledger.
    Lossless,
}

#[derive(Debug, Clone)]
enum Subscriber {
    Bounded(mpsc::Sender<SharedBatch>),
    Lossless(mpsc::UnboundedSender<SharedBatch>),
}

#[derive(Debug)]
enum Inbox {
    Bounded(mpsc::Receiver<SharedBatch>),
    Lossless(mpsc::UnboundedReceiver<SharedBatch>),
}

#[derive(Debug, Default)]
struct Registry {
    subscribers: Mutex<HashMap<u64, Subscriber>>,
    next_id: AtomicU64,
}

impl Registry {
    fn lock(&self) -> MutexGuard<'_, HashMap<u64, Subscriber>> {
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn remove(&self, id: u64) -> bool {
        self.lock().remove(&id).is_some()
    }
}

/// Result of one delivery pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Subscribers in the snapshot taken for this pass
    pub listeners: usize,
    pub delivered: usize,
    /// Subscribers removed because they were closed or too slow
    pub disconnected: Vec<u64>,
}

/// Registry of subscriber channels with a per-cycle delivery pass
#[derive(Debug, Clone)]
pub struct BroadcastHub {
    registry: Arc<Registry>,
    capacity: usize,
    delivery_timeout: Duration,
}

impl BroadcastHub {
    /// # Arguments
    /// * `capacity` - Batches buffered per subscriber
    /// * `delivery_timeout` - How long a full bounded subscriber may stall delivery
    pub fn new(capacity: usize, delivery_timeout: Duration) -> Self {
        Self {
            registry: Arc::new(Registry::default()),
            capacity: capacity.max(1),
            delivery_timeout,
        }
    }

    /// Registers a subscriber that is disconnected when it falls behind
    pub fn subscribe(&self) -> Subscription {
        self.register(DeliveryPolicy::Bounded)
    }

    /// Registers a subscriber that is never skipped
    pub fn subscribe_lossless(&self) -> Subscription {
        self.register(DeliveryPolicy::Lossless)
    }

    fn register(&self, policy: DeliveryPolicy) -> Subscription {
        let (subscriber, inbox) = match policy {
            DeliveryPolicy::Bounded => {
                let (sender, receiver) = mpsc::channel(self.capacity);
                (Subscriber::Bounded(sender), Inbox::Bounded(receiver))
            }
            DeliveryPolicy::Lossless => {
                let (sender, receiver) = mpsc::unbounded_channel();
                (Subscriber::Lossless(sender), Inbox::Lossless(receiver))
            }
        };
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry.lock().insert(id, subscriber);
        log::debug!("subscriber {} registered ({:?})", id, policy);
        Subscription {
            id,
            inbox,
            registry: Arc::downgrade(&self.registry),
        }
    }

    pub fn unsubscribe(&self, id: u64) -> bool {
        self.registry.remove(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().len()
    }

    /// Drops every subscriber. Their receivers drain what is buffered and
    /// then end.
    pub fn close_all(&self) -> usize {
        let mut subscribers = self.registry.lock();
        let closed = subscribers.len();
        subscribers.clear();
        closed
    }

    /// Offers `batch` to every currently registered subscriber.
    ///
    /// Full bounded subscribers are waited on concurrently, each for at most
    /// the delivery timeout. Lossless subscribers are queued without waiting.
    pub async fn deliver(&self, batch: TransactionBatch) -> DeliveryReport {
        let batch = Arc::new(batch);
        let targets: Vec<(u64, Subscriber)> = self
            .registry
            .lock()
            .iter()
            .map(|(id, subscriber)| (*id, subscriber.clone()))
            .collect();

        let mut report = DeliveryReport {
            listeners: targets.len(),
            ..Default::default()
        };
        let mut pending = JoinSet::new();
        for (id, subscriber) in targets {
            let sender = match subscriber {
                Subscriber::Lossless(sender) => {
                    match sender.send(batch.clone()) {
                        Ok(()) => report.delivered += 1,
                        Err(_) => report.disconnected.push(id),
                    }
                    continue;
                }
                Subscriber::Bounded(sender) => sender,
            };
            match sender.try_send(batch.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Closed(_)) => report.disconnected.push(id),
                Err(TrySendError::Full(batch)) => {
                    let timeout = self.delivery_timeout;
                    pending.spawn(async move {
                        let sent = sender.send_timeout(batch, timeout).await.is_ok();
                        (id, sent)
                    });
                }
            }
        }
        while let Some(joined) = pending.join_next().await {
            match joined {
                Ok((_, true)) => report.delivered += 1,
                Ok((id, false)) => report.disconnected.push(id),
                Err(e) => log::error!("delivery task failed: {}", e),
            }
        }

        for id in &report.disconnected {
            if self.registry.remove(*id) {
                log::warn!(
                    "tick {}: subscriber {} disconnected (closed or too slow)",
                    batch.tick,
                    id
                );
            }
        }
        report
    }
}

/// Receiving end of a subscription.
///
/// Dropping it unregisters the subscriber.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    inbox: Inbox,
    registry: Weak<Registry>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Next batch, or None once the hub has disconnected this subscriber
    /// and the buffer is drained
    pub async fn recv(&mut self) -> Option<SharedBatch> {
        match &mut self.inbox {
            Inbox::Bounded(receiver) => receiver.recv().await,
            Inbox::Lossless(receiver) => receiver.recv().await,
        }
    }

    pub fn try_recv(&mut self) -> Option<SharedBatch> {
        match &mut self.inbox {
            Inbox::Bounded(receiver) => receiver.try_recv().ok(),
            Inbox::Lossless(receiver) => receiver.try_recv().ok(),
        }
    }

    /// Stops accepting batches; already buffered ones stay readable
    pub fn close(&mut self) {
        match &mut self.inbox {
            Inbox::Bounded(receiver) => receiver.close(),
            Inbox::Lossless(receiver) => receiver.close(),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            if registry.remove(self.id) {
                log::debug!("subscriber {} unregistered", self.id);
            }
        }
    }
}
