//! Ledger task
//!
//! Consumes a lossless hub subscription and settles every transaction
//! against the account registry, batch by batch in tick order.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::accounts::AccountRegistry;
use crate::broadcast::Subscription;

pub struct Ledger {
    registry: Arc<AccountRegistry>,
    subscription: Subscription,
}

impl Ledger {
    pub fn new(registry: Arc<AccountRegistry>, subscription: Subscription) -> Self {
        Self {
            registry,
            subscription,
        }
    }

    /// Applies batches until the subscription is closed
    pub async fn run(mut self) {
        log::info!("ledger started on subscriber {}", self.subscription.id());
        while let Some(batch) = self.subscription.recv().await {
            for transaction in &batch.transactions {
                self.registry.apply(transaction);
            }
            if !batch.is_empty() {
                log::debug!(
                    "tick {}: ledger settled {} transactions",
                    batch.tick,
                    batch.len()
                );
            }
        }
        log::info!("ledger stopped");
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
