use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use crate::engine::entry::Transaction;

/// Cash balance and instrument holdings of one participant.
///
/// Both are signed so that a participant trading beyond its means shows a
/// negative figure.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Account {
    pub id: String,
    pub balance: i64,
    pub holdings: i64,
}

/// In-memory account store keyed by account id
#[derive(Debug, Default)]
pub struct AccountRegistry {
    accounts: RwLock<HashMap<String, Account>>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new account and returns its generated id
    pub fn register(&self, balance: i64, holdings: i64) -> String {
        let id = Uuid::new_v4().to_string();
        let account = Account {
            id: id.clone(),
            balance,
            holdings,
        };
        self.write().insert(id.clone(), account);
        log::debug!("registered account {}", id);
        id
    }

    pub fn get(&self, account_id: &str) -> Option<Account> {
        self.read().get(account_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Settles a transaction: the buyer pays price×quantity and receives the
    /// quantity, the seller the reverse. A side naming an unknown account is
    /// skipped.
    pub fn apply(&self, transaction: &Transaction) {
        let amount = notional(transaction);
        let quantity = i64::try_from(transaction.quantity).unwrap_or(i64::MAX);
        let mut accounts = self.write();

        match accounts.get_mut(&transaction.buyer_account_id) {
            Some(buyer) => {
                buyer.balance = buyer.balance.saturating_sub(amount);
                buyer.holdings = buyer.holdings.saturating_add(quantity);
            }
            None => log::warn!(
                "tick {}: unknown buyer account {}",
                transaction.tick,
                transaction.buyer_account_id
            ),
        }
        match accounts.get_mut(&transaction.seller_account_id) {
            Some(seller) => {
                seller.balance = seller.balance.saturating_add(amount);
                seller.holdings = seller.holdings.saturating_sub(quantity);
            }
            None => log::warn!(
                "tick {}: unknown seller account {}",
                transaction.tick,
                transaction.seller_account_id
            ),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Account>> {
        self.accounts.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Account>> {
        self.accounts.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn notional(transaction: &Transaction) -> i64 {
    i64::try_from(transaction.total_amount()).unwrap_or(i64::MAX)
}
