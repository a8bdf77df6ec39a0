//! Transaction Types and Structures
//!
//! A transaction is one match between a bid and an ask produced during a
//! clearing cycle. Every transaction of a cycle carries the cycle's single
//! clearing price.

/// Represents a matched trade between a buyer and a seller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Order id of the bid
    pub buy_order_id: String,
    /// Order id of the ask
    pub sell_order_id: String,
    pub buyer_account_id: String,
    pub seller_account_id: String,
    /// Matched quantity, always greater than zero
    pub quantity: u64,
    /// Clearing price of the cycle the trade executed in
    pub price: u64,
    /// Cycle in which the trade executed
    pub tick: u64,
}

impl Transaction {
    /// Calculates the total amount of the trade
    ///
    /// # Returns
    /// The product of price and quantity, widened so it cannot overflow
    pub fn total_amount(&self) -> u128 {
        u128::from(self.price) * u128::from(self.quantity)
    }
}

/// All transactions produced by one cycle, in emission order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransactionBatch {
    pub tick: u64,
    pub transactions: Vec<Transaction>,
}

impl TransactionBatch {
    pub fn new(tick: u64, transactions: Vec<Transaction>) -> Self {
        Self { tick, transactions }
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
