//! Order Types and Structures
//!
//! This module defines the resting order held by the book and the request a
//! submitter hands to the engine before an identifier is assigned.

/// Side of the book an order rests on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Buy side, best price is the highest
    Bid,
    /// Sell side, best price is the lowest
    Ask,
}

/// An order as submitted, before the engine accepts it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub account_id: String,
    pub side: Side,
    pub price: u64,
    pub quantity: u64,
    /// 0 means the order never expires
    pub expiration_tick: u64,
}

/// A resting order in the book
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Engine-assigned identifier
    pub id: String,
    pub account_id: String,
    pub side: Side,
    /// Limit price: the most a bid pays, the least an ask accepts
    pub price: u64,
    /// Remaining quantity, decremented on partial fills
    pub quantity: u64,
    /// 0 means the order never expires
    pub expiration_tick: u64,
    /// Arrival sequence number, breaks ties between equal prices
    pub sequence: u64,
}

impl Order {
    pub fn new(id: String, sequence: u64, new_order: NewOrder) -> Self {
        Self {
            id,
            account_id: new_order.account_id,
            side: new_order.side,
            price: new_order.price,
            quantity: new_order.quantity,
            expiration_tick: new_order.expiration_tick,
            sequence,
        }
    }

    /// Whether the order is void at `tick`
    pub fn is_expired(&self, tick: u64) -> bool {
        self.expiration_tick > 0 && tick >= self.expiration_tick
    }

    pub fn is_filled(&self) -> bool {
        self.quantity == 0
    }

    /// Reduces the remaining quantity by a matched amount
    pub fn fill(&mut self, quantity: u64) {
        self.quantity = self.quantity.saturating_sub(quantity);
    }
}
