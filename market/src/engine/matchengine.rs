//! Match Engine Module
//!
//! This module owns the book, the tick counter and the arrival sequence behind
//! a single lock. Submitters and the cycle driver both go through it, so book
//! access is always serialized.

use std::sync::{Mutex, MutexGuard};

use uuid::Uuid;

pub use super::data::OrderBook;
pub use super::entry::{NewOrder, Order, Side};
pub use super::matchlogic::{CycleReport, Matcher};

#[derive(Debug, Default)]
struct EngineState {
    matcher: Matcher,
    /// Current cycle, also the expiration clock
    tick: u64,
    /// Next arrival sequence number
    sequence: u64,
}

/// The main match engine implementation
#[derive(Debug, Default)]
pub struct MatchEngine {
    state: Mutex<EngineState>,
}

impl MatchEngine {
    pub fn new() -> MatchEngine {
        MatchEngine::default()
    }

    /// Accepts an order into the book
    ///
    /// # Returns
    /// The identifier assigned to the order
    pub fn submit_order(&self, new_order: NewOrder) -> String {
        let id = Uuid::new_v4().to_string();
        let mut state = self.lock();
        state.sequence += 1;
        let order = Order::new(id.clone(), state.sequence, new_order);
        log::debug!(
            "accepted order {} {:?} {}@{} exp {}",
            order.id,
            order.side,
            order.quantity,
            order.price,
            order.expiration_tick
        );
        state.matcher.place_order(order);
        id
    }

    /// Runs the clearing cycle for the current tick.
    ///
    /// The tick is not advanced; the cycle driver calls [`advance_tick`]
    /// once the batch has been handed off.
    ///
    /// [`advance_tick`]: MatchEngine::advance_tick
    pub fn run_cycle(&self) -> CycleReport {
        let mut state = self.lock();
        let tick = state.tick;
        log::info!(
            "tick {}: {} bids, {} asks",
            tick,
            state.matcher.orderbook().len(Side::Bid),
            state.matcher.orderbook().len(Side::Ask)
        );
        state.matcher.run_cycle(tick)
    }

    /// Moves to the next cycle, returning the new tick
    pub fn advance_tick(&self) -> u64 {
        let mut state = self.lock();
        state.tick += 1;
        state.tick
    }

    pub fn current_tick(&self) -> u64 {
        self.lock().tick
    }

    /// Runs `f` against a consistent view of the book
    pub fn inspect<R>(&self, f: impl FnOnce(&OrderBook) -> R) -> R {
        f(self.lock().matcher.orderbook())
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_order(side: Side, price: u64, quantity: u64) -> NewOrder {
        NewOrder {
            account_id: "acct".to_string(),
            side,
            price,
            quantity,
            expiration_tick: 0,
        }
    }

    #[test]
    fn assigns_unique_ids_and_increasing_sequence() {
        let engine = MatchEngine::new();
        let first = engine.submit_order(new_order(Side::Bid, 100, 1));
        let second = engine.submit_order(new_order(Side::Bid, 100, 1));
        assert_ne!(first, second);
        engine.inspect(|book| {
            let bids = book.orders(Side::Bid);
            assert_eq!(bids[0].id, first);
            assert!(bids[0].sequence < bids[1].sequence);
        });
    }

    #[test]
    fn cycle_uses_current_tick_until_advanced() {
        let engine = MatchEngine::new();
        engine.submit_order(new_order(Side::Bid, 100, 2));
        engine.submit_order(new_order(Side::Ask, 100, 1));
        assert_eq!(engine.run_cycle().transactions[0].tick, 0);
        assert_eq!(engine.advance_tick(), 1);
        engine.submit_order(new_order(Side::Ask, 100, 1));
        assert_eq!(engine.run_cycle().transactions[0].tick, 1);
        assert_eq!(engine.current_tick(), 1);
    }

    #[test]
    fn concurrent_submitters_are_all_recorded() {
        let engine = Arc::new(MatchEngine::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let engine = engine.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        let side = if i % 2 == 0 { Side::Bid } else { Side::Ask };
                        let price = if side == Side::Bid { 90 } else { 110 };
                        engine.submit_order(new_order(side, price, 1));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        engine.inspect(|book| {
            assert_eq!(book.len(Side::Bid), 200);
            assert_eq!(book.len(Side::Ask), 200);
        });
    }
}
