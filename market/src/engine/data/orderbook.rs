use crate::engine::entry::{Order, Side};
use std::collections::{BTreeMap, VecDeque};

/// Open orders for one instrument.
///
/// Each side maps a price level to its orders in arrival order, so iterating
/// a side from its best level yields strict price-then-sequence priority.
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    pub bids: BTreeMap<u64, VecDeque<Order>>, // price -> orders
    pub asks: BTreeMap<u64, VecDeque<Order>>, // price -> orders
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_order(&mut self, order: Order) {
        self.side_mut(order.side)
            .entry(order.price)
            .or_default()
            .push_back(order);
    }

    /// Highest-priority order on `side`
    pub fn best(&self, side: Side) -> Option<&Order> {
        match side {
            Side::Bid => self.bids.values().next_back()?.front(),
            Side::Ask => self.asks.values().next()?.front(),
        }
    }

    pub fn best_mut(&mut self, side: Side) -> Option<&mut Order> {
        match side {
            Side::Bid => self.bids.values_mut().next_back()?.front_mut(),
            Side::Ask => self.asks.values_mut().next()?.front_mut(),
        }
    }

    /// Removes and returns the highest-priority order on `side`
    pub fn pop_best(&mut self, side: Side) -> Option<Order> {
        let price = self.best(side)?.price;
        let orders = self.side_mut(side).get_mut(&price)?;
        let order = orders.pop_front()?;
        if orders.is_empty() {
            self.side_mut(side).remove(&price);
        }
        Some(order)
    }

    /// Removes every order void at `tick`, returning them in priority order
    pub fn remove_expired(&mut self, tick: u64) -> Vec<Order> {
        let mut expired = Vec::new();
        for side in [Side::Bid, Side::Ask] {
            let levels = self.side_mut(side);
            let prices: Vec<u64> = match side {
                Side::Bid => levels.keys().rev().copied().collect(),
                Side::Ask => levels.keys().copied().collect(),
            };
            for price in prices {
                if let Some(orders) = levels.get_mut(&price) {
                    let (stale, live): (VecDeque<Order>, VecDeque<Order>) =
                        orders.drain(..).partition(|o| o.is_expired(tick));
                    *orders = live;
                    if orders.is_empty() {
                        levels.remove(&price);
                    }
                    expired.extend(stale);
                }
            }
        }
        expired
    }

    /// Orders on `side` in priority order
    pub fn orders(&self, side: Side) -> Vec<&Order> {
        match side {
            Side::Bid => self.bids.values().rev().flatten().collect(),
            Side::Ask => self.asks.values().flatten().collect(),
        }
    }

    pub fn len(&self, side: Side) -> usize {
        self.side(side).values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    pub fn get_best_bid(&self) -> Option<u64> {
        self.bids.keys().next_back().copied()
    }

    pub fn get_best_ask(&self) -> Option<u64> {
        self.asks.keys().next().copied()
    }

    fn side(&self, side: Side) -> &BTreeMap<u64, VecDeque<Order>> {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut BTreeMap<u64, VecDeque<Order>> {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::entry::NewOrder;

    fn order(id: &str, sequence: u64, side: Side, price: u64, expiration_tick: u64) -> Order {
        Order::new(
            id.to_string(),
            sequence,
            NewOrder {
                account_id: format!("acct-{}", id),
                side,
                price,
                quantity: 10,
                expiration_tick,
            },
        )
    }

    #[test]
    fn bids_prefer_higher_price_then_arrival() {
        let mut book = OrderBook::new();
        book.add_order(order("b1", 1, Side::Bid, 100, 0));
        book.add_order(order("b2", 2, Side::Bid, 105, 0));
        book.add_order(order("b3", 3, Side::Bid, 105, 0));
        let ids: Vec<&str> = book.orders(Side::Bid).iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["b2", "b3", "b1"]);
        assert_eq!(book.get_best_bid(), Some(105));
    }

    #[test]
    fn asks_prefer_lower_price_then_arrival() {
        let mut book = OrderBook::new();
        book.add_order(order("a1", 1, Side::Ask, 90, 0));
        book.add_order(order("a2", 2, Side::Ask, 80, 0));
        book.add_order(order("a3", 3, Side::Ask, 90, 0));
        let ids: Vec<&str> = book.orders(Side::Ask).iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["a2", "a1", "a3"]);
        assert_eq!(book.best(Side::Ask).map(|o| o.id.as_str()), Some("a2"));
    }

    #[test]
    fn pop_best_drops_empty_levels() {
        let mut book = OrderBook::new();
        book.add_order(order("a1", 1, Side::Ask, 90, 0));
        book.add_order(order("a2", 2, Side::Ask, 95, 0));
        let popped = book.pop_best(Side::Ask).unwrap();
        assert_eq!(popped.id, "a1");
        assert!(book.orders(Side::Ask).iter().all(|o| o.id != "a1"));
        assert_eq!(book.get_best_ask(), Some(95));
        assert_eq!(book.len(Side::Ask), 1);
    }

    #[test]
    fn remove_expired_sweeps_both_sides() {
        let mut book = OrderBook::new();
        book.add_order(order("b1", 1, Side::Bid, 100, 2));
        book.add_order(order("b2", 2, Side::Bid, 100, 0));
        book.add_order(order("a1", 3, Side::Ask, 120, 1));
        let expired = book.remove_expired(2);
        let ids: Vec<&str> = expired.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["b1", "a1"]);
        assert_eq!(book.len(Side::Bid), 1);
        assert!(book.asks.is_empty());
        assert_eq!(book.best(Side::Bid).map(|o| o.id.as_str()), Some("b2"));
    }
}
