use crate::engine::data::OrderBook;
use crate::engine::entry::{Order, Side, Transaction, TransactionBatch};

/// Outcome of one clearing cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub tick: u64,
    /// Matches in emission order, all priced at `clearing_price`
    pub transactions: Vec<Transaction>,
    /// Orders purged because their expiration tick was reached
    pub expired: usize,
    /// None when the cycle produced no transactions
    pub clearing_price: Option<u64>,
    pub bids_remaining: usize,
    pub asks_remaining: usize,
}

impl CycleReport {
    pub fn into_batch(self) -> TransactionBatch {
        TransactionBatch::new(self.tick, self.transactions)
    }
}

/// Top-of-book view used by the crossing loop
struct Top {
    price: u64,
    quantity: u64,
    expired: bool,
}

/// Owns the book and clears it once per tick.
///
/// Orders are only queued on submission; crossing happens exclusively in
/// [`Matcher::run_cycle`], which settles every match of the cycle at one
/// clearing price.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    orderbook: OrderBook,
}

impl Matcher {
    pub fn new() -> Self {
        Self {
            orderbook: OrderBook::new(),
        }
    }

    pub fn place_order(&mut self, order: Order) {
        self.orderbook.add_order(order);
    }

    pub fn orderbook(&self) -> &OrderBook {
        &self.orderbook
    }

    /// Runs one clearing cycle at `tick`.
    ///
    /// Crosses the best bid against the best ask until they no longer
    /// overlap, dropping expired orders found at the top of either side,
    /// then sweeps the remaining expired orders. Partial progress is never
    /// rolled back.
    pub fn run_cycle(&mut self, tick: u64) -> CycleReport {
        let mut transactions = Vec::new();
        let mut price_sum: u128 = 0;
        let mut expired = 0;

        loop {
            let (bid, ask) = match (self.top(Side::Bid, tick), self.top(Side::Ask, tick)) {
                (Some(bid), Some(ask)) => (bid, ask),
                _ => break,
            };
            if bid.expired {
                self.orderbook.pop_best(Side::Bid);
                expired += 1;
                continue;
            }
            if ask.expired {
                self.orderbook.pop_best(Side::Ask);
                expired += 1;
                continue;
            }
            if bid.price < ask.price {
                break;
            }

            let quantity = bid.quantity.min(ask.quantity);
            let (buy_order_id, buyer_account_id) = match self.fill_best(Side::Bid, quantity) {
                Some(ids) => ids,
                None => break,
            };
            let (sell_order_id, seller_account_id) = match self.fill_best(Side::Ask, quantity) {
                Some(ids) => ids,
                None => break,
            };
            price_sum += u128::from(bid.price) + u128::from(ask.price);
            transactions.push(Transaction {
                buy_order_id,
                sell_order_id,
                buyer_account_id,
                seller_account_id,
                quantity,
                price: 0,
                tick,
            });
        }

        let swept = self.orderbook.remove_expired(tick);
        for order in &swept {
            log::debug!("tick {}: order {} expired", tick, order.id);
        }
        expired += swept.len();

        let clearing_price = clearing_price(price_sum, transactions.len());
        if let Some(price) = clearing_price {
            for transaction in transactions.iter_mut() {
                transaction.price = price;
            }
        }

        CycleReport {
            tick,
            transactions,
            expired,
            clearing_price,
            bids_remaining: self.orderbook.len(Side::Bid),
            asks_remaining: self.orderbook.len(Side::Ask),
        }
    }

    fn top(&self, side: Side, tick: u64) -> Option<Top> {
        self.orderbook.best(side).map(|order| Top {
            price: order.price,
            quantity: order.quantity,
            expired: order.is_expired(tick),
        })
    }

    /// Fills the best order on `side`, removing it once exhausted.
    /// Returns its order and account ids.
    fn fill_best(&mut self, side: Side, quantity: u64) -> Option<(String, String)> {
        let order = self.orderbook.best_mut(side)?;
        order.fill(quantity);
        let ids = (order.id.clone(), order.account_id.clone());
        if order.is_filled() {
            self.orderbook.pop_best(side);
        }
        Some(ids)
    }
}

/// Mean of the bid and ask prices over every match, rounded down.
///
/// `price_sum` holds `bid_price + ask_price` summed over `matches` matches.
pub fn clearing_price(price_sum: u128, matches: usize) -> Option<u64> {
    if matches == 0 {
        return None;
    }
    let price = price_sum / (2 * matches as u128);
    u64::try_from(price).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::entry::NewOrder;

    struct Book {
        matcher: Matcher,
        sequence: u64,
    }

    impl Book {
        fn new() -> Self {
            Self {
                matcher: Matcher::new(),
                sequence: 0,
            }
        }

        fn put(&mut self, side: Side, price: u64, quantity: u64, expiration_tick: u64) -> String {
            self.sequence += 1;
            let id = format!("{:?}-{}", side, self.sequence).to_lowercase();
            self.matcher.place_order(Order::new(
                id.clone(),
                self.sequence,
                NewOrder {
                    account_id: format!("acct-{}", id),
                    side,
                    price,
                    quantity,
                    expiration_tick,
                },
            ));
            id
        }
    }

    #[test]
    fn full_cross_settles_at_midpoint() {
        let mut book = Book::new();
        let bid = book.put(Side::Bid, 100, 10, 0);
        let ask = book.put(Side::Ask, 90, 10, 0);

        let report = book.matcher.run_cycle(0);

        assert_eq!(report.transactions.len(), 1);
        let tx = &report.transactions[0];
        assert_eq!(tx.buy_order_id, bid);
        assert_eq!(tx.sell_order_id, ask);
        assert_eq!(tx.buyer_account_id, format!("acct-{}", bid));
        assert_eq!(tx.seller_account_id, format!("acct-{}", ask));
        assert_eq!(tx.quantity, 10);
        assert_eq!(tx.price, 95);
        assert_eq!(tx.tick, 0);
        assert_eq!(report.clearing_price, Some(95));
        assert!(book.matcher.orderbook().is_empty());
    }

    #[test]
    fn partial_fill_leaves_remainder_resting() {
        let mut book = Book::new();
        book.put(Side::Bid, 100, 5, 0);
        let ask = book.put(Side::Ask, 100, 10, 0);

        let report = book.matcher.run_cycle(0);

        assert_eq!(report.transactions.len(), 1);
        assert_eq!(report.transactions[0].quantity, 5);
        assert_eq!(report.transactions[0].price, 100);
        let resting = book.matcher.orderbook().best(Side::Ask).unwrap();
        assert_eq!(resting.id, ask);
        assert_eq!(resting.quantity, 5);
        assert!(book.matcher.orderbook().best(Side::Bid).is_none());
    }

    #[test]
    fn expired_order_is_purged_without_counterparty() {
        let mut book = Book::new();
        book.put(Side::Bid, 100, 10, 1);

        let first = book.matcher.run_cycle(0);
        assert_eq!(first.expired, 0);
        assert_eq!(first.bids_remaining, 1);

        let second = book.matcher.run_cycle(1);
        assert!(second.transactions.is_empty());
        assert_eq!(second.clearing_price, None);
        assert_eq!(second.expired, 1);
        assert!(book.matcher.orderbook().is_empty());
    }

    #[test]
    fn expired_top_of_book_never_matches() {
        let mut book = Book::new();
        book.put(Side::Bid, 120, 10, 3);
        let live = book.put(Side::Bid, 100, 10, 0);
        book.put(Side::Ask, 90, 10, 0);

        let report = book.matcher.run_cycle(3);

        assert_eq!(report.transactions.len(), 1);
        assert_eq!(report.transactions[0].buy_order_id, live);
        assert_eq!(report.expired, 1);
        assert_eq!(report.transactions[0].price, 95);
    }

    #[test]
    fn all_matches_in_a_cycle_share_one_price() {
        let mut book = Book::new();
        book.put(Side::Bid, 110, 5, 0);
        book.put(Side::Bid, 104, 5, 0);
        book.put(Side::Ask, 100, 5, 0);
        book.put(Side::Ask, 101, 5, 0);

        let report = book.matcher.run_cycle(7);

        // (110 + 100 + 104 + 101) / 4 = 103.75
        assert_eq!(report.clearing_price, Some(103));
        assert_eq!(report.transactions.len(), 2);
        assert!(report.transactions.iter().all(|t| t.price == 103 && t.tick == 7));
    }

    #[test]
    fn equal_prices_fill_in_arrival_order() {
        let mut book = Book::new();
        let first = book.put(Side::Ask, 100, 3, 0);
        let second = book.put(Side::Ask, 100, 3, 0);
        book.put(Side::Bid, 100, 4, 0);

        let report = book.matcher.run_cycle(0);

        let sellers: Vec<&str> = report
            .transactions
            .iter()
            .map(|t| t.sell_order_id.as_str())
            .collect();
        assert_eq!(sellers, vec![first.as_str(), second.as_str()]);
        assert_eq!(report.transactions[1].quantity, 1);
        assert_eq!(book.matcher.orderbook().best(Side::Ask).unwrap().quantity, 2);
    }

    #[test]
    fn stops_when_book_no_longer_crosses() {
        let mut book = Book::new();
        book.put(Side::Bid, 100, 10, 0);
        book.put(Side::Bid, 95, 10, 0);
        book.put(Side::Ask, 98, 4, 0);
        book.put(Side::Ask, 99, 10, 0);

        let report = book.matcher.run_cycle(0);

        let filled: u64 = report.transactions.iter().map(|t| t.quantity).sum();
        assert_eq!(filled, 10);
        let orderbook = book.matcher.orderbook();
        assert!(orderbook.get_best_bid() < orderbook.get_best_ask());
        assert_eq!(orderbook.best(Side::Ask).unwrap().quantity, 4);
    }

    #[test]
    fn empty_cycle_has_no_price() {
        let mut book = Book::new();
        book.put(Side::Bid, 90, 10, 0);
        book.put(Side::Ask, 100, 10, 0);

        let report = book.matcher.run_cycle(0);

        assert!(report.transactions.is_empty());
        assert_eq!(report.clearing_price, None);
        assert_eq!((report.bids_remaining, report.asks_remaining), (1, 1));
    }

    #[test]
    fn clearing_price_rounds_down() {
        assert_eq!(clearing_price(0, 0), None);
        assert_eq!(clearing_price(191, 1), Some(95));
        assert_eq!(clearing_price(u128::from(u64::MAX) * 2, 1), Some(u64::MAX));
    }

    #[test]
    fn quantity_is_conserved_across_random_books() {
        // deterministic pseudo-random books
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            seed
        };
        for _ in 0..200 {
            let mut book = Book::new();
            let mut available = [0u64; 2];
            for _ in 0..(next() % 12) {
                let side = if next() % 2 == 0 { Side::Bid } else { Side::Ask };
                let quantity = 1 + next() % 20;
                available[(side == Side::Ask) as usize] += quantity;
                book.put(side, 90 + next() % 20, quantity, 0);
            }

            let report = book.matcher.run_cycle(0);

            let filled: u64 = report.transactions.iter().map(|t| t.quantity).sum();
            assert!(filled <= available[0] && filled <= available[1]);
            assert!(report.transactions.iter().all(|t| t.quantity > 0));
            let orderbook = book.matcher.orderbook();
            if let (Some(bid), Some(ask)) = (orderbook.get_best_bid(), orderbook.get_best_ask()) {
                assert!(bid < ask);
            }
            if let Some(price) = report.clearing_price {
                assert!(report.transactions.iter().all(|t| t.price == price));
            }
        }
    }
}
