//! Data structures held by the engine
//!
//! - `orderbook`: the bid and ask sides for the single traded instrument

pub mod orderbook;
pub use orderbook::OrderBook;
