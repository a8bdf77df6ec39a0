mod order;
mod transaction;

pub use order::{NewOrder, Order, Side};
pub use transaction::{Transaction, TransactionBatch};
