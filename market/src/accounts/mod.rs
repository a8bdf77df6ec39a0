//! Account collaborators of the market
//!
//! - `registry`: keyed account store
//! - `ledger`: applies delivered transactions to balances and holdings

pub mod ledger;
pub mod registry;

pub use ledger::Ledger;
pub use registry::{Account, AccountRegistry};
