//! Matching logic
//!
//! - `matcher`: the periodic clearing cycle over the order book

pub mod matcher;
pub use matcher::{CycleReport, Matcher};
