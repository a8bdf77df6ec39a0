//! Match Engine Module
//!
//! This module contains the core components of the matching engine system:
//! - `data`: the two-sided order book
//! - `entry`: order and transaction definitions
//! - `matchengine`: shared engine state guarded for concurrent submitters
//! - `matchlogic`: the clearing cycle

pub mod data;
pub mod entry;
pub mod matchengine;
pub mod matchlogic;
