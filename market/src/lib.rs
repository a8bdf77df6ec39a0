//! Single-instrument exchange
//!
//! Orders are queued into a two-sided book and cleared once per tick at a
//! single price; each tick's transactions are fanned out to every subscriber
//! and to the account ledger.

pub mod account_service;
pub mod accounts;
pub mod broadcast;
pub mod config;
pub mod engine;
pub mod error;
pub mod market_api;
pub mod market_service;
pub mod metrics;
pub mod server;
