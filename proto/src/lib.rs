//! Wire types for the `rollcall` package
//!
//! Messages are declared directly as prost structs; the gRPC service stubs
//! (servers and clients) are generated by `build.rs`.

#![allow(clippy::derive_partial_eq_without_eq)]

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Account {
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
    #[prost(int64, tag = "2")]
    pub balance: i64,
    #[prost(int64, tag = "3")]
    pub holdings: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Order {
    /// Assigned by the server; ignored on submission
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub account_id: ::prost::alloc::string::String,
    #[prost(enumeration = "Side", tag = "3")]
    pub side: i32,
    #[prost(uint64, tag = "4")]
    pub price: u64,
    #[prost(uint64, tag = "5")]
    pub quantity: u64,
    /// Tick at which the order becomes void, 0 for never
    #[prost(uint64, tag = "6")]
    pub expiration: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Side {
    Unspecified = 0,
    Bid = 1,
    Ask = 2,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Transaction {
    #[prost(string, tag = "1")]
    pub buy_order_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub sell_order_id: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub buyer_account_id: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub seller_account_id: ::prost::alloc::string::String,
    #[prost(uint64, tag = "5")]
    pub quantity: u64,
    #[prost(uint64, tag = "6")]
    pub price: u64,
    #[prost(uint64, tag = "7")]
    pub tick: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RegisterAccountRequest {
    #[prost(message, optional, tag = "1")]
    pub account: ::core::option::Option<Account>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RegisterAccountReply {
    #[prost(string, tag = "1")]
    pub account_id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetAccountRequest {
    #[prost(string, tag = "1")]
    pub account_id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetAccountReply {
    #[prost(message, optional, tag = "1")]
    pub account: ::core::option::Option<Account>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RegisterOrderRequest {
    #[prost(message, optional, tag = "1")]
    pub order: ::core::option::Option<Order>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RegisterOrderReply {
    #[prost(string, tag = "1")]
    pub order_id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SubscribeTransactionsRequest {}

include!(concat!(env!("OUT_DIR"), "/rollcall.AccountService.rs"));
include!(concat!(env!("OUT_DIR"), "/rollcall.MarketService.rs"));
