//! Market service implementation
//!
//! This module implements the gRPC service for order submission and the
//! transaction stream.

use std::sync::Arc;

use pb::market_service_server::MarketService;
use pb::{RegisterOrderReply, RegisterOrderRequest, SubscribeTransactionsRequest};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::engine::entry::{NewOrder, Side, Transaction};
use crate::error::MarketError;
use crate::market_api::Market;
use crate::metrics;

/// Protocol buffer definitions for the market service
pub mod pb {
    pub use proto::market_service_server;
    pub use proto::{
        Order, RegisterOrderReply, RegisterOrderRequest, Side, SubscribeTransactionsRequest,
        Transaction,
    };
}

/// Converts a wire order into an engine order, refusing unknown sides
pub fn new_order_from_pb(order: pb::Order) -> Result<NewOrder, MarketError> {
    let side = match pb::Side::from_i32(order.side) {
        Some(pb::Side::Bid) => Side::Bid,
        Some(pb::Side::Ask) => Side::Ask,
        Some(pb::Side::Unspecified) | None => return Err(MarketError::UnknownSide(order.side)),
    };
    Ok(NewOrder {
        account_id: order.account_id,
        side,
        price: order.price,
        quantity: order.quantity,
        expiration_tick: order.expiration,
    })
}

impl From<Transaction> for pb::Transaction {
    fn from(t: Transaction) -> Self {
        pb::Transaction {
            buy_order_id: t.buy_order_id,
            sell_order_id: t.sell_order_id,
            buyer_account_id: t.buyer_account_id,
            seller_account_id: t.seller_account_id,
            quantity: t.quantity,
            price: t.price,
            tick: t.tick,
        }
    }
}

/// Market service implementation
pub struct MarketServiceSVC {
    market: Arc<Market>,
    /// Transactions buffered per open stream
    stream_buffer: usize,
}

impl MarketServiceSVC {
    pub fn new(market: Arc<Market>, stream_buffer: usize) -> Self {
        Self {
            market,
            stream_buffer: stream_buffer.max(1),
        }
    }
}

#[tonic::async_trait]
impl MarketService for MarketServiceSVC {
    /// Places a new order
    ///
    /// The order is validated and queued; it takes part in matching from the
    /// next clearing cycle.
    ///
    /// # Returns
    ///
    /// Returns the assigned order id, or `INVALID_ARGUMENT` for a malformed order
    async fn register_order(
        &self,
        request: tonic::Request<RegisterOrderRequest>,
    ) -> Result<tonic::Response<RegisterOrderReply>, tonic::Status> {
        metrics::record_metrics("register_order", move || async move {
            log::debug!("register order {:?}", request.get_ref());
            let result = request
                .into_inner()
                .order
                .ok_or(MarketError::MissingOrder)
                .and_then(new_order_from_pb)
                .and_then(|order| self.market.register_order(order));
            match result {
                Ok(order_id) => Ok(tonic::Response::new(RegisterOrderReply { order_id })),
                Err(e) => {
                    log::warn!("rejected order: {}", e);
                    metrics::REJECTED_ORDER_COUNTER.inc();
                    Err(e.into())
                }
            }
        })
        .await
    }

    type SubscribeTransactionsStream = ReceiverStream<Result<pb::Transaction, tonic::Status>>;

    /// Streams every transaction from the next cycle on
    ///
    /// The stream ends when the client disconnects, when the subscriber falls
    /// too far behind, or on server shutdown.
    async fn subscribe_transactions(
        &self,
        _request: tonic::Request<SubscribeTransactionsRequest>,
    ) -> Result<tonic::Response<Self::SubscribeTransactionsStream>, tonic::Status> {
        metrics::REQ_COUNTER_VEC
            .with_label_values(&["subscribe_transactions"])
            .inc();
        let mut stream = self.market.open_transaction_stream();
        let subscriber = stream.subscriber_id();
        let (tx, rx) = mpsc::channel(self.stream_buffer);
        log::info!("transaction stream opened for subscriber {}", subscriber);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    next = stream.next() => match next {
                        Some(transaction) => {
                            if tx.send(Ok(transaction.into())).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                    _ = tx.closed() => break,
                }
            }
            log::info!("transaction stream closed for subscriber {}", subscriber);
        });

        Ok(tonic::Response::new(ReceiverStream::new(rx)))
    }
}
