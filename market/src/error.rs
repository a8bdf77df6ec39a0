use thiserror::Error;

/// Reasons an order is refused at the market boundary
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarketError {
    #[error("unknown order side {0}")]
    UnknownSide(i32),
    #[error("order quantity must be greater than zero")]
    ZeroQuantity,
    #[error("order has no account id")]
    MissingAccount,
    #[error("request carries no order")]
    MissingOrder,
}

impl From<MarketError> for tonic::Status {
    fn from(err: MarketError) -> Self {
        tonic::Status::invalid_argument(err.to_string())
    }
}
