use crate::{OrderId, OwnerId};
use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExchangeError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("market not found: {0}")]
    MarketNotFound(String),

    #[error("settlement failed: {0}")]
    Settlement(#[from] SettlementError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("exchange core is no longer running")]
    Disconnected,
}

/// Failures reported by a settlement collaborator. These never unwind book state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettlementError {
    #[error("unknown account for owner {0}")]
    UnknownAccount(OwnerId),

    #[error("insufficient funds for owner {owner}: required {required}, available {available}")]
    InsufficientFunds {
        owner: OwnerId,
        required: Decimal,
        available: Decimal,
    },

    #[error("transfer failed: {0}")]
    TransferFailed(String),
}

impl ExchangeError {
    pub(crate) fn invalid(reason: impl Into<String>) -> ExchangeError {
        ExchangeError::InvalidOrder(reason.into())
    }
}
