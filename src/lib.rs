pub mod config;
pub mod core;
pub mod error;
pub mod inbound_msg;
pub mod limit;
pub mod order;
pub mod order_matcher;
pub mod order_matcher_fifo;
pub mod orderbook;
pub mod settlement;
pub mod snapshot;
pub mod symbol;

pub type OrderId = u64;
pub type OwnerId = u64;

pub use crate::core::{ExchangeCore, ExchangeHandle, MarketOrderOutcome};
pub use crate::error::{ExchangeError, Result, SettlementError};
pub use crate::orderbook::Orderbook;
