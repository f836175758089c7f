use crate::error::{ExchangeError, Result};
use crate::symbol::Symbol;
use crate::OrderId;
use std::env;

pub const MARKETS_VAR: &str = "EXCHANGE_MARKETS";
pub const FIRST_ORDER_ID_VAR: &str = "EXCHANGE_FIRST_ORDER_ID";

#[derive(Debug, Clone, PartialEq)]
pub struct CoreConfig {
    /// One orderbook is created per market
    pub markets: Vec<Symbol>,
    pub first_order_id: OrderId,
}

impl Default for CoreConfig {
    fn default() -> Self {
        CoreConfig {
            markets: vec![Symbol::ETH, Symbol::BTC],
            first_order_id: 1,
        }
    }
}

impl CoreConfig {
    pub fn from_env() -> Result<CoreConfig> {
        CoreConfig::from_values(
            env::var(MARKETS_VAR).ok().as_deref(),
            env::var(FIRST_ORDER_ID_VAR).ok().as_deref(),
        )
    }

    /// Unset values fall back to the defaults; malformed ones are rejected.
    pub fn from_values(markets: Option<&str>, first_order_id: Option<&str>) -> Result<CoreConfig> {
        let mut config = CoreConfig::default();

        if let Some(markets) = markets {
            config.markets = markets
                .split(',')
                .filter(|name| !name.trim().is_empty())
                .map(|name| {
                    Symbol::from_string(name)
                        .ok_or_else(|| ExchangeError::MarketNotFound(name.trim().to_string()))
                })
                .collect::<Result<Vec<Symbol>>>()?;
        }

        if let Some(first_order_id) = first_order_id {
            config.first_order_id = first_order_id.trim().parse().map_err(|_| {
                ExchangeError::Config(format!(
                    "{} must be an unsigned integer, got {:?}",
                    FIRST_ORDER_ID_VAR, first_order_id
                ))
            })?;
        }

        Ok(config)
    }
}
