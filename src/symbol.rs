use std::fmt;

/// Instruments an exchange core can carry a book for.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Symbol {
    BTC = 1,
    ETH = 2,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Side {
    Bid = 0,
    Ask = 1,
}

impl Side {
    pub fn from_string(value: &str) -> Option<Side> {
        match value.trim().to_lowercase().as_str() {
            "bid" | "buy" => Some(Side::Bid),
            "ask" | "sell" => Some(Side::Ask),
            _ => None,
        }
    }

    /// The side a taker on `self` consumes liquidity from.
    pub fn opposite(&self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }

    pub fn is_bid(&self) -> bool {
        *self == Side::Bid
    }
}

impl Symbol {
    pub fn from_string(value: &str) -> Option<Symbol> {
        match value.trim().to_lowercase().as_str() {
            "btc" => Some(Symbol::BTC),
            "eth" => Some(Symbol::ETH),
            _ => None,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Side::Bid => write!(f, "bid"),
            Side::Ask => write!(f, "ask"),
        }
    }
}
