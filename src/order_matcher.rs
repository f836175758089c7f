use crate::order::Order;
use crate::orderbook::Orderbook;
use crate::symbol::Side;
use crate::OwnerId;
use rust_decimal::Decimal;

/// One maker/taker pairing. Both orders are captured right after the fill.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub maker: Order,
    pub taker: Order,
    /// Always the resting limit's price
    pub price: Decimal,
    pub size_filled: Decimal,
}

impl Match {
    pub fn ask(&self) -> &Order {
        match self.taker.side {
            Side::Ask => &self.taker,
            Side::Bid => &self.maker,
        }
    }

    pub fn bid(&self) -> &Order {
        match self.taker.side {
            Side::Bid => &self.taker,
            Side::Ask => &self.maker,
        }
    }

    pub fn seller(&self) -> OwnerId {
        self.ask().owner
    }

    pub fn buyer(&self) -> OwnerId {
        self.bid().owner
    }
}

pub trait OrderMatcher {
    /**
    Executes `taker` against the opposite side of `orderbook` until it is filled
    or that side runs dry. Returns the fills in execution order. The taker never rests.
    */
    fn match_market(&self, orderbook: &mut Orderbook, taker: &mut Order) -> Vec<Match>;
}
