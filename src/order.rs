use crate::symbol::Side;
use crate::{OrderId, OwnerId};
use rust_decimal::Decimal;

#[derive(Clone, PartialEq, Debug)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub owner: OwnerId,
    /// Remaining (unfilled) size
    pub size: Decimal,
    pub original_size: Decimal,
    /// Arrival sequence, stamped by the orderbook on submission
    pub sequence: u64,
}

impl Order {
    pub fn new(id: OrderId, side: Side, owner: OwnerId, size: Decimal) -> Order {
        Order {
            id,
            side,
            owner,
            size,
            original_size: size,
            sequence: 0,
        }
    }

    pub fn is_filled(&self) -> bool {
        self.size.is_zero()
    }

    pub fn filled_size(&self) -> Decimal {
        self.original_size - self.size
    }
}
