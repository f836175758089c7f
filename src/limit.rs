use crate::error::{ExchangeError, Result};
use crate::order::Order;
use crate::OrderId;
use linked_hash_map::LinkedHashMap;
use rust_decimal::Decimal;

/// One price level. Members are kept in arrival order; `volume` is the sum of
/// their remaining sizes after every mutation.
#[derive(Debug, Clone)]
pub struct Limit {
    price: Decimal,
    orders: LinkedHashMap<OrderId, Order>,
    volume: Decimal,
}

impl Limit {
    pub fn new(price: Decimal) -> Limit {
        Limit {
            price,
            orders: LinkedHashMap::new(),
            volume: Decimal::ZERO,
        }
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn volume(&self) -> Decimal {
        self.volume
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Members, oldest first.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    pub fn get(&self, order_id: &OrderId) -> Option<&Order> {
        self.orders.get(order_id)
    }

    /// Appends `order`. Fails without touching the level if its volume would overflow.
    pub fn add_order(&mut self, order: Order) -> Result<()> {
        let replaced = self.orders.get(&order.id).map_or(Decimal::ZERO, |o| o.size);
        let volume = (self.volume - replaced)
            .checked_add(order.size)
            .ok_or_else(|| {
                ExchangeError::invalid(format!("volume at price {} would overflow", self.price))
            })?;

        self.orders.insert(order.id, order);
        self.volume = volume;
        Ok(())
    }

    pub fn delete_order(&mut self, order_id: &OrderId) -> Result<Order> {
        let order = self
            .orders
            .remove(order_id)
            .ok_or(ExchangeError::OrderNotFound(*order_id))?;
        self.volume -= order.size;
        Ok(order)
    }

    /// Oldest resting order, the next maker at this price.
    pub fn front(&self) -> Option<&Order> {
        self.orders.front().map(|(_, order)| order)
    }

    /**
    Fills the oldest member by `size` (capped at its remaining size) and returns
    the maker as it stands after the fill. A maker that reaches zero is removed.
    */
    pub fn fill_front(&mut self, size: Decimal) -> Option<Order> {
        let id = *self.orders.front()?.0;
        let maker = self.orders.get_mut(&id)?;

        let fill = size.min(maker.size);
        maker.size -= fill;
        self.volume -= fill;

        let maker = maker.clone();
        if maker.is_filled() {
            self.orders.remove(&id);
        }
        Some(maker)
    }
}
