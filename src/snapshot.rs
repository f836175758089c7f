use crate::limit::Limit;
use crate::order::Order;
use crate::order_matcher::Match;
use crate::orderbook::Orderbook;
use crate::symbol::{Side, Symbol};
use json::JsonValue;
use rust_decimal::Decimal;

/// Copy of one price level at the time the snapshot was taken.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSnapshot {
    pub price: Decimal,
    pub volume: Decimal,
    pub orders: Vec<Order>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookSnapshot {
    pub symbol: Symbol,
    pub total_bid_volume: Decimal,
    pub total_ask_volume: Decimal,
    /// Lowest price first
    pub asks: Vec<LevelSnapshot>,
    /// Highest price first
    pub bids: Vec<LevelSnapshot>,
}

impl From<&Limit> for LevelSnapshot {
    fn from(limit: &Limit) -> Self {
        LevelSnapshot {
            price: limit.price(),
            volume: limit.volume(),
            orders: limit.orders().cloned().collect(),
        }
    }
}

impl BookSnapshot {
    pub fn of(orderbook: &Orderbook) -> BookSnapshot {
        BookSnapshot {
            symbol: orderbook.symbol(),
            total_bid_volume: orderbook.bid_total_volume(),
            total_ask_volume: orderbook.ask_total_volume(),
            asks: orderbook.asks().map(LevelSnapshot::from).collect(),
            bids: orderbook.bids().map(LevelSnapshot::from).collect(),
        }
    }

    pub fn levels(&self, side: Side) -> &[LevelSnapshot] {
        match side {
            Side::Ask => &self.asks,
            Side::Bid => &self.bids,
        }
    }
}

fn decimal_json(value: Decimal) -> JsonValue {
    JsonValue::from(value.normalize().to_string())
}

fn order_json(order: &Order, price: Decimal) -> JsonValue {
    let mut value = JsonValue::new_object();
    value["id"] = order.id.into();
    value["user_id"] = order.owner.into();
    value["price"] = decimal_json(price);
    value["size"] = decimal_json(order.size);
    value["bid"] = order.side.is_bid().into();
    value["sequence"] = order.sequence.into();
    value
}

fn side_json(levels: &[LevelSnapshot]) -> JsonValue {
    JsonValue::Array(
        levels
            .iter()
            .flat_map(|level| level.orders.iter().map(move |order| order_json(order, level.price)))
            .collect(),
    )
}

impl From<&BookSnapshot> for JsonValue {
    fn from(snapshot: &BookSnapshot) -> Self {
        let mut value = JsonValue::new_object();
        value["market"] = snapshot.symbol.to_string().into();
        value["total_bid_volume"] = decimal_json(snapshot.total_bid_volume);
        value["total_ask_volume"] = decimal_json(snapshot.total_ask_volume);
        value["asks"] = side_json(&snapshot.asks);
        value["bids"] = side_json(&snapshot.bids);
        value
    }
}

/// Reported from the taker's point of view: `id` is the maker it traded with.
impl From<&Match> for JsonValue {
    fn from(m: &Match) -> Self {
        let mut value = JsonValue::new_object();
        value["id"] = m.maker.id.into();
        value["price"] = decimal_json(m.price);
        value["size"] = decimal_json(m.size_filled);
        value
    }
}
