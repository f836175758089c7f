use crate::error::{ExchangeError, Result};
use crate::symbol::{Side, Symbol};
use crate::{OrderId, OwnerId};
use json::JsonValue;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, Sender};

/// A command paired with the channel its reply goes back on.
pub struct AsyncMessage<T> {
    pub cmd: T,
    pub resp: Sender<Result<JsonValue>>,
}

impl<T> AsyncMessage<T> {
    pub fn new(msg: T) -> (AsyncMessage<T>, Receiver<Result<JsonValue>>) {
        let (resp, rx) = mpsc::channel::<Result<JsonValue>>();
        (AsyncMessage { cmd: msg, resp }, rx)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LimitOrderRequest {
    pub market: Symbol,
    pub side: Side,
    pub owner: OwnerId,
    pub size: Decimal,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketOrderRequest {
    pub market: Symbol,
    pub side: Side,
    pub owner: OwnerId,
    pub size: Decimal,
}

/// An order submission that has passed boundary validation.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderRequest {
    Limit(LimitOrderRequest),
    Market(MarketOrderRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    PlaceOrder(OrderRequest),
    CancelOrder(OrderId),
    GetBook(Symbol),
}

fn field_str<'a>(body: &'a JsonValue, key: &str) -> Result<&'a str> {
    body[key]
        .as_str()
        .ok_or_else(|| ExchangeError::invalid(format!("missing or non-string field '{}'", key)))
}

fn field_u64(body: &JsonValue, key: &str) -> Result<u64> {
    let value = &body[key];
    if let Some(number) = value.as_u64() {
        return Ok(number);
    }
    value
        .as_str()
        .and_then(|text| text.trim().parse().ok())
        .ok_or_else(|| ExchangeError::invalid(format!("field '{}' must be an unsigned integer", key)))
}

/**
Reads a decimal from either a JSON number or a decimal string.
Returns an error if the field is absent or does not hold a finite decimal.
*/
fn field_decimal(body: &JsonValue, key: &str) -> Result<Decimal> {
    let value = &body[key];
    let text = if value.is_number() {
        value.dump()
    } else {
        field_str(body, key)?.trim().to_string()
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| ExchangeError::invalid(format!("field '{}' is not a decimal: {}", key, text)))
}

fn positive(value: Decimal, key: &str) -> Result<Decimal> {
    if value <= Decimal::ZERO {
        return Err(ExchangeError::invalid(format!(
            "field '{}' must be positive, got {}",
            key, value
        )));
    }
    Ok(value)
}

/// Accepts the boolean `bid` flag or a `side` string.
fn field_side(body: &JsonValue) -> Result<Side> {
    if let Some(is_bid) = body["bid"].as_bool() {
        return Ok(if is_bid { Side::Bid } else { Side::Ask });
    }
    let side = field_str(body, "side")?;
    Side::from_string(side).ok_or_else(|| ExchangeError::invalid(format!("unknown side '{}'", side)))
}

fn field_market(body: &JsonValue) -> Result<Symbol> {
    let market = field_str(body, "market")?;
    Symbol::from_string(market).ok_or_else(|| ExchangeError::MarketNotFound(market.to_string()))
}

impl OrderRequest {
    pub fn from_json(body: &JsonValue) -> Result<OrderRequest> {
        let order_type = field_str(body, "type")?;
        let market = field_market(body)?;
        let side = field_side(body)?;
        let owner = field_u64(body, "user_id")?;
        let size = positive(field_decimal(body, "size")?, "size")?;

        match order_type.to_uppercase().as_str() {
            "LIMIT" => Ok(OrderRequest::Limit(LimitOrderRequest {
                market,
                side,
                owner,
                size,
                price: positive(field_decimal(body, "price")?, "price")?,
            })),
            "MARKET" => Ok(OrderRequest::Market(MarketOrderRequest {
                market,
                side,
                owner,
                size,
            })),
            other => Err(ExchangeError::invalid(format!("unknown order type '{}'", other))),
        }
    }

    pub fn parse(body: &str) -> Result<OrderRequest> {
        let body = json::parse(body).map_err(|err| ExchangeError::invalid(err.to_string()))?;
        OrderRequest::from_json(&body)
    }
}

impl InboundMessage {
    /**
    Decodes the wire form of a command. `action` is one of `place_order`,
    `cancel_order` or `get_book`; `body` is the JSON payload.
    */
    pub fn from_json(action: &str, body: &str) -> Result<InboundMessage> {
        let body = json::parse(body).map_err(|err| ExchangeError::invalid(err.to_string()))?;

        match action.to_lowercase().as_str() {
            "place_order" => Ok(InboundMessage::PlaceOrder(OrderRequest::from_json(&body)?)),
            "cancel_order" => Ok(InboundMessage::CancelOrder(field_u64(&body, "order_id")?)),
            "get_book" => Ok(InboundMessage::GetBook(field_market(&body)?)),
            other => Err(ExchangeError::invalid(format!("unknown action '{}'", other))),
        }
    }
}
