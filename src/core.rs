use std::collections::HashMap;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use json::JsonValue;
use log::{error, info, warn};
use rust_decimal::Decimal;

use crate::config::CoreConfig;
use crate::error::{ExchangeError, Result, SettlementError};
use crate::inbound_msg::{
    AsyncMessage, InboundMessage, LimitOrderRequest, MarketOrderRequest, OrderRequest,
};
use crate::order::Order;
use crate::order_matcher::Match;
use crate::orderbook::Orderbook;
use crate::settlement::{settle_matches, AccountDirectory, SettlementService};
use crate::snapshot::BookSnapshot;
use crate::symbol::{Side, Symbol};
use crate::OrderId;

/// What a market order did. Running out of opposite liquidity is reported
/// through `unfilled`, not as an error.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketOrderOutcome {
    /// The taker as it stood when matching stopped
    pub order: Order,
    pub matches: Vec<Match>,
    pub filled: Decimal,
    pub unfilled: Decimal,
    /// `None` when no settlement service is attached
    pub settlement: Option<std::result::Result<usize, SettlementError>>,
}

impl MarketOrderOutcome {
    pub fn is_partial(&self) -> bool {
        self.unfilled > Decimal::ZERO
    }
}

struct Settlement {
    directory: Arc<dyn AccountDirectory + Send + Sync>,
    service: Arc<dyn SettlementService + Send + Sync>,
}

/// Registry of orderbooks keyed by instrument, plus the order id allocator.
pub struct ExchangeCore {
    orderbooks: HashMap<Symbol, Orderbook>,
    orderbook_id_lookup: HashMap<OrderId, Symbol>,
    next_order_id: OrderId,
    settlement: Option<Settlement>,
}

impl ExchangeCore {
    pub fn new(config: &CoreConfig) -> ExchangeCore {
        let orderbooks = config
            .markets
            .iter()
            .map(|symbol| (*symbol, Orderbook::new(*symbol)))
            .collect();

        ExchangeCore {
            orderbooks,
            orderbook_id_lookup: HashMap::new(),
            next_order_id: config.first_order_id,
            settlement: None,
        }
    }

    pub fn with_settlement(
        mut self,
        directory: Arc<dyn AccountDirectory + Send + Sync>,
        service: Arc<dyn SettlementService + Send + Sync>,
    ) -> ExchangeCore {
        self.settlement = Some(Settlement { directory, service });
        self
    }

    pub fn orderbook(&self, symbol: Symbol) -> Option<&Orderbook> {
        self.orderbooks.get(&symbol)
    }

    fn orderbook_mut(&mut self, symbol: Symbol) -> Result<&mut Orderbook> {
        self.orderbooks
            .get_mut(&symbol)
            .ok_or_else(|| ExchangeError::MarketNotFound(symbol.to_string()))
    }

    pub fn submit_limit_order(&mut self, request: &LimitOrderRequest) -> Result<OrderId> {
        let order_id = self.next_order_id;
        let order = Order::new(order_id, request.side, request.owner, request.size);

        self.orderbook_mut(request.market)?
            .place_limit_order(request.price, order)?;

        self.next_order_id += 1;
        self.orderbook_id_lookup.insert(order_id, request.market);
        Ok(order_id)
    }

    pub fn submit_market_order(&mut self, request: &MarketOrderRequest) -> Result<MarketOrderOutcome> {
        let mut order = Order::new(self.next_order_id, request.side, request.owner, request.size);

        let matches = self
            .orderbook_mut(request.market)?
            .place_market_order(&mut order)?;
        self.next_order_id += 1;

        for m in matches.iter().filter(|m| m.maker.is_filled()) {
            self.orderbook_id_lookup.remove(&m.maker.id);
        }

        let settlement = self.settlement.as_ref().map(|settlement| {
            settle_matches(&matches, settlement.directory.as_ref(), settlement.service.as_ref())
        });
        if let Some(Err(err)) = &settlement {
            warn!("Order {} matched but settlement failed: {}", order.id, err);
        }

        Ok(MarketOrderOutcome {
            filled: order.filled_size(),
            unfilled: order.size,
            order,
            matches,
            settlement,
        })
    }

    pub fn cancel_order(&mut self, order_id: OrderId) -> Result<Order> {
        let symbol = *self
            .orderbook_id_lookup
            .get(&order_id)
            .ok_or(ExchangeError::OrderNotFound(order_id))?;

        let order = self.orderbook_mut(symbol)?.cancel_order(&order_id)?;
        self.orderbook_id_lookup.remove(&order_id);
        Ok(order)
    }

    pub fn query_book(&self, symbol: Symbol) -> Result<BookSnapshot> {
        self.orderbook(symbol)
            .map(BookSnapshot::of)
            .ok_or_else(|| ExchangeError::MarketNotFound(symbol.to_string()))
    }

    pub fn query_volume(&self, symbol: Symbol, side: Side) -> Result<Decimal> {
        self.orderbook(symbol)
            .map(|orderbook| orderbook.total_volume(side))
            .ok_or_else(|| ExchangeError::MarketNotFound(symbol.to_string()))
    }

    pub fn process_inbound_message(&mut self, msg: InboundMessage) -> Result<JsonValue> {
        let mut response = JsonValue::new_object();

        match msg {
            InboundMessage::PlaceOrder(OrderRequest::Limit(request)) => {
                let order_id = self.submit_limit_order(&request)?;
                response["msg"] = "limit order placed".into();
                response["order_id"] = order_id.into();
            }
            InboundMessage::PlaceOrder(OrderRequest::Market(request)) => {
                let outcome = self.submit_market_order(&request)?;
                response["msg"] = "market order placed".into();
                response["order_id"] = outcome.order.id.into();
                response["filled"] = outcome.filled.normalize().to_string().into();
                response["unfilled"] = outcome.unfilled.normalize().to_string().into();
                response["matches"] = JsonValue::Array(outcome.matches.iter().map(JsonValue::from).collect());
                if let Some(Err(err)) = outcome.settlement {
                    response["settlement_error"] = err.to_string().into();
                }
            }
            InboundMessage::CancelOrder(order_id) => {
                self.cancel_order(order_id)?;
                response["msg"] = "order deleted successfully".into();
                response["order_id"] = order_id.into();
            }
            InboundMessage::GetBook(symbol) => {
                response = JsonValue::from(&self.query_book(symbol)?);
            }
        }

        Ok(response)
    }

    /**
    Moves the core onto its own thread, which applies every command in arrival
    order. The thread exits once all handles are dropped and hands the core back
    through the join handle.
    */
    pub fn spawn(mut self) -> (ExchangeHandle, JoinHandle<ExchangeCore>) {
        let (tx, rx) = mpsc::channel::<AsyncMessage<InboundMessage>>();

        let worker = thread::spawn(move || {
            info!("Exchange core running for {} markets", self.orderbooks.len());
            for msg in rx {
                info!("Processing inbound message: {:?}...", &msg.cmd);
                let reply = self.process_inbound_message(msg.cmd);
                if let Err(err) = &reply {
                    warn!("Request rejected: {}", err);
                }
                if msg.resp.send(reply).is_err() {
                    error!("Requester hung up before receiving its reply");
                }
            }
            info!("Exchange core stopped");
            self
        });

        (ExchangeHandle { tx }, worker)
    }
}

/// Cloneable entry point to a spawned [`ExchangeCore`].
#[derive(Clone)]
pub struct ExchangeHandle {
    tx: Sender<AsyncMessage<InboundMessage>>,
}

impl ExchangeHandle {
    pub fn request(&self, msg: InboundMessage) -> Result<JsonValue> {
        let (msg, rx) = AsyncMessage::new(msg);
        self.tx.send(msg).map_err(|_| ExchangeError::Disconnected)?;
        rx.recv().map_err(|_| ExchangeError::Disconnected)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::InMemoryLedger;

    fn limit(side: Side, owner: u64, price: i64, size: i64) -> LimitOrderRequest {
        LimitOrderRequest {
            market: Symbol::ETH,
            side,
            owner,
            size: Decimal::from(size),
            price: Decimal::from(price),
        }
    }

    fn market(side: Side, owner: u64, size: i64) -> MarketOrderRequest {
        MarketOrderRequest {
            market: Symbol::ETH,
            side,
            owner,
            size: Decimal::from(size),
        }
    }

    #[test]
    fn test_order_ids_are_sequential() {
        let mut core = ExchangeCore::new(&CoreConfig::default());

        assert_eq!(core.submit_limit_order(&limit(Side::Ask, 1, 100, 1)).unwrap(), 1);
        assert!(core.submit_limit_order(&limit(Side::Ask, 1, 0, 1)).is_err());
        assert_eq!(core.submit_limit_order(&limit(Side::Bid, 1, 90, 1)).unwrap(), 2);
    }

    #[test]
    fn test_unknown_market() {
        let config = CoreConfig {
            markets: vec![Symbol::BTC],
            first_order_id: 1,
        };
        let mut core = ExchangeCore::new(&config);

        assert_eq!(
            core.submit_limit_order(&limit(Side::Ask, 1, 100, 1)),
            Err(ExchangeError::MarketNotFound("ETH".to_string()))
        );
        assert!(core.query_book(Symbol::ETH).is_err());
    }

    #[test]
    fn test_filled_maker_cannot_be_canceled() {
        let mut core = ExchangeCore::new(&CoreConfig::default());
        let maker = core.submit_limit_order(&limit(Side::Ask, 1, 100, 5)).unwrap();

        let outcome = core.submit_market_order(&market(Side::Bid, 2, 5)).unwrap();
        assert!(!outcome.is_partial());
        assert_eq!(core.cancel_order(maker), Err(ExchangeError::OrderNotFound(maker)));
    }

    #[test]
    fn test_partial_liquidity_is_reported() {
        let mut core = ExchangeCore::new(&CoreConfig::default());
        core.submit_limit_order(&limit(Side::Bid, 1, 100, 3)).unwrap();

        let outcome = core.submit_market_order(&market(Side::Ask, 2, 5)).unwrap();
        assert!(outcome.is_partial());
        assert_eq!(outcome.filled, Decimal::from(3));
        assert_eq!(outcome.unfilled, Decimal::from(2));
        assert_eq!(outcome.settlement, None);
        assert_eq!(core.query_volume(Symbol::ETH, Side::Bid).unwrap(), Decimal::ZERO);
        assert_eq!(core.query_volume(Symbol::ETH, Side::Ask).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_settlement_failure_keeps_book_state() {
        let mut ledger = InMemoryLedger::new();
        ledger.open_account(1, "0xseller", Decimal::from(2));
        ledger.open_account(2, "0xbuyer", Decimal::ZERO);
        let ledger = Arc::new(ledger);

        let mut core = ExchangeCore::new(&CoreConfig::default())
            .with_settlement(ledger.clone(), ledger.clone());
        core.submit_limit_order(&limit(Side::Ask, 1, 100, 5)).unwrap();

        let outcome = core.submit_market_order(&market(Side::Bid, 2, 4)).unwrap();
        assert!(matches!(
            outcome.settlement,
            Some(Err(SettlementError::InsufficientFunds { owner: 1, .. }))
        ));
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(core.query_volume(Symbol::ETH, Side::Ask).unwrap(), Decimal::from(1));
        assert_eq!(ledger.balance(2), Some(Decimal::ZERO));
    }

    #[test]
    fn test_process_inbound_messages() {
        let mut core = ExchangeCore::new(&CoreConfig::default());

        let placed = core
            .process_inbound_message(InboundMessage::PlaceOrder(OrderRequest::Limit(limit(
                Side::Ask,
                1,
                18_000,
                20,
            ))))
            .unwrap();
        assert_eq!(placed["msg"], "limit order placed");
        let order_id = placed["order_id"].as_u64().unwrap();

        let matched = core
            .process_inbound_message(InboundMessage::PlaceOrder(OrderRequest::Market(market(
                Side::Bid,
                2,
                10,
            ))))
            .unwrap();
        assert_eq!(matched["msg"], "market order placed");
        assert_eq!(matched["matches"][0]["id"], order_id);
        assert_eq!(matched["matches"][0]["price"], "18000");
        assert_eq!(matched["unfilled"], "0");

        let book = core.process_inbound_message(InboundMessage::GetBook(Symbol::ETH)).unwrap();
        assert_eq!(book["total_ask_volume"], "10");

        let canceled = core.process_inbound_message(InboundMessage::CancelOrder(order_id)).unwrap();
        assert_eq!(canceled["msg"], "order deleted successfully");
        assert_eq!(
            core.process_inbound_message(InboundMessage::CancelOrder(order_id)),
            Err(ExchangeError::OrderNotFound(order_id))
        );
    }

    #[test]
    fn test_spawned_core_serializes_requests() {
        let (handle, worker) = ExchangeCore::new(&CoreConfig::default()).spawn();

        let senders: Vec<_> = (0..4)
            .map(|owner| {
                let handle = handle.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        handle
                            .request(InboundMessage::PlaceOrder(OrderRequest::Limit(limit(
                                Side::Bid,
                                owner,
                                100 + owner as i64,
                                1,
                            ))))
                            .unwrap();
                    }
                })
            })
            .collect();
        for sender in senders {
            sender.join().unwrap();
        }
        drop(handle);

        let core = worker.join().unwrap();
        let orderbook = core.orderbook(Symbol::ETH).unwrap();
        assert_eq!(orderbook.bid_total_volume(), Decimal::from(100));
        assert_eq!(orderbook.order_count(), 100);
        assert_eq!(orderbook.bids().count(), 4);
    }
}
