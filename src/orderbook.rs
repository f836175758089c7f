use crate::error::{ExchangeError, Result};
use crate::limit::Limit;
use crate::order::Order;
use crate::order_matcher::{Match, OrderMatcher};
use crate::order_matcher_fifo::OrderMatcherFifo;
use crate::symbol::{Side, Symbol};
use crate::OrderId;
use log::{debug, info};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// Price-ordered limits for both sides of one instrument.
///
/// `orders_index` maps every live resting order to the side and price of the
/// limit holding it. A limit is dropped from its side as soon as it is empty.
pub struct Orderbook {
    symbol: Symbol,
    pub(crate) asks: BTreeMap<Decimal, Limit>,
    pub(crate) bids: BTreeMap<Decimal, Limit>,
    pub(crate) orders_index: HashMap<OrderId, (Side, Decimal)>,
    next_sequence: u64,
}

impl Orderbook {
    pub fn new(symbol: Symbol) -> Orderbook {
        Orderbook {
            symbol,
            asks: BTreeMap::new(),
            bids: BTreeMap::new(),
            orders_index: HashMap::new(),
            next_sequence: 0,
        }
    }

    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.keys().next().copied()
    }

    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.keys().next_back().copied()
    }

    pub fn spread(&self) -> Option<Decimal> {
        Some(self.best_ask()? - self.best_bid()?)
    }

    fn log_best_ask_bid(&self) {
        debug!(
            "[{}] best ask: {:?}, best bid: {:?}",
            self.symbol,
            self.best_ask(),
            self.best_bid()
        );
    }

    fn stamp(&mut self, order: &mut Order) {
        self.next_sequence += 1;
        order.sequence = self.next_sequence;
    }

    fn limits_mut(&mut self, side: Side) -> &mut BTreeMap<Decimal, Limit> {
        match side {
            Side::Ask => &mut self.asks,
            Side::Bid => &mut self.bids,
        }
    }

    /// Best limit of `side`: lowest ask or highest bid.
    pub(crate) fn best_limit_mut(&mut self, side: Side) -> Option<&mut Limit> {
        match side {
            Side::Ask => self.asks.values_mut().next(),
            Side::Bid => self.bids.values_mut().next_back(),
        }
    }

    pub(crate) fn prune_limit(&mut self, side: Side, price: Decimal) {
        let limits = self.limits_mut(side);
        if limits.get(&price).map_or(false, Limit::is_empty) {
            limits.remove(&price);
            debug!("[{}] pruned empty {} limit at {}", self.symbol, side, price);
        }
    }

    /**
    Rests `order` at `price` on its own side. Placement never executes against
    the opposite side, even when the price crosses it.
    */
    pub fn place_limit_order(&mut self, price: Decimal, mut order: Order) -> Result<()> {
        if order.size <= Decimal::ZERO {
            return Err(ExchangeError::invalid(format!(
                "size must be positive, got {}",
                order.size
            )));
        }
        if price <= Decimal::ZERO {
            return Err(ExchangeError::invalid(format!(
                "limit price must be positive, got {}",
                price
            )));
        }
        if self.orders_index.contains_key(&order.id) {
            return Err(ExchangeError::invalid(format!(
                "order {} is already resting",
                order.id
            )));
        }

        // Side totals stay representable, so every level and volume sum does too
        if self.total_volume(order.side).checked_add(order.size).is_none() {
            return Err(ExchangeError::invalid(format!(
                "{} volume would overflow with order {}",
                order.side, order.id
            )));
        }

        self.stamp(&mut order);
        let (order_id, side) = (order.id, order.side);

        let added = self
            .limits_mut(side)
            .entry(price)
            .or_insert_with(|| Limit::new(price))
            .add_order(order);
        if let Err(err) = added {
            self.prune_limit(side, price);
            return Err(err);
        }
        self.orders_index.insert(order_id, (side, price));

        info!(
            "[{}] Inserted {} order {} at price {}",
            self.symbol, side, order_id, price
        );
        self.log_best_ask_bid();
        Ok(())
    }

    /// Executes `order` with price-time priority. See [`OrderMatcherFifo`].
    pub fn place_market_order(&mut self, order: &mut Order) -> Result<Vec<Match>> {
        self.place_market_order_with(&OrderMatcherFifo::new(), order)
    }

    pub fn place_market_order_with<M: OrderMatcher>(
        &mut self,
        matcher: &M,
        order: &mut Order,
    ) -> Result<Vec<Match>> {
        if order.size <= Decimal::ZERO {
            return Err(ExchangeError::invalid(format!(
                "size must be positive, got {}",
                order.size
            )));
        }
        self.stamp(order);

        let matches = matcher.match_market(self, order);

        info!(
            "[{}] Market {} order {} produced {} matches, {} left unfilled",
            self.symbol,
            order.side,
            order.id,
            matches.len(),
            order.size
        );
        self.log_best_ask_bid();
        Ok(matches)
    }

    pub fn cancel_order(&mut self, order_id: &OrderId) -> Result<Order> {
        let (side, price) = *self
            .orders_index
            .get(order_id)
            .ok_or(ExchangeError::OrderNotFound(*order_id))?;

        let order = self
            .limits_mut(side)
            .get_mut(&price)
            .ok_or(ExchangeError::OrderNotFound(*order_id))?
            .delete_order(order_id)?;
        self.orders_index.remove(order_id);
        self.prune_limit(side, price);

        info!(
            "[{}] Canceled {} order {} at price {} with {} remaining",
            self.symbol, side, order_id, price, order.size
        );
        Ok(order)
    }

    pub fn get_order(&self, order_id: &OrderId) -> Option<&Order> {
        let (side, price) = self.orders_index.get(order_id)?;
        let limits = match side {
            Side::Ask => &self.asks,
            Side::Bid => &self.bids,
        };
        limits.get(price)?.get(order_id)
    }

    /// Number of live resting orders.
    pub fn order_count(&self) -> usize {
        self.orders_index.len()
    }

    pub fn ask_total_volume(&self) -> Decimal {
        self.asks.values().map(Limit::volume).sum()
    }

    pub fn bid_total_volume(&self) -> Decimal {
        self.bids.values().map(Limit::volume).sum()
    }

    pub fn total_volume(&self, side: Side) -> Decimal {
        match side {
            Side::Ask => self.ask_total_volume(),
            Side::Bid => self.bid_total_volume(),
        }
    }

    /// Ask limits, lowest price first.
    pub fn asks(&self) -> impl Iterator<Item = &Limit> {
        self.asks.values()
    }

    /// Bid limits, highest price first.
    pub fn bids(&self) -> impl Iterator<Item = &Limit> {
        self.bids.values().rev()
    }

    pub fn limits(&self, side: Side) -> Box<dyn Iterator<Item = &Limit> + '_> {
        match side {
            Side::Ask => Box::new(self.asks()),
            Side::Bid => Box::new(self.bids()),
        }
    }
}
