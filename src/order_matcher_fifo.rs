use crate::order::Order;
use crate::order_matcher::{Match, OrderMatcher};
use crate::orderbook::Orderbook;
use log::debug;

/// Price-time priority: best opposite price first, oldest order first within a price.
#[derive(Default)]
pub struct OrderMatcherFifo {}

impl OrderMatcherFifo {
    pub fn new() -> OrderMatcherFifo {
        OrderMatcherFifo {}
    }
}

impl OrderMatcher for OrderMatcherFifo {
    fn match_market(&self, orderbook: &mut Orderbook, taker: &mut Order) -> Vec<Match> {
        let maker_side = taker.side.opposite();
        let mut matches = Vec::new();

        while !taker.is_filled() {
            let limit = match orderbook.best_limit_mut(maker_side) {
                Some(limit) => limit,
                None => break, // Opposite side exhausted, the rest of the taker is dropped
            };
            let price = limit.price();

            let maker_size = match limit.front().map(|maker| maker.size) {
                Some(size) => size,
                None => {
                    orderbook.prune_limit(maker_side, price);
                    continue;
                }
            };
            let fill = taker.size.min(maker_size);

            let maker = match limit.fill_front(fill) {
                Some(maker) => maker,
                None => break,
            };
            let limit_emptied = limit.is_empty();

            taker.size -= fill;
            if maker.is_filled() {
                orderbook.orders_index.remove(&maker.id);
            }
            if limit_emptied {
                orderbook.prune_limit(maker_side, price);
            }

            debug!(
                "Filled {} of taker {} against maker {} at {} (maker left: {})",
                fill, taker.id, maker.id, price, maker.size
            );
            matches.push(Match {
                maker,
                taker: taker.clone(),
                price,
                size_filled: fill,
            });
        }

        matches
    }
}
