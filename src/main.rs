use std::process;
use std::sync::Arc;

use limit_exchange::config::CoreConfig;
use limit_exchange::core::ExchangeCore;
use limit_exchange::inbound_msg::{InboundMessage, LimitOrderRequest, MarketOrderRequest, OrderRequest};
use limit_exchange::settlement::InMemoryLedger;
use limit_exchange::symbol::Side;
use log::{error, info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use rust_decimal::Decimal;

const DEMO_OWNERS: [u64; 3] = [100001, 100002, 100003];
const DEMO_ORDERS: usize = 200;
const MID_PRICE: f64 = 18_000.0;

fn main() {
    env_logger::init();
    info!("Starting Up...");

    let config = match CoreConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            process::exit(1);
        }
    };

    let mut ledger = InMemoryLedger::new();
    for owner in DEMO_OWNERS.iter() {
        ledger.open_account(*owner, &format!("0x{:040x}", owner), Decimal::from(1_000));
    }
    let ledger = Arc::new(ledger);

    let markets = config.markets.clone();
    if markets.is_empty() {
        error!("No markets configured");
        process::exit(1);
    }
    let (handle, worker) = ExchangeCore::new(&config)
        .with_settlement(ledger.clone(), ledger.clone())
        .spawn();

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let prices = match Normal::new(MID_PRICE, 25.0) {
        Ok(prices) => prices,
        Err(err) => {
            error!("Invalid price distribution: {}", err);
            process::exit(1);
        }
    };

    for _ in 0..DEMO_ORDERS {
        let market = markets[rng.gen_range(0..markets.len())];
        let owner = DEMO_OWNERS[rng.gen_range(0..DEMO_OWNERS.len())];
        let side = if rng.gen_bool(0.5) { Side::Bid } else { Side::Ask };
        let size = Decimal::from(rng.gen_range(1..20u32));

        let request = if rng.gen_bool(0.8) {
            // Keep bids under and asks over the mid so resting orders rarely cross
            let offset: f64 = prices.sample(&mut rng) - MID_PRICE;
            let price = match side {
                Side::Bid => MID_PRICE - offset.abs() - 1.0,
                Side::Ask => MID_PRICE + offset.abs() + 1.0,
            };
            OrderRequest::Limit(LimitOrderRequest {
                market,
                side,
                owner,
                size,
                price: Decimal::from(price.round() as i64),
            })
        } else {
            OrderRequest::Market(MarketOrderRequest {
                market,
                side,
                owner,
                size,
            })
        };

        match handle.request(InboundMessage::PlaceOrder(request)) {
            Ok(response) => info!("{}", response.dump()),
            Err(err) => warn!("{}", err),
        }
    }

    for market in markets.iter() {
        if let Ok(book) = handle.request(InboundMessage::GetBook(*market)) {
            info!("{} book: {}", market, book.pretty(2));
        }
    }
    for owner in DEMO_OWNERS.iter() {
        info!("Balance of {}: {:?}", owner, ledger.balance(*owner));
    }

    drop(handle);
    if worker.join().is_err() {
        error!("Exchange core thread panicked");
        process::exit(1);
    }
}
