use std::sync::Arc;

use limit_exchange::config::CoreConfig;
use limit_exchange::core::ExchangeCore;
use limit_exchange::inbound_msg::InboundMessage;
use limit_exchange::settlement::InMemoryLedger;
use limit_exchange::ExchangeError;
use rust_decimal::Decimal;

fn request(action: &str, body: &str) -> InboundMessage {
    InboundMessage::from_json(action, body).unwrap()
}

#[test]
fn test_wire_round_trip_through_spawned_core() {
    let mut ledger = InMemoryLedger::new();
    ledger.open_account(100001, "0xaaaa", Decimal::from(50));
    ledger.open_account(100002, "0xbbbb", Decimal::ZERO);
    let ledger = Arc::new(ledger);

    let (handle, worker) = ExchangeCore::new(&CoreConfig::default())
        .with_settlement(ledger.clone(), ledger.clone())
        .spawn();

    let placed = handle
        .request(request(
            "place_order",
            r#"{"type": "LIMIT", "bid": false, "size": 20, "price": 18000, "market": "ETH", "user_id": 100001}"#,
        ))
        .unwrap();
    let ask_id = placed["order_id"].as_u64().unwrap();

    let matched = handle
        .request(request(
            "place_order",
            r#"{"type": "MARKET", "bid": true, "size": 25, "market": "ETH", "user_id": 100002}"#,
        ))
        .unwrap();
    assert_eq!(matched["matches"].len(), 1);
    assert_eq!(matched["matches"][0]["id"], ask_id);
    assert_eq!(matched["filled"], "20");
    assert_eq!(matched["unfilled"], "5");
    assert!(matched["settlement_error"].is_null());

    let book = handle
        .request(request("get_book", r#"{"market": "ETH"}"#))
        .unwrap();
    assert_eq!(book["total_ask_volume"], "0");
    assert_eq!(book["total_bid_volume"], "0");

    assert_eq!(
        handle.request(request("cancel_order", &format!(r#"{{"order_id": {}}}"#, ask_id))),
        Err(ExchangeError::OrderNotFound(ask_id))
    );

    drop(handle);
    let core = worker.join().unwrap();
    assert_eq!(core.orderbook(limit_exchange::symbol::Symbol::ETH).unwrap().order_count(), 0);
    assert_eq!(ledger.balance(100001), Some(Decimal::from(30)));
    assert_eq!(ledger.balance(100002), Some(Decimal::from(20)));
}

#[test]
fn test_cancel_resting_order_over_handle() {
    let (handle, _worker) = ExchangeCore::new(&CoreConfig::default()).spawn();

    let placed = handle
        .request(request(
            "place_order",
            r#"{"type": "LIMIT", "side": "buy", "size": "5", "price": "10000", "market": "BTC", "user_id": 1}"#,
        ))
        .unwrap();
    let bid_id = placed["order_id"].as_u64().unwrap();

    let canceled = handle
        .request(request("cancel_order", &format!(r#"{{"order_id": {}}}"#, bid_id)))
        .unwrap();
    assert_eq!(canceled["order_id"], bid_id);

    let book = handle.request(request("get_book", r#"{"market": "BTC"}"#)).unwrap();
    assert_eq!(book["total_bid_volume"], "0");
    assert!(book["bids"].is_empty());
}

#[test]
fn test_overflowing_order_is_rejected_and_worker_keeps_serving() {
    let (handle, worker) = ExchangeCore::new(&CoreConfig::default()).spawn();
    let body = r#"{"type": "LIMIT", "bid": false, "size": "50000000000000000000000000000", "price": "1", "market": "ETH", "user_id": 1}"#;

    handle.request(request("place_order", body)).unwrap();
    assert!(matches!(
        handle.request(request("place_order", body)),
        Err(ExchangeError::InvalidOrder(_))
    ));

    let book = handle.request(request("get_book", r#"{"market": "ETH"}"#)).unwrap();
    assert_eq!(book["total_ask_volume"], "50000000000000000000000000000");
    assert_eq!(book["asks"].len(), 1);

    drop(handle);
    let core = worker.join().unwrap();
    assert_eq!(core.orderbook(limit_exchange::symbol::Symbol::ETH).unwrap().order_count(), 1);
}
