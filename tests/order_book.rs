use recurbuy::models::OrderBook;
use recurbuy::ErrorKind;

#[test]
fn keeps_insertion_order_and_replaces_in_place() {
    let mut book = OrderBook::new();
    book.insert("eth", 30.0).expect("eth");
    book.insert("BTC", 20.0).expect("btc");
    book.insert(" Eth ", 45.0).expect("eth again");

    let symbols: Vec<_> = book.iter().map(|order| order.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["ETH", "BTC"]);
    assert_eq!(book.get("eth"), Some(45.0));
    assert_eq!(book.total(), 65.0);
}

#[test]
fn rejects_bad_symbols_and_amounts() {
    let mut book = OrderBook::new();
    for (symbol, amount) in [("", 10.0), ("BTC-USD", 10.0), ("BTC", 0.0), ("BTC", -1.0), ("BTC", f64::INFINITY)] {
        let err = book.insert(symbol, amount).expect_err("invalid");
        assert_eq!(err.kind, ErrorKind::InvalidArgument, "{symbol} {amount}");
    }
    assert!(book.is_empty());
    assert_eq!(book.total(), 0.0);
}

#[test]
fn builds_from_pairs() {
    let book = OrderBook::from_pairs(&[("BTC", 20.0), ("ETH", 30.0)]).expect("book");
    assert_eq!(book.len(), 2);
    assert!(book.contains("btc"));
    assert!(!book.contains("ADA"));
    assert!(OrderBook::from_pairs(&[("BTC", 20.0), ("", 1.0)]).is_err());
}
