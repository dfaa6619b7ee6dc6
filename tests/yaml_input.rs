use chrono::{NaiveDate, NaiveDateTime};
use recurbuy::core::frequency::Frequency;
use recurbuy::input::{InputCollector, YamlInputCollector};
use recurbuy::ErrorKind;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn new_year_morning() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2022, 1, 1)
        .and_then(|date| date.and_hms_opt(8, 0, 0))
        .expect("datetime")
}

fn collector(content: &str) -> YamlInputCollector {
    YamlInputCollector::parse(content, new_year_morning()).expect("parse")
}

#[test]
fn collects_fixture() {
    let path = fixture_path("orders.yaml");
    let mut collector =
        YamlInputCollector::from_path(path.to_str().expect("path"), new_year_morning())
            .expect("load");
    let inputs = collector.collect_inputs().expect("inputs");

    assert_eq!(inputs.start_date, "2022-01-01");
    assert_eq!(inputs.start_time, "10:00 AM");
    assert_eq!(inputs.frequency, Frequency::Weekly);
    let orders: Vec<_> = inputs
        .orders
        .iter()
        .map(|order| (order.symbol.clone(), order.amount))
        .collect();
    assert_eq!(
        orders,
        vec![("BTC".to_string(), 20.0), ("ETH".to_string(), 30.5)]
    );

    let schedule = inputs.schedule().expect("schedule");
    assert_eq!(schedule.purchase_date(), "2022-01-01");
}

#[test]
fn mismatched_lists_are_rejected() {
    let path = fixture_path("orders_mismatched.yaml");
    let mut collector =
        YamlInputCollector::from_path(path.to_str().expect("path"), new_year_morning())
            .expect("load");
    let err = collector.get_orders().expect_err("mismatch");
    assert_eq!(err.kind, ErrorKind::InvalidArgument);
    assert!(err.message.contains("3 crypto symbols but 2 dollar amounts"));
}

#[test]
fn invalid_values_name_the_offender() {
    let mut bad_date = collector("start_date: 2022/01/01\nstart_time: 10:00 AM\n");
    let err = bad_date.get_start_date().expect_err("date");
    assert!(err.message.contains("2022/01/01"));

    let mut bad_time = collector("start_date: 2022-01-01\nstart_time: '9:5 AM'\n");
    assert!(bad_time.get_start_time().is_err());

    let mut bad_frequency = collector("frequency: yearly\n");
    let err = bad_frequency.get_frequency().expect_err("frequency");
    assert_eq!(err.kind, ErrorKind::InvalidFrequency);

    let mut bad_crypto = collector("crypto: [BTC-USD]\namount_usd: [10]\n");
    let err = bad_crypto.get_orders().expect_err("crypto");
    assert!(err.message.contains("BTC-USD"));

    let mut bad_amount = collector("crypto: [BTC]\namount_usd: [-10]\n");
    let err = bad_amount.get_orders().expect_err("amount");
    assert!(err.message.contains("-10"));
}

#[test]
fn start_in_the_past_is_rejected() {
    let mut past = collector("start_date: 2021-12-31\nstart_time: 10:00 AM\n");
    let err = past.get_start_datetime().expect_err("past");
    assert_eq!(err.kind, ErrorKind::InvalidArgument);

    let mut too_soon = collector("start_date: 2022-01-01\nstart_time: 08:00 AM\n");
    assert!(too_soon.get_start_datetime().is_err());
}

#[test]
fn missing_keys_and_bad_documents() {
    let mut empty = collector("frequency: daily\n");
    let err = empty.get_start_date().expect_err("missing");
    assert!(err.message.contains("start_date"));
    assert!(empty.get_orders().is_err());

    assert!(YamlInputCollector::parse("crypto: [BTC", new_year_morning()).is_err());
    assert!(YamlInputCollector::from_path("/nonexistent/orders.yaml", new_year_morning()).is_err());
}

#[test]
fn duplicate_symbols_keep_last_amount() {
    let mut duplicated = collector("crypto: [BTC, btc]\namount_usd: [10, 15]\n");
    let orders = duplicated.get_orders().expect("orders");
    assert_eq!(orders.len(), 1);
    assert_eq!(orders.get("BTC"), Some(15.0));
}
