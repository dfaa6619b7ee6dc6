use crate::{Error, Result};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

static START_TIME: OnceLock<i64> = OnceLock::new();

static TICKS_TOTAL: AtomicU64 = AtomicU64::new(0);
static DEPOSITS_TOTAL: AtomicU64 = AtomicU64::new(0);
static DEPOSITS_SKIPPED_TOTAL: AtomicU64 = AtomicU64::new(0);
static ORDERS_PLACED_TOTAL: AtomicU64 = AtomicU64::new(0);
static ORDERS_FAILED_TOTAL: AtomicU64 = AtomicU64::new(0);
static CONFIRMATIONS_SENT_TOTAL: AtomicU64 = AtomicU64::new(0);
static CONFIRMATIONS_FAILED_TOTAL: AtomicU64 = AtomicU64::new(0);
static MISSED_TARGETS_TOTAL: AtomicU64 = AtomicU64::new(0);
static ERRORS_TOTAL: AtomicU64 = AtomicU64::new(0);

static LAST_PURCHASE_TIMESTAMP: AtomicU64 = AtomicU64::new(0);

pub fn init_start_time() {
    let _ = START_TIME.set(now_epoch());
}

pub fn inc_tick() {
    TICKS_TOTAL.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_deposit() {
    DEPOSITS_TOTAL.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_deposit_skipped() {
    DEPOSITS_SKIPPED_TOTAL.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_order_placed() {
    ORDERS_PLACED_TOTAL.fetch_add(1, Ordering::Relaxed);
    LAST_PURCHASE_TIMESTAMP.store(now_epoch() as u64, Ordering::Relaxed);
}

pub fn inc_order_failed() {
    ORDERS_FAILED_TOTAL.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_confirmation_sent() {
    CONFIRMATIONS_SENT_TOTAL.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_confirmation_failed() {
    CONFIRMATIONS_FAILED_TOTAL.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_missed_target() {
    MISSED_TARGETS_TOTAL.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_error() {
    ERRORS_TOTAL.fetch_add(1, Ordering::Relaxed);
}

pub fn write_if_configured() -> Result<()> {
    let path = match std::env::var("RECURBUY_METRICS_PATH") {
        Ok(value) if !value.trim().is_empty() => value,
        _ => return Ok(()),
    };
    write_metrics(&path)
}

pub fn write_metrics(path: &str) -> Result<()> {
    let content = render();
    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| Error::new(format!("metrics dir create failed: {err}")))?;
    }
    fs::write(path, content).map_err(|err| Error::new(format!("metrics write failed: {err}")))
}

pub fn render() -> String {
    let mut output = String::new();
    push_metric(&mut output, "recurbuy_up", "gauge", "Process up", 1);
    push_metric(
        &mut output,
        "recurbuy_uptime_seconds",
        "gauge",
        "Process uptime in seconds",
        uptime_seconds().max(0) as u64,
    );
    for (name, help, counter) in [
        ("recurbuy_ticks_total", "Scheduler ticks", &TICKS_TOTAL),
        ("recurbuy_deposits_total", "Bank deposits made", &DEPOSITS_TOTAL),
        (
            "recurbuy_deposits_skipped_total",
            "Deposits skipped",
            &DEPOSITS_SKIPPED_TOTAL,
        ),
        (
            "recurbuy_orders_placed_total",
            "Market orders accepted",
            &ORDERS_PLACED_TOTAL,
        ),
        (
            "recurbuy_orders_failed_total",
            "Orders not placed",
            &ORDERS_FAILED_TOTAL,
        ),
        (
            "recurbuy_confirmations_sent_total",
            "Confirmation emails sent",
            &CONFIRMATIONS_SENT_TOTAL,
        ),
        (
            "recurbuy_confirmations_failed_total",
            "Purchases without confirmation",
            &CONFIRMATIONS_FAILED_TOTAL,
        ),
        (
            "recurbuy_missed_targets_total",
            "Deposit or purchase windows missed",
            &MISSED_TARGETS_TOTAL,
        ),
        ("recurbuy_errors_total", "Total errors", &ERRORS_TOTAL),
    ] {
        push_metric(&mut output, name, "counter", help, counter.load(Ordering::Relaxed));
    }
    push_metric(
        &mut output,
        "recurbuy_last_purchase_timestamp",
        "gauge",
        "Last accepted order (epoch seconds)",
        LAST_PURCHASE_TIMESTAMP.load(Ordering::Relaxed),
    );
    output
}

fn push_metric(target: &mut String, name: &str, kind: &str, help: &str, value: u64) {
    push_line(target, &format!("# HELP {name} {help}"));
    push_line(target, &format!("# TYPE {name} {kind}"));
    push_line(target, &format!("{name} {value}"));
}

fn now_epoch() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs() as i64)
        .unwrap_or(0)
}

fn uptime_seconds() -> i64 {
    let start = START_TIME.get().copied().unwrap_or_else(now_epoch);
    now_epoch().saturating_sub(start)
}

fn push_line(target: &mut String, line: &str) {
    target.push_str(line);
    target.push('\n');
}
