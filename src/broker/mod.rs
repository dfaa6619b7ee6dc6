pub mod coinbase;
pub mod rest;
pub mod signer;

use crate::models::TransactionRecord;
use crate::{Error, ErrorKind, Result};

pub trait Broker {
    /// Identifier of the first linked payment method.
    fn get_payment_method(&self) -> Result<String>;

    /// Instructs a deposit from the linked bank. Acceptance does not mean the
    /// funds are usable yet.
    fn deposit_from_bank(&self, amount: f64) -> Result<()>;

    /// `Ok(false)` is a business answer; a failed balance query is an `Err`.
    fn are_sufficient_funds_available(&self, amount: f64) -> Result<bool>;

    /// Market buy of `<asset>-USD` funded with `usd_amount`. Fills are not
    /// queryable until the settlement delay has passed.
    fn place_market_order(&self, asset: &str, usd_amount: f64) -> Result<bool>;

    /// Most recent fill for `<asset>-USD` since `date` (`YYYY-MM-DD`), or
    /// `None` when the broker has not materialized it yet.
    fn find_fill_details(&self, asset: &str, date: &str) -> Result<Option<TransactionRecord>>;

    fn currency_exists(&self, symbol: &str) -> Result<bool>;

    fn get_fill_details(&self, asset: &str, date: &str) -> Result<TransactionRecord> {
        self.find_fill_details(asset, date)?.ok_or_else(|| {
            Error::with_kind(
                ErrorKind::NoFillsFound,
                format!("no fills found for {asset}-USD since {date}"),
            )
        })
    }
}

impl<T: Broker + ?Sized> Broker for &T {
    fn get_payment_method(&self) -> Result<String> {
        (**self).get_payment_method()
    }

    fn deposit_from_bank(&self, amount: f64) -> Result<()> {
        (**self).deposit_from_bank(amount)
    }

    fn are_sufficient_funds_available(&self, amount: f64) -> Result<bool> {
        (**self).are_sufficient_funds_available(amount)
    }

    fn place_market_order(&self, asset: &str, usd_amount: f64) -> Result<bool> {
        (**self).place_market_order(asset, usd_amount)
    }

    fn find_fill_details(&self, asset: &str, date: &str) -> Result<Option<TransactionRecord>> {
        (**self).find_fill_details(asset, date)
    }

    fn currency_exists(&self, symbol: &str) -> Result<bool> {
        (**self).currency_exists(symbol)
    }
}

pub fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::invalid_argument(format!(
            "amount must be a positive number, got {amount}"
        )));
    }
    Ok(())
}

/// Assets end up in request paths and signed query strings unescaped, so only
/// ASCII letters are accepted.
pub fn validate_asset(asset: &str) -> Result<()> {
    let asset = asset.trim();
    if asset.is_empty() {
        return Err(Error::invalid_argument("asset cannot be empty"));
    }
    if !asset.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(Error::invalid_argument(format!(
            "asset '{asset}' must be alphabetic"
        )));
    }
    Ok(())
}

pub fn validate_date(date: &str) -> Result<()> {
    if date.trim().is_empty() {
        return Err(Error::invalid_argument("date cannot be empty"));
    }
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| Error::invalid_argument(format!("date '{date}' is not in format YYYY-MM-DD")))
}

pub fn product_id(asset: &str) -> String {
    format!("{}-USD", asset.trim().to_uppercase())
}
