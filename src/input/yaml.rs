use crate::core::frequency::Frequency;
use crate::input::validate::{
    check_crypto, check_date_string, check_dollar_amount, check_frequency, check_start,
    check_time_string,
};
use crate::input::InputCollector;
use crate::models::OrderBook;
use crate::{Error, Result};
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_yaml::Value;
use std::fs;

#[derive(Clone, Debug, Default, Deserialize)]
struct OrdersFile {
    start_date: Option<Value>,
    start_time: Option<Value>,
    frequency: Option<Value>,
    #[serde(default)]
    crypto: Vec<Value>,
    #[serde(default)]
    amount_usd: Vec<Value>,
}

/// Reads the schedule and orders from an `orders.yaml` document.
///
/// ```yaml
/// start_date: "2022-01-01"
/// start_time: "10:00 AM"
/// frequency: weekly
/// crypto: [BTC, ETH]
/// amount_usd: [20, 30]
/// ```
#[derive(Clone, Debug)]
pub struct YamlInputCollector {
    file: OrdersFile,
    now: NaiveDateTime,
}

impl YamlInputCollector {
    /// `now` anchors the "start is in the future" check.
    pub fn from_path(path: &str, now: NaiveDateTime) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|err| Error::invalid_argument(format!("failed to read {path}: {err}")))?;
        Self::parse(&content, now)
    }

    pub fn parse(content: &str, now: NaiveDateTime) -> Result<Self> {
        let file: OrdersFile = serde_yaml::from_str(content)
            .map_err(|err| Error::invalid_argument(format!("failed to parse orders yaml: {err}")))?;
        Ok(Self { file, now })
    }

    fn required(value: &Option<Value>, key: &str) -> Result<String> {
        let value = value
            .as_ref()
            .ok_or_else(|| Error::invalid_argument(format!("orders yaml is missing '{key}'")))?;
        scalar(value).ok_or_else(|| {
            Error::invalid_argument(format!("'{key}' in orders yaml must be a single value"))
        })
    }
}

impl InputCollector for YamlInputCollector {
    fn get_start_date(&mut self) -> Result<String> {
        let value = Self::required(&self.file.start_date, "start_date")?;
        check_date_string(&value)?;
        Ok(value)
    }

    fn get_start_time(&mut self) -> Result<String> {
        let value = Self::required(&self.file.start_time, "start_time")?;
        check_time_string(&value)?;
        Ok(value)
    }

    fn get_start_datetime(&mut self) -> Result<(String, String)> {
        let date = self.get_start_date()?;
        let time = self.get_start_time()?;
        check_start(&date, &time, self.now)?;
        Ok((date, time))
    }

    fn get_frequency(&mut self) -> Result<Frequency> {
        let value = Self::required(&self.file.frequency, "frequency")?;
        check_frequency(&value)
    }

    fn get_orders(&mut self) -> Result<OrderBook> {
        if self.file.crypto.len() != self.file.amount_usd.len() {
            return Err(Error::invalid_argument(format!(
                "{} crypto symbols but {} dollar amounts",
                self.file.crypto.len(),
                self.file.amount_usd.len()
            )));
        }
        if self.file.crypto.is_empty() {
            return Err(Error::invalid_argument("orders yaml lists no orders"));
        }

        let mut orders = OrderBook::new();
        for (crypto, amount) in self.file.crypto.iter().zip(&self.file.amount_usd) {
            let crypto = scalar(crypto)
                .ok_or_else(|| Error::invalid_argument("crypto entries must be symbols"))?;
            let amount = scalar(amount)
                .ok_or_else(|| Error::invalid_argument("amount_usd entries must be numbers"))?;
            let symbol = check_crypto(&crypto)?;
            let amount = check_dollar_amount(&amount)?;
            orders.insert(&symbol, amount)?;
        }
        Ok(orders)
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
