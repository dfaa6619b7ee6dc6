use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct Order {
    pub symbol: String,
    pub amount: f64,
}

/// Symbol to USD amount, in the order symbols were first added.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OrderBook {
    orders: Vec<Order>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: &str, amount: f64) -> Result<()> {
        let symbol = normalize_symbol(symbol)?;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(Error::invalid_argument(format!(
                "amount for {symbol} must be a positive number"
            )));
        }
        match self.orders.iter_mut().find(|order| order.symbol == symbol) {
            Some(existing) => existing.amount = amount,
            None => self.orders.push(Order { symbol, amount }),
        }
        Ok(())
    }

    pub fn from_pairs<S: AsRef<str>>(pairs: &[(S, f64)]) -> Result<Self> {
        let mut book = Self::new();
        for (symbol, amount) in pairs {
            book.insert(symbol.as_ref(), *amount)?;
        }
        Ok(book)
    }

    pub fn get(&self, symbol: &str) -> Option<f64> {
        let symbol = symbol.trim().to_uppercase();
        self.orders
            .iter()
            .find(|order| order.symbol == symbol)
            .map(|order| order.amount)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.get(symbol).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.orders.iter().map(|order| order.amount).sum()
    }
}

fn normalize_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(Error::invalid_argument("asset symbol cannot be empty"));
    }
    if !symbol.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(Error::invalid_argument(format!(
            "asset symbol '{symbol}' must be alphabetic"
        )));
    }
    Ok(symbol.to_uppercase())
}

#[derive(Clone, Debug, PartialEq)]
pub struct Wallet {
    pub name: String,
    pub currency: String,
    pub balance: f64,
}

/// One broker fill as reported, before rounding.
#[derive(Clone, Debug, PartialEq)]
pub struct Fill {
    pub product_id: String,
    pub fee: f64,
    pub usd_volume: f64,
    pub price: f64,
    pub size: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransactionRecord {
    pub asset: String,
    pub date: String,
    pub fee: f64,
    pub invested: f64,
    pub price: f64,
    pub quantity: String,
    pub total: f64,
}

impl TransactionRecord {
    pub const FIELDS: [&'static str; 7] =
        ["asset", "date", "fee", "invested", "price", "quantity", "total"];

    pub fn from_fill(asset: &str, date: &str, fill: &Fill) -> Self {
        let fee = round_cents(fill.fee);
        let invested = round_cents(fill.usd_volume);
        Self {
            asset: asset.to_string(),
            date: date.to_string(),
            fee,
            invested,
            price: round_cents(fill.price),
            quantity: fill.size.clone(),
            total: round_cents(fee + invested),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for key in Self::FIELDS {
            let present = match key {
                "asset" => !self.asset.trim().is_empty(),
                "date" => !self.date.trim().is_empty(),
                "fee" => self.fee.is_finite(),
                "invested" => self.invested.is_finite(),
                "price" => self.price.is_finite(),
                "quantity" => !self.quantity.trim().is_empty(),
                "total" => self.total.is_finite(),
                _ => true,
            };
            if !present {
                return Err(Error::missing_field(key));
            }
        }
        Ok(())
    }
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
