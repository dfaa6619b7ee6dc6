pub mod prompt;
pub mod validate;
pub mod yaml;

use crate::broker::Broker;
use crate::core::frequency::Frequency;
use crate::core::schedule::Schedule;
use crate::models::OrderBook;
use crate::{Error, Result};
use tracing::info;

pub use prompt::PromptInputCollector;
pub use yaml::YamlInputCollector;

/// Everything needed to arm the bot.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderInputs {
    pub start_date: String,
    pub start_time: String,
    pub frequency: Frequency,
    pub orders: OrderBook,
}

impl OrderInputs {
    pub fn schedule(&self) -> Result<Schedule> {
        Schedule::from_start(self.frequency, &self.start_date, &self.start_time)
    }
}

pub trait InputCollector {
    fn get_start_date(&mut self) -> Result<String>;

    fn get_start_time(&mut self) -> Result<String>;

    /// Date and time that together form a valid first purchase.
    fn get_start_datetime(&mut self) -> Result<(String, String)>;

    fn get_frequency(&mut self) -> Result<Frequency>;

    fn get_orders(&mut self) -> Result<OrderBook>;

    fn collect_inputs(&mut self) -> Result<OrderInputs> {
        let (start_date, start_time) = self.get_start_datetime()?;
        let frequency = self.get_frequency()?;
        let orders = self.get_orders()?;
        Ok(OrderInputs {
            start_date,
            start_time,
            frequency,
            orders,
        })
    }
}

/// Fails on the first symbol the broker does not list.
pub fn verify_currencies<B: Broker + ?Sized>(broker: &B, orders: &OrderBook) -> Result<()> {
    for order in orders.iter() {
        if !broker.currency_exists(&order.symbol)? {
            return Err(Error::invalid_argument(format!(
                "crypto symbol '{}' is not supported by the broker",
                order.symbol
            )));
        }
        info!(asset = %order.symbol, "currency verified");
    }
    Ok(())
}
