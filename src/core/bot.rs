use crate::app::metrics;
use crate::broker::Broker;
use crate::core::clock::{Clock, StopSignal};
use crate::core::schedule::{MissedTargets, Schedule};
use crate::models::OrderBook;
use crate::notify::{MailTransport, Notifier};
use crate::{Error, ErrorKind, Result};
use std::str::FromStr;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepositFailurePolicy {
    Abort,
    Continue,
}

impl FromStr for DepositFailurePolicy {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "abort" => Ok(DepositFailurePolicy::Abort),
            "continue" => Ok(DepositFailurePolicy::Continue),
            _ => Err(Error::config("deposit_failure must be abort or continue")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BotSettings {
    pub sandbox: bool,
    pub settlement_delay: Duration,
    pub poll_interval: Duration,
    pub deposit_failure: DepositFailurePolicy,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            sandbox: false,
            settlement_delay: Duration::from_secs(15),
            poll_interval: Duration::from_secs(1),
            deposit_failure: DepositFailurePolicy::Abort,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum OrderStatus {
    /// Placed and the confirmation email went out.
    Confirmed,
    /// Placed, but no confirmation could be sent.
    Unconfirmed(String),
    InsufficientFunds,
    Rejected(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderOutcome {
    pub asset: String,
    pub amount: f64,
    pub status: OrderStatus,
}

impl OrderOutcome {
    pub fn placed(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::Confirmed | OrderStatus::Unconfirmed(_)
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickOutcome {
    pub missed: MissedTargets,
    pub deposited: bool,
    pub purchased: bool,
    pub orders: Vec<OrderOutcome>,
}

pub struct Bot<B, M, C> {
    broker: B,
    notifier: Option<Notifier<M>>,
    clock: C,
    schedule: Schedule,
    orders: OrderBook,
    settings: BotSettings,
}

impl<B: Broker, M: MailTransport, C: Clock> Bot<B, M, C> {
    pub fn new(
        broker: B,
        notifier: Option<Notifier<M>>,
        clock: C,
        schedule: Schedule,
        settings: BotSettings,
    ) -> Self {
        Self {
            broker,
            notifier,
            clock,
            schedule,
            orders: OrderBook::new(),
            settings,
        }
    }

    /// Replaces the whole order book.
    pub fn set_orders(&mut self, orders: OrderBook) -> Result<()> {
        if orders.is_empty() {
            return Err(Error::invalid_argument("orders cannot be empty"));
        }
        self.orders = orders;
        Ok(())
    }

    pub fn orders(&self) -> &OrderBook {
        &self.orders
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn update_frequency(&mut self, value: &str) -> Result<()> {
        self.schedule.update_frequency(value)?;
        info!(frequency = %self.schedule.period(), "frequency updated");
        Ok(())
    }

    /// Runs until `stop` is raised. Any error returned here ends the run.
    pub fn activate(&mut self, stop: &StopSignal) -> Result<()> {
        if self.orders.is_empty() {
            return Err(Error::invalid_argument("orders must be set before activation"));
        }
        self.log_schedule();
        while !stop.is_stopped() {
            self.tick()?;
            if stop.is_stopped() {
                break;
            }
            self.clock.sleep(self.settings.poll_interval);
        }
        info!("bot stopped");
        Ok(())
    }

    /// Re-arms missed targets, then one deposit check and one purchase check.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        metrics::inc_tick();
        let mut outcome = TickOutcome {
            missed: self.skip_missed()?,
            ..TickOutcome::default()
        };

        if self.schedule.is_time_to_deposit(self.clock.now()) {
            self.run_deposit()?;
            outcome.deposited = true;
        }

        if self.schedule.is_time_to_purchase(self.clock.now()) {
            outcome.orders = self.run_purchase()?;
            outcome.purchased = true;
            self.log_schedule();
        }

        if outcome.deposited || outcome.purchased || outcome.missed.any() {
            if let Err(err) = metrics::write_if_configured() {
                warn!(error = %err.message, "metrics write failed");
            }
        }
        Ok(outcome)
    }

    fn skip_missed(&mut self) -> Result<MissedTargets> {
        let now = self.clock.now();
        let missed_deposit_at = self.schedule.next_deposit_at();
        let missed_purchase_at = self.schedule.next_purchase_at();
        let missed = self.schedule.skip_missed(now)?;
        if missed.deposits > 0 {
            metrics::inc_missed_target();
            warn!(
                missed_at = %missed_deposit_at,
                periods = missed.deposits,
                next_deposit_at = %self.schedule.next_deposit_at(),
                "deposit window missed"
            );
        }
        if missed.purchases > 0 {
            metrics::inc_missed_target();
            warn!(
                missed_at = %missed_purchase_at,
                periods = missed.purchases,
                next_purchase_at = %self.schedule.next_purchase_at(),
                "purchase window missed"
            );
        }
        Ok(missed)
    }

    fn run_deposit(&mut self) -> Result<()> {
        let amount = self.orders.total();
        if self.settings.sandbox {
            warn!(amount, "bank deposit is not supported in sandbox mode, skipping");
            metrics::inc_deposit_skipped();
        } else if self.orders.is_empty() {
            warn!("no orders set, skipping deposit");
            metrics::inc_deposit_skipped();
        } else {
            info!(amount, "depositing from bank");
            match self.broker.deposit_from_bank(amount) {
                Ok(()) => metrics::inc_deposit(),
                Err(err) => {
                    metrics::inc_error();
                    error!(amount, error = %err.message, "deposit failed");
                    if self.settings.deposit_failure == DepositFailurePolicy::Abort {
                        return Err(err);
                    }
                }
            }
        }
        self.schedule.advance_deposit()?;
        info!(next_deposit_at = %self.schedule.next_deposit_at(), "deposit timer re-armed");
        Ok(())
    }

    fn run_purchase(&mut self) -> Result<Vec<OrderOutcome>> {
        let date = self.schedule.purchase_date();
        let mut outcomes = Vec::with_capacity(self.orders.len());
        for order in self.orders.iter() {
            info!(asset = %order.symbol, amount = order.amount, "placing order");
            let status = self.purchase_one(&order.symbol, order.amount, &date)?;
            outcomes.push(OrderOutcome {
                asset: order.symbol.clone(),
                amount: order.amount,
                status,
            });
        }
        self.schedule.advance_purchase()?;
        Ok(outcomes)
    }

    fn purchase_one(&self, asset: &str, amount: f64, date: &str) -> Result<OrderStatus> {
        if self.settings.sandbox {
            warn!(asset = %asset, "funds check is not supported in sandbox mode, skipping");
        } else {
            // A failed balance query aborts the run; a `false` answer skips the order.
            if !self.broker.are_sufficient_funds_available(amount)? {
                metrics::inc_order_failed();
                error!(asset = %asset, amount, "insufficient funds for order");
                return Ok(OrderStatus::InsufficientFunds);
            }
        }

        if let Err(err) = self.broker.place_market_order(asset, amount) {
            metrics::inc_order_failed();
            metrics::inc_error();
            error!(asset = %asset, amount, error = %err.message, "order failed");
            return Ok(OrderStatus::Rejected(err.message));
        }
        metrics::inc_order_placed();

        self.clock.sleep(self.settings.settlement_delay);
        Ok(self.confirm(asset, date))
    }

    fn confirm(&self, asset: &str, date: &str) -> OrderStatus {
        let record = match self.broker.get_fill_details(asset, date) {
            Ok(record) => record,
            Err(err) => {
                metrics::inc_confirmation_failed();
                if err.is(ErrorKind::NoFillsFound) {
                    error!(asset = %asset, date = %date, "fill not available yet, email could not be sent");
                } else {
                    error!(asset = %asset, error = %err.message, "fill lookup failed, email could not be sent");
                }
                return OrderStatus::Unconfirmed(err.message);
            }
        };

        let notifier = match &self.notifier {
            Some(notifier) => notifier,
            None => {
                info!(asset = %asset, total = record.total, "notifications disabled, purchase recorded");
                return OrderStatus::Unconfirmed("notifications disabled".to_string());
            }
        };

        match notifier.send(&record) {
            Ok(true) => {
                metrics::inc_confirmation_sent();
                info!(asset = %asset, total = record.total, "email confirmation sent");
                OrderStatus::Confirmed
            }
            Ok(false) => {
                metrics::inc_confirmation_failed();
                error!(asset = %asset, "email confirmation rejected by mail provider");
                OrderStatus::Unconfirmed("mail authentication failed".to_string())
            }
            Err(err) => {
                metrics::inc_confirmation_failed();
                error!(asset = %asset, error = %err.message, "email could not be sent");
                OrderStatus::Unconfirmed(err.message)
            }
        }
    }

    fn log_schedule(&self) {
        info!(next_deposit_at = %self.schedule.next_deposit_at(), "next deposit");
        info!(next_purchase_at = %self.schedule.next_purchase_at(), "next purchase");
    }
}
