pub mod bot;
pub mod clock;
pub mod frequency;
pub mod schedule;

use crate::broker::Broker;
use crate::config::Config;
use crate::core::bot::Bot;
use crate::core::clock::Clock;
use crate::input::OrderInputs;
use crate::notify::{MailTransport, Notifier};
use crate::Result;

/// Wires collected inputs and config into a bot that is ready to activate.
pub fn build_bot<B, M, C>(
    config: &Config,
    inputs: OrderInputs,
    broker: B,
    notifier: Option<Notifier<M>>,
    clock: C,
) -> Result<Bot<B, M, C>>
where
    B: Broker,
    M: MailTransport,
    C: Clock,
{
    let schedule = inputs.schedule()?;
    let mut bot = Bot::new(broker, notifier, clock, schedule, config.bot_settings()?);
    bot.set_orders(inputs.orders)?;
    Ok(bot)
}
