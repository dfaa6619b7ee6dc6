use crate::core::clock::Clock;
use crate::core::frequency::Frequency;
use crate::input::validate::{
    check_crypto, check_date_string, check_dollar_amount, check_frequency, check_start,
    check_time_string,
};
use crate::input::InputCollector;
use crate::models::OrderBook;
use crate::{Error, Result};
use std::io::{BufRead, Write};

/// Interactive collector. Every question is re-asked until the answer is valid.
pub struct PromptInputCollector<R, W, C> {
    reader: R,
    writer: W,
    clock: C,
}

impl<R: BufRead, W: Write, C: Clock> PromptInputCollector<R, W, C> {
    pub fn new(reader: R, writer: W, clock: C) -> Self {
        Self {
            reader,
            writer,
            clock,
        }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.writer, "{question}")
            .and_then(|_| self.writer.flush())
            .map_err(|err| Error::new(format!("failed to write prompt: {err}")))?;
        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .map_err(|err| Error::new(format!("failed to read answer: {err}")))?;
        if read == 0 {
            return Err(Error::invalid_argument("input closed before all answers were given"));
        }
        Ok(line.trim().to_string())
    }

    fn ask_until<T>(&mut self, question: &str, check: impl Fn(&str) -> Result<T>) -> Result<T> {
        loop {
            let answer = self.ask(question)?;
            match check(&answer) {
                Ok(value) => return Ok(value),
                Err(err) => self.complain(&err)?,
            }
        }
    }

    fn ask_yes_no(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(question)?;
        Ok(!answer.to_lowercase().starts_with('n'))
    }

    fn complain(&mut self, err: &Error) -> Result<()> {
        writeln!(self.writer, "error: {}", err.message)
            .map_err(|err| Error::new(format!("failed to write prompt: {err}")))
    }
}

impl<R: BufRead, W: Write, C: Clock> InputCollector for PromptInputCollector<R, W, C> {
    fn get_start_date(&mut self) -> Result<String> {
        self.ask_until("Enter the start date (YYYY-MM-DD): ", |answer| {
            check_date_string(answer).map(|_| answer.to_string())
        })
    }

    fn get_start_time(&mut self) -> Result<String> {
        self.ask_until("Enter the purchase time (HH:MM AM|PM): ", |answer| {
            check_time_string(answer).map(|_| answer.to_string())
        })
    }

    fn get_start_datetime(&mut self) -> Result<(String, String)> {
        loop {
            let date = self.get_start_date()?;
            let time = self.get_start_time()?;
            match check_start(&date, &time, self.clock.now()) {
                Ok(_) => return Ok((date, time)),
                Err(err) => self.complain(&err)?,
            }
        }
    }

    fn get_frequency(&mut self) -> Result<Frequency> {
        self.ask_until(
            "How often should purchases run? (daily, weekly, biweekly, monthly): ",
            check_frequency,
        )
    }

    fn get_orders(&mut self) -> Result<OrderBook> {
        let mut orders = OrderBook::new();
        loop {
            let symbol = self.ask_until("Enter the crypto symbol to purchase: ", check_crypto)?;

            let overwrite = if orders.contains(&symbol) {
                self.ask_yes_no(&format!(
                    "There is already an order for {symbol}. Overwrite it? Y/N "
                ))?
            } else {
                true
            };

            if overwrite {
                let amount =
                    self.ask_until("Enter the amount in USD to spend: ", check_dollar_amount)?;
                orders.insert(&symbol, amount)?;
            }

            if !self.ask_yes_no("Add another order? Y/N ")? {
                if orders.is_empty() {
                    self.complain(&Error::invalid_argument("at least one order is required"))?;
                    continue;
                }
                return Ok(orders);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use chrono::NaiveDate;
    use std::io::Cursor;

    fn clock() -> ManualClock {
        ManualClock::new(
            NaiveDate::from_ymd_opt(2022, 1, 1)
                .and_then(|date| date.and_hms_opt(8, 0, 0))
                .expect("datetime"),
        )
    }

    #[test]
    fn reasks_until_valid() {
        let input = Cursor::new("tomorrow\n2022-01-01\n10:00\n10:00 AM\n");
        let mut collector = PromptInputCollector::new(input, Vec::new(), clock());
        let (date, time) = collector.get_start_datetime().expect("datetime");
        assert_eq!(date, "2022-01-01");
        assert_eq!(time, "10:00 AM");
        let output = String::from_utf8(collector.into_writer()).expect("utf8");
        assert_eq!(output.matches("error:").count(), 2);
    }

    #[test]
    fn closed_input_is_an_error() {
        let mut collector = PromptInputCollector::new(Cursor::new(""), Vec::new(), clock());
        assert!(collector.get_frequency().is_err());
    }
}
