use crate::core::frequency::Frequency;
use crate::{Error, Result};
use chrono::{Duration, NaiveDateTime, Timelike};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%I:%M %p";

/// Deposits fire this long before the purchase so funds can settle.
pub const DEPOSIT_LEAD_MINUTES: i64 = 1;

/// Two timers, each re-armed by one period right after it fires. The deposit
/// target is always derived from the purchase it funds, so calendar clamping
/// never moves it past that purchase.
#[derive(Clone, Debug, PartialEq)]
pub struct Schedule {
    period: Frequency,
    next_deposit_at: NaiveDateTime,
    next_purchase_at: NaiveDateTime,
}

impl Schedule {
    pub fn new(period: Frequency, first_purchase_at: NaiveDateTime) -> Self {
        let first_purchase_at = truncate_to_minute(first_purchase_at);
        Self {
            period,
            next_deposit_at: first_purchase_at - Duration::minutes(DEPOSIT_LEAD_MINUTES),
            next_purchase_at: first_purchase_at,
        }
    }

    pub fn from_start(period: Frequency, date: &str, time: &str) -> Result<Self> {
        Ok(Self::new(period, parse_start(date, time)?))
    }

    pub fn period(&self) -> Frequency {
        self.period
    }

    pub fn next_deposit_at(&self) -> NaiveDateTime {
        self.next_deposit_at
    }

    pub fn next_purchase_at(&self) -> NaiveDateTime {
        self.next_purchase_at
    }

    /// Date used to look up fills for the pending purchase.
    pub fn purchase_date(&self) -> String {
        self.next_purchase_at.format(DATE_FORMAT).to_string()
    }

    /// True only during the exact minute of the target.
    pub fn is_time_to_deposit(&self, now: NaiveDateTime) -> bool {
        truncate_to_minute(now) == self.next_deposit_at
    }

    pub fn is_time_to_purchase(&self, now: NaiveDateTime) -> bool {
        truncate_to_minute(now) == self.next_purchase_at
    }

    /// Purchase that the pending deposit funds.
    pub fn funded_purchase_at(&self) -> NaiveDateTime {
        self.next_deposit_at + Duration::minutes(DEPOSIT_LEAD_MINUTES)
    }

    pub fn advance_deposit(&mut self) -> Result<()> {
        let next_funded = self.period.advance(self.funded_purchase_at())?;
        self.next_deposit_at = next_funded - Duration::minutes(DEPOSIT_LEAD_MINUTES);
        Ok(())
    }

    pub fn advance_purchase(&mut self) -> Result<()> {
        self.next_purchase_at = self.period.advance(self.next_purchase_at)?;
        Ok(())
    }

    /// Re-arms every target whose minute has already passed. A missed target
    /// never fires late; it moves to the first period still ahead of `now`.
    pub fn skip_missed(&mut self, now: NaiveDateTime) -> Result<MissedTargets> {
        let now = truncate_to_minute(now);
        let mut missed = MissedTargets::default();
        while self.next_deposit_at < now {
            self.advance_deposit()?;
            missed.deposits += 1;
        }
        while self.next_purchase_at < now {
            self.advance_purchase()?;
            missed.purchases += 1;
        }
        Ok(missed)
    }

    /// Applies to future advances only; pending targets are left alone.
    pub fn set_period(&mut self, period: Frequency) {
        self.period = period;
    }

    pub fn update_frequency(&mut self, value: &str) -> Result<()> {
        let period = value.parse::<Frequency>()?;
        self.set_period(period);
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MissedTargets {
    pub deposits: u32,
    pub purchases: u32,
}

impl MissedTargets {
    pub fn any(&self) -> bool {
        self.deposits > 0 || self.purchases > 0
    }
}

pub fn parse_start(date: &str, time: &str) -> Result<NaiveDateTime> {
    if date.trim().is_empty() {
        return Err(Error::invalid_argument("start date cannot be empty"));
    }
    if time.trim().is_empty() {
        return Err(Error::invalid_argument("start time cannot be empty"));
    }
    let combined = format!("{} {}", date.trim(), time.trim());
    NaiveDateTime::parse_from_str(&combined, &format!("{DATE_FORMAT} {TIME_FORMAT}")).map_err(
        |_| {
            Error::invalid_argument(format!(
                "'{combined}' is not in format YYYY-MM-DD HH:MM AM|PM"
            ))
        },
    )
}

pub fn truncate_to_minute(value: NaiveDateTime) -> NaiveDateTime {
    value
        .with_second(0)
        .and_then(|value| value.with_nanosecond(0))
        .unwrap_or(value)
}
