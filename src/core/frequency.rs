use crate::{Error, ErrorKind, Result};
use chrono::{Duration, Months, NaiveDateTime};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
}

impl Frequency {
    pub const ALL: [Frequency; 4] = [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Biweekly,
        Frequency::Monthly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Biweekly => "biweekly",
            Frequency::Monthly => "monthly",
        }
    }

    /// Moves `from` forward by one period. Monthly steps are calendar months,
    /// clamped to the last day of shorter months.
    pub fn advance(&self, from: NaiveDateTime) -> Result<NaiveDateTime> {
        let next = match self {
            Frequency::Daily => from.checked_add_signed(Duration::days(1)),
            Frequency::Weekly => from.checked_add_signed(Duration::days(7)),
            Frequency::Biweekly => from.checked_add_signed(Duration::days(14)),
            Frequency::Monthly => from.checked_add_months(Months::new(1)),
        };
        next.ok_or_else(|| Error::new(format!("{from} cannot be advanced {}", self.as_str())))
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "biweekly" => Ok(Frequency::Biweekly),
            "monthly" => Ok(Frequency::Monthly),
            other => Err(Error::with_kind(
                ErrorKind::InvalidFrequency,
                format!(
                    "invalid frequency '{other}': valid values are daily, weekly, biweekly, monthly"
                ),
            )),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
