use crate::core::frequency::Frequency;
use crate::core::schedule::{parse_start, DATE_FORMAT, TIME_FORMAT};
use crate::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Minimum distance between "now" and the first purchase.
pub const MIN_START_LEAD_SECS: i64 = 60;

pub fn check_date_string(value: &str) -> Result<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::invalid_argument("start date cannot be empty"));
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(|_| ())
        .map_err(|_| Error::invalid_argument(format!("date '{value}' is not in format YYYY-MM-DD")))
}

pub fn check_time_string(value: &str) -> Result<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::invalid_argument("start time cannot be empty"));
    }
    let invalid = || Error::invalid_argument(format!("time '{value}' is not in format HH:MM AM|PM"));
    NaiveTime::parse_from_str(value, TIME_FORMAT).map_err(|_| invalid())?;
    // chrono accepts "9:5 AM"; minutes must be written with two digits.
    let minutes = value
        .split_whitespace()
        .next()
        .and_then(|clock| clock.split(':').nth(1))
        .ok_or_else(invalid)?;
    if minutes.len() != 2 {
        return Err(invalid());
    }
    Ok(())
}

pub fn check_start(date: &str, time: &str, now: NaiveDateTime) -> Result<NaiveDateTime> {
    check_date_string(date)?;
    check_time_string(time)?;
    let start = parse_start(date, time)?;
    if start < now {
        return Err(Error::invalid_argument(format!(
            "start {} {} is in the past",
            date.trim(),
            time.trim()
        )));
    }
    if (start - now).num_seconds() < MIN_START_LEAD_SECS {
        return Err(Error::invalid_argument(format!(
            "start {} {} must be at least {MIN_START_LEAD_SECS} seconds away",
            date.trim(),
            time.trim()
        )));
    }
    Ok(start)
}

pub fn check_frequency(value: &str) -> Result<Frequency> {
    if value.trim().is_empty() {
        return Err(Error::invalid_argument("frequency cannot be empty"));
    }
    value.parse::<Frequency>()
}

pub fn check_crypto(value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::invalid_argument("crypto symbol cannot be empty"));
    }
    if !value.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(Error::invalid_argument(format!(
            "crypto symbol '{value}' must be alphabetic"
        )));
    }
    Ok(value.to_uppercase())
}

pub fn check_dollar_amount(value: &str) -> Result<f64> {
    let value = value.trim().trim_start_matches('$');
    let amount = value
        .parse::<f64>()
        .map_err(|_| Error::invalid_argument(format!("'{value}' is not a dollar amount")))?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::invalid_argument(format!(
            "dollar amount {value} must be greater than zero"
        )));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M:%S")
            .expect("datetime")
    }

    #[test]
    fn date_strings() {
        assert!(check_date_string("2022-01-01").is_ok());
        assert!(check_date_string("").is_err());
        assert!(check_date_string("01-01-2022").is_err());
        assert!(check_date_string("2022-13-01").is_err());
    }

    #[test]
    fn time_strings_need_two_digit_minutes() {
        assert!(check_time_string("10:00 AM").is_ok());
        assert!(check_time_string("9:05 pm").is_ok());
        assert!(check_time_string("9:5 PM").is_err());
        assert!(check_time_string("13:00 PM").is_err());
        assert!(check_time_string("10:00").is_err());
    }

    #[test]
    fn start_must_be_a_minute_ahead() {
        let now = at("2022-01-01", "09:58:30");
        assert!(check_start("2022-01-01", "10:00 AM", now).is_ok());
        assert!(check_start("2022-01-01", "09:59 AM", now).is_err());
        assert!(check_start("2021-12-31", "10:00 AM", now).is_err());
    }

    #[test]
    fn frequency_is_case_insensitive() {
        assert!(check_frequency("Weekly").is_ok());
        assert!(check_frequency("MONTHLY").is_ok());
        assert!(check_frequency("annually").is_err());
        assert!(check_frequency("").is_err());
    }

    #[test]
    fn crypto_and_amounts() {
        assert!(check_crypto("btc").is_ok());
        assert!(check_crypto("BTC-USD").is_err());
        assert!(check_crypto(" ").is_err());
        assert!(check_dollar_amount("20").is_ok());
        assert!(check_dollar_amount("$12.50").is_ok());
        assert!(check_dollar_amount("0").is_err());
        assert!(check_dollar_amount("-5").is_err());
        assert!(check_dollar_amount("ten").is_err());
        assert!(check_dollar_amount("NaN").is_err());
    }
}
