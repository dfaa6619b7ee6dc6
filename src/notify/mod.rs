pub mod smtp;

use crate::models::TransactionRecord;
use crate::{Error, ErrorKind, Result};
use std::fmt;
use tracing::warn;

#[derive(Clone, Debug, PartialEq)]
pub struct MailMessage {
    pub subject: String,
    pub body: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MailError {
    Authentication(String),
    Transport(String),
}

impl fmt::Display for MailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MailError::Authentication(message) => write!(f, "mail authentication failed: {message}"),
            MailError::Transport(message) => write!(f, "mail transport failed: {message}"),
        }
    }
}

pub trait MailTransport {
    fn send(&self, message: &MailMessage) -> std::result::Result<(), MailError>;
}

impl<T: MailTransport + ?Sized> MailTransport for &T {
    fn send(&self, message: &MailMessage) -> std::result::Result<(), MailError> {
        (**self).send(message)
    }
}

pub struct Notifier<M> {
    transport: M,
}

impl<M: MailTransport> Notifier<M> {
    pub fn new(transport: M) -> Self {
        Self { transport }
    }

    /// `Ok(false)` when the mail provider rejects the credentials. The trade has
    /// already happened by the time this runs, so callers must not abort on it.
    pub fn send(&self, record: &TransactionRecord) -> Result<bool> {
        let message = render_confirmation(record)?;
        match self.transport.send(&message) {
            Ok(()) => Ok(true),
            Err(MailError::Authentication(reason)) => {
                warn!(reason = %reason, "email credentials are not valid");
                Ok(false)
            }
            Err(err) => Err(Error::with_kind(ErrorKind::Mail, err.to_string())),
        }
    }
}

pub fn render_confirmation(record: &TransactionRecord) -> Result<MailMessage> {
    record.validate()?;
    let subject = format!(
        "Your Purchase of ${:.2} of {} Was Successful!",
        record.total, record.asset
    );
    let body = format!(
        "Hello,\n\n\
         You successfully placed your order! Please see below details:\n\n\
         Amount Purchased: {quantity} {asset}\n\
         Purchase Price: ${price:.2}\n\
         Total Amount: ${total:.2}\n\
         Amount Invested: ${invested:.2}\n\
         Fees: ${fee:.2}\n\
         Date: {date}\n",
        quantity = record.quantity,
        asset = record.asset,
        price = record.price,
        total = record.total,
        invested = record.invested,
        fee = record.fee,
        date = record.date,
    );
    Ok(MailMessage { subject, body })
}
