use crate::notify::{MailError, MailMessage, MailTransport};
use crate::{Error, ErrorKind, Result};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

/// Sends from the configured address to itself over implicit TLS.
pub struct SmtpMailer {
    transport: SmtpTransport,
    mailbox: Mailbox,
}

impl SmtpMailer {
    pub fn new(host: &str, port: u16, address: &str, password: &str) -> Result<Self> {
        let mailbox = address.trim().parse::<Mailbox>().map_err(|err| {
            Error::config(format!("invalid email address '{address}': {err}"))
        })?;
        let transport = SmtpTransport::relay(host)
            .map_err(|err| {
                Error::with_kind(ErrorKind::Mail, format!("smtp relay setup failed: {err}"))
            })?
            .port(port)
            .credentials(Credentials::new(
                address.trim().to_string(),
                password.to_string(),
            ))
            .build();
        Ok(Self { transport, mailbox })
    }
}

impl MailTransport for SmtpMailer {
    fn send(&self, message: &MailMessage) -> std::result::Result<(), MailError> {
        let email = Message::builder()
            .from(self.mailbox.clone())
            .to(self.mailbox.clone())
            .subject(message.subject.clone())
            .body(message.body.clone())
            .map_err(|err| MailError::Transport(format!("message build failed: {err}")))?;
        self.transport.send(&email).map(|_| ()).map_err(|err| {
            let code = err.status().map(|code| code.to_string());
            if code.as_deref().map(is_auth_failure).unwrap_or(false) {
                MailError::Authentication(err.to_string())
            } else {
                MailError::Transport(err.to_string())
            }
        })
    }
}

/// 530 (auth required), 534 (mechanism too weak), 535 (credentials rejected).
fn is_auth_failure(code: &str) -> bool {
    matches!(code, "530" | "534" | "535")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_codes_are_recognised() {
        assert!(is_auth_failure("535"));
        assert!(is_auth_failure("530"));
        assert!(!is_auth_failure("550"));
    }

    #[test]
    fn rejects_malformed_address() {
        let result = SmtpMailer::new("smtp.example.com", 465, "not an address", "pw");
        let err = result.err().expect("config error");
        assert_eq!(err.kind, ErrorKind::Config);
    }
}
