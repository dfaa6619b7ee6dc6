use crate::broker::coinbase::{PRODUCTION_URL, SANDBOX_URL};
use crate::core::bot::{BotSettings, DepositFailurePolicy};
use crate::{Error, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct BrokerConfig {
    pub base_url: String,
    pub sandbox_url: String,
    pub sandbox: bool,
    pub timeout_secs: u64,
    pub settlement_delay_secs: u64,
    /// Clock skew the broker tolerates on signed requests. Informational only.
    pub timestamp_tolerance_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ScheduleConfig {
    pub poll_interval_secs: u64,
    pub deposit_failure: String,
}

#[derive(Clone, Debug)]
pub struct MailConfig {
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
}

#[derive(Clone, Debug)]
pub struct InputConfig {
    pub yaml_path: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub broker: BrokerConfig,
    pub schedule: ScheduleConfig,
    pub mail: MailConfig,
    pub input: InputConfig,
}

#[derive(Clone, Debug, Deserialize)]
struct BrokerConfigFile {
    base_url: Option<String>,
    sandbox_url: Option<String>,
    sandbox: Option<bool>,
    timeout_secs: Option<u64>,
    settlement_delay_secs: Option<u64>,
    timestamp_tolerance_secs: Option<u64>,
}

#[derive(Clone, Debug, Deserialize)]
struct ScheduleConfigFile {
    poll_interval_secs: Option<u64>,
    deposit_failure: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
struct MailConfigFile {
    enabled: Option<bool>,
    smtp_host: Option<String>,
    smtp_port: Option<u16>,
}

#[derive(Clone, Debug, Deserialize)]
struct InputConfigFile {
    yaml_path: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
struct ConfigFile {
    broker: Option<BrokerConfigFile>,
    schedule: Option<ScheduleConfigFile>,
    mail: Option<MailConfigFile>,
    input: Option<InputConfigFile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            broker: BrokerConfig {
                base_url: PRODUCTION_URL.to_string(),
                sandbox_url: SANDBOX_URL.to_string(),
                sandbox: false,
                timeout_secs: 30,
                settlement_delay_secs: 15,
                timestamp_tolerance_secs: 30,
            },
            schedule: ScheduleConfig {
                poll_interval_secs: 1,
                deposit_failure: "abort".to_string(),
            },
            mail: MailConfig {
                enabled: true,
                smtp_host: "smtp.gmail.com".to_string(),
                smtp_port: 465,
            },
            input: InputConfig {
                yaml_path: "orders.yaml".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|err| Error::config(format!("failed to read config: {err}")))?;
        let mut config = Config::parse(&content)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Like `load`, but a missing file means defaults plus env overrides.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            return Config::load(path);
        }
        let mut config = Config::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)
            .map_err(|err| Error::config(format!("failed to parse config: {err}")))?;
        Ok(Config::from_file(file))
    }

    fn from_file(file: ConfigFile) -> Self {
        let mut config = Config::default();

        if let Some(broker) = file.broker {
            if let Some(value) = broker.base_url {
                config.broker.base_url = value;
            }
            if let Some(value) = broker.sandbox_url {
                config.broker.sandbox_url = value;
            }
            if let Some(value) = broker.sandbox {
                config.broker.sandbox = value;
            }
            if let Some(value) = broker.timeout_secs {
                config.broker.timeout_secs = value;
            }
            if let Some(value) = broker.settlement_delay_secs {
                config.broker.settlement_delay_secs = value;
            }
            if let Some(value) = broker.timestamp_tolerance_secs {
                config.broker.timestamp_tolerance_secs = value;
            }
        }

        if let Some(schedule) = file.schedule {
            if let Some(value) = schedule.poll_interval_secs {
                config.schedule.poll_interval_secs = value;
            }
            if let Some(value) = schedule.deposit_failure {
                config.schedule.deposit_failure = value;
            }
        }

        if let Some(mail) = file.mail {
            if let Some(value) = mail.enabled {
                config.mail.enabled = value;
            }
            if let Some(value) = mail.smtp_host {
                config.mail.smtp_host = value;
            }
            if let Some(value) = mail.smtp_port {
                config.mail.smtp_port = value;
            }
        }

        if let Some(input) = file.input {
            if let Some(value) = input.yaml_path {
                config.input.yaml_path = value;
            }
        }

        config
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = read_string_env("RECURBUY_BROKER_BASE_URL")? {
            self.broker.base_url = value;
        }
        if let Some(value) = read_bool_env("RECURBUY_SANDBOX")? {
            self.broker.sandbox = value;
        }
        if let Some(value) = read_u64_env("RECURBUY_HTTP_TIMEOUT_SECS")? {
            self.broker.timeout_secs = value;
        }
        if let Some(value) = read_u64_env("RECURBUY_SETTLEMENT_DELAY_SECS")? {
            self.broker.settlement_delay_secs = value;
        }
        if let Some(value) = read_u64_env("RECURBUY_POLL_INTERVAL_SECS")? {
            self.schedule.poll_interval_secs = value;
        }
        if let Some(value) = read_string_env("RECURBUY_DEPOSIT_FAILURE")? {
            self.schedule.deposit_failure = value;
        }
        if let Some(value) = read_bool_env("RECURBUY_MAIL_ENABLED")? {
            self.mail.enabled = value;
        }
        if let Some(value) = read_string_env("RECURBUY_SMTP_HOST")? {
            self.mail.smtp_host = value;
        }
        if let Some(value) = read_u64_env("RECURBUY_SMTP_PORT")? {
            self.mail.smtp_port = u16::try_from(value)
                .map_err(|_| Error::config("RECURBUY_SMTP_PORT must fit in u16"))?;
        }
        if let Some(value) = read_string_env("RECURBUY_ORDERS_YAML")? {
            self.input.yaml_path = value;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.broker.base_url.trim().is_empty() {
            return Err(Error::config("broker.base_url must be set"));
        }
        if self.broker.sandbox && self.broker.sandbox_url.trim().is_empty() {
            return Err(Error::config("broker.sandbox_url must be set in sandbox mode"));
        }
        if self.broker.timeout_secs == 0 {
            return Err(Error::config("broker.timeout_secs must be positive"));
        }
        // The exact-minute trigger is only observed if the loop polls well inside a minute.
        if !(1..=30).contains(&self.schedule.poll_interval_secs) {
            return Err(Error::config("schedule.poll_interval_secs must be in [1, 30]"));
        }
        self.deposit_failure_policy()?;
        if self.mail.enabled {
            if self.mail.smtp_host.trim().is_empty() {
                return Err(Error::config("mail.smtp_host must be set"));
            }
            if self.mail.smtp_port == 0 {
                return Err(Error::config("mail.smtp_port must be positive"));
            }
        }
        if self.input.yaml_path.trim().is_empty() {
            return Err(Error::config("input.yaml_path must be set"));
        }
        Ok(())
    }

    pub fn broker_url(&self) -> &str {
        if self.broker.sandbox {
            &self.broker.sandbox_url
        } else {
            &self.broker.base_url
        }
    }

    pub fn deposit_failure_policy(&self) -> Result<DepositFailurePolicy> {
        self.schedule.deposit_failure.parse::<DepositFailurePolicy>()
    }

    pub fn bot_settings(&self) -> Result<BotSettings> {
        Ok(BotSettings {
            sandbox: self.broker.sandbox,
            settlement_delay: Duration::from_secs(self.broker.settlement_delay_secs),
            poll_interval: Duration::from_secs(self.schedule.poll_interval_secs),
            deposit_failure: self.deposit_failure_policy()?,
        })
    }
}

/// Broker and mail credentials, read once at startup.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
    pub passphrase: String,
    pub email: Option<MailCredentials>,
}

#[derive(Clone)]
pub struct MailCredentials {
    pub address: String,
    pub password: String,
}

impl Credentials {
    pub fn from_env(sandbox: bool) -> Result<Self> {
        let (key_var, secret_var, pass_var) = if sandbox {
            ("CB_API_KEY_TEST", "CB_API_SECRET_TEST", "CB_API_PASS_TEST")
        } else {
            ("CB_API_KEY", "CB_API_SECRET", "CB_API_PASS")
        };
        let api_key = require_env(key_var)?;
        let api_secret = require_env(secret_var)?;
        let passphrase = require_env(pass_var)?;

        let address = read_string_env("EMAIL_ADDRESS")?.filter(|value| !value.trim().is_empty());
        let password = read_string_env("EMAIL_PASSWORD")?.filter(|value| !value.is_empty());
        let email = match (address, password) {
            (Some(address), Some(password)) => Some(MailCredentials { address, password }),
            _ => None,
        };

        Ok(Self {
            api_key,
            api_secret,
            passphrase,
            email,
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .field("email", &self.email.as_ref().map(|mail| mail.address.as_str()))
            .finish()
    }
}

fn require_env(key: &str) -> Result<String> {
    match read_string_env(key)? {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::config(format!("{key} must be set"))),
    }
}

fn read_string_env(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(Error::config(format!("failed to read {key}: {err}"))),
    }
}

fn read_bool_env(key: &str) -> Result<Option<bool>> {
    match env::var(key) {
        Ok(value) => match value.to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Some(true)),
            "false" | "0" | "no" => Ok(Some(false)),
            _ => Err(Error::config(format!("{key} must be a boolean"))),
        },
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(Error::config(format!("failed to read {key}: {err}"))),
    }
}

fn read_u64_env(key: &str) -> Result<Option<u64>> {
    match env::var(key) {
        Ok(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|err| Error::config(format!("{key} must be u64: {err}"))),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(Error::config(format!("failed to read {key}: {err}"))),
    }
}
