use crate::app::metrics;
use crate::broker::coinbase::{CoinbaseConfig, CoinbaseExchange};
use crate::config::{Config, Credentials};
use crate::core::build_bot;
use crate::core::clock::{Clock, StopSignal, SystemClock};
use crate::input::{
    verify_currencies, InputCollector, OrderInputs, PromptInputCollector, YamlInputCollector,
};
use crate::notify::smtp::SmtpMailer;
use crate::notify::Notifier;
use crate::{Error, Result};
use std::env;
use std::io;
use tracing::{info, warn};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

pub fn run() -> Result<()> {
    metrics::init_start_time();
    let args: Vec<String> = env::args().collect();
    let cli = parse_args(&args)?;

    if cli.show_help {
        print_usage();
        return Ok(());
    }

    let mut config = match &cli.config_path {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(DEFAULT_CONFIG_PATH)?,
    };
    if cli.sandbox {
        config.broker.sandbox = true;
    }
    if let InputSource::Yaml(Some(path)) = &cli.source {
        config.input.yaml_path = path.clone();
    }
    config.validate()?;

    let credentials = Credentials::from_env(config.broker.sandbox)?;
    let broker = CoinbaseExchange::new(CoinbaseConfig {
        base_url: config.broker_url().to_string(),
        api_key: credentials.api_key.clone(),
        api_secret: credentials.api_secret.clone(),
        passphrase: credentials.passphrase.clone(),
        timeout_secs: config.broker.timeout_secs,
    })?;
    info!(
        base_url = %broker.base_url(),
        sandbox = config.broker.sandbox,
        timestamp_tolerance_secs = config.broker.timestamp_tolerance_secs,
        "broker client ready"
    );
    if broker.is_sandbox() != config.broker.sandbox {
        warn!(base_url = %broker.base_url(), "endpoint does not match the sandbox setting");
    }

    let notifier = build_notifier(&config, &credentials)?;
    let clock = SystemClock;

    let inputs = collect_inputs(&cli.source, &config, &clock)?;
    verify_currencies(&broker, &inputs.orders)?;
    info!(
        start_date = %inputs.start_date,
        start_time = %inputs.start_time,
        frequency = %inputs.frequency,
        orders = inputs.orders.len(),
        total = inputs.orders.total(),
        "inputs collected"
    );

    let mut bot = build_bot(&config, inputs, broker, notifier, clock)?;
    let stop = StopSignal::new();
    bot.activate(&stop)
}

fn build_notifier(config: &Config, credentials: &Credentials) -> Result<Option<Notifier<SmtpMailer>>> {
    if !config.mail.enabled {
        info!("email notifications disabled by config");
        return Ok(None);
    }
    match &credentials.email {
        Some(mail) => {
            let mailer = SmtpMailer::new(
                &config.mail.smtp_host,
                config.mail.smtp_port,
                &mail.address,
                &mail.password,
            )?;
            Ok(Some(Notifier::new(mailer)))
        }
        None => {
            warn!("EMAIL_ADDRESS or EMAIL_PASSWORD not set, confirmations will not be emailed");
            Ok(None)
        }
    }
}

fn collect_inputs(source: &InputSource, config: &Config, clock: &SystemClock) -> Result<OrderInputs> {
    match source {
        InputSource::Prompt => {
            let stdin = io::stdin();
            let mut collector = PromptInputCollector::new(stdin.lock(), io::stdout(), clock);
            collector.collect_inputs()
        }
        InputSource::Yaml(_) => {
            info!(path = %config.input.yaml_path, "reading orders");
            YamlInputCollector::from_path(&config.input.yaml_path, clock.now())?.collect_inputs()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum InputSource {
    Prompt,
    /// `None` means the path from config.
    Yaml(Option<String>),
}

struct CliArgs {
    config_path: Option<String>,
    source: InputSource,
    sandbox: bool,
    show_help: bool,
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut config_path = None;
    let mut prompt = false;
    let mut yaml: Option<Option<String>> = None;
    let mut sandbox = false;
    let mut show_help = false;

    let mut index = 1;
    while index < args.len() {
        match args[index].as_str() {
            "--help" | "-h" => {
                show_help = true;
                index += 1;
            }
            "--config" | "-c" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| Error::invalid_argument("missing value for --config"))?;
                config_path = Some(value.to_string());
                index += 2;
            }
            "--cli" => {
                prompt = true;
                index += 1;
            }
            "--yaml" => match args.get(index + 1) {
                Some(value) if !value.starts_with('-') => {
                    yaml = Some(Some(value.to_string()));
                    index += 2;
                }
                _ => {
                    yaml = Some(None);
                    index += 1;
                }
            },
            "--sandbox" => {
                sandbox = true;
                index += 1;
            }
            unknown => {
                return Err(Error::invalid_argument(format!("unknown argument: {unknown}")));
            }
        }
    }

    let source = match (prompt, yaml) {
        (true, Some(_)) => {
            return Err(Error::invalid_argument("--cli and --yaml cannot be used together"));
        }
        (true, None) => InputSource::Prompt,
        (false, Some(path)) => InputSource::Yaml(path),
        (false, None) => InputSource::Yaml(None),
    };

    Ok(CliArgs {
        config_path,
        source,
        sandbox,
        show_help,
    })
}

fn print_usage() {
    println!("usage: recurbuy [--cli | --yaml [<path>]] [--config <path>] [--sandbox]");
    println!("      --cli      Enter the schedule and orders interactively");
    println!("      --yaml     Read the schedule and orders from YAML (default: input.yaml_path)");
    println!("  -c, --config   Path to config.toml (default: config.toml, optional)");
    println!("      --sandbox  Use the sandbox endpoint and *_TEST credentials");
    println!("  -h, --help     Show this help");
}

#[cfg(test)]
mod tests {
    use super::{parse_args, InputSource};
    use crate::ErrorKind;

    fn args(values: &[&str]) -> Vec<String> {
        std::iter::once("recurbuy")
            .chain(values.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn parses_defaults() {
        let parsed = parse_args(&args(&[])).expect("parse");
        assert!(parsed.config_path.is_none());
        assert_eq!(parsed.source, InputSource::Yaml(None));
        assert!(!parsed.sandbox);
        assert!(!parsed.show_help);
    }

    #[test]
    fn parses_yaml_path_and_flags() {
        let parsed = parse_args(&args(&[
            "--yaml",
            "my_orders.yaml",
            "--sandbox",
            "--config",
            "custom.toml",
        ]))
        .expect("parse");
        assert_eq!(parsed.source, InputSource::Yaml(Some("my_orders.yaml".to_string())));
        assert!(parsed.sandbox);
        assert_eq!(parsed.config_path.as_deref(), Some("custom.toml"));
    }

    #[test]
    fn yaml_without_path_uses_config() {
        let parsed = parse_args(&args(&["--yaml", "--sandbox"])).expect("parse");
        assert_eq!(parsed.source, InputSource::Yaml(None));
        assert!(parsed.sandbox);
    }

    #[test]
    fn cli_selects_prompt() {
        let parsed = parse_args(&args(&["--cli"])).expect("parse");
        assert_eq!(parsed.source, InputSource::Prompt);
    }

    #[test]
    fn rejects_cli_with_yaml() {
        let err = parse_args(&args(&["--cli", "--yaml"])).err().expect("error");
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }

    #[test]
    fn rejects_unknown_and_missing_values() {
        assert!(parse_args(&args(&["--symbol", "BTC"])).is_err());
        assert!(parse_args(&args(&["--config"])).is_err());
    }
}
