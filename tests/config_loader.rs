use recurbuy::config::Config;
use recurbuy::core::bot::DepositFailurePolicy;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

fn temp_config_path(name: &str) -> PathBuf {
    let mut path = env::temp_dir();
    path.push(format!("recurbuy_{name}.toml"));
    path
}

#[test]
fn loads_config_and_applies_env_overrides() {
    let path = temp_config_path("config_loader");
    let content = r#"
[broker]
base_url = "https://api.pro.coinbase.com"
sandbox = false
timeout_secs = 10
settlement_delay_secs = 20

[schedule]
poll_interval_secs = 2
deposit_failure = "continue"

[mail]
enabled = true
smtp_host = "smtp.example.com"
smtp_port = 465

[input]
yaml_path = "config/orders.yaml"
"#;
    fs::write(&path, content).expect("write config");

    env::set_var("RECURBUY_SANDBOX", "true");
    env::set_var("RECURBUY_POLL_INTERVAL_SECS", "5");
    env::set_var("RECURBUY_SMTP_HOST", "smtp.override.com");

    let loaded = Config::load(path.to_str().expect("path"));

    env::remove_var("RECURBUY_SANDBOX");
    env::remove_var("RECURBUY_POLL_INTERVAL_SECS");
    env::remove_var("RECURBUY_SMTP_HOST");
    let _ = fs::remove_file(&path);

    let config = loaded.expect("load config");
    assert!(config.broker.sandbox);
    assert_eq!(config.broker.timeout_secs, 10);
    assert_eq!(config.schedule.poll_interval_secs, 5);
    assert_eq!(config.mail.smtp_host, "smtp.override.com");
    assert_eq!(config.input.yaml_path, "config/orders.yaml");
    assert_eq!(config.broker_url(), "https://api-public.sandbox.pro.coinbase.com");

    let settings = config.bot_settings().expect("settings");
    assert!(settings.sandbox);
    assert_eq!(settings.settlement_delay, Duration::from_secs(20));
    assert_eq!(settings.poll_interval, Duration::from_secs(5));
    assert_eq!(settings.deposit_failure, DepositFailurePolicy::Continue);
}

#[test]
fn partial_file_keeps_defaults() {
    let config = Config::parse(
        r#"
[mail]
enabled = false
"#,
    )
    .expect("parse");
    assert!(!config.mail.enabled);
    assert_eq!(config.mail.smtp_host, "smtp.gmail.com");
    assert_eq!(config.broker.base_url, "https://api.pro.coinbase.com");
    assert_eq!(config.broker.settlement_delay_secs, 15);
    assert_eq!(config.schedule.poll_interval_secs, 1);
    assert_eq!(config.input.yaml_path, "orders.yaml");
    assert_eq!(
        config.deposit_failure_policy().expect("policy"),
        DepositFailurePolicy::Abort
    );
}

#[test]
fn missing_file_is_an_error_for_load() {
    let path = temp_config_path("does_not_exist");
    let _ = fs::remove_file(&path);
    assert!(Config::load(path.to_str().expect("path")).is_err());
}

#[test]
fn malformed_toml_is_a_config_error() {
    let err = Config::parse("[broker\nbase_url = ").expect_err("malformed");
    assert_eq!(err.kind, recurbuy::ErrorKind::Config);
}
