use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "info,lettre=warn,rustls=warn";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Plain,
    Json,
}

impl LogFormat {
    fn parse(value: Option<&str>) -> Self {
        match value.map(|value| value.trim().to_lowercase()).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Plain,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LogSettings {
    pub directives: String,
    pub format: LogFormat,
}

impl LogSettings {
    pub fn from_env() -> Self {
        Self::resolve(
            non_empty_env("RECURBUY_LOG"),
            non_empty_env("RUST_LOG"),
            non_empty_env("RECURBUY_LOG_FORMAT"),
        )
    }

    fn resolve(own: Option<String>, rust_log: Option<String>, format: Option<String>) -> Self {
        Self {
            directives: own
                .or(rust_log)
                .unwrap_or_else(|| DEFAULT_DIRECTIVES.to_string()),
            format: LogFormat::parse(format.as_deref()),
        }
    }
}

/// Logs go to stderr; stdout is reserved for the interactive prompts.
pub fn init() {
    init_with(&LogSettings::from_env());
}

pub fn init_with(settings: &LogSettings) {
    let filter = EnvFilter::try_new(&settings.directives)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // Already installed when embedded or under test.
    let _ = match settings.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Plain => builder.try_init(),
    };
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}
