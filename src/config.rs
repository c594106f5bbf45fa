use crate::application::dispatcher::DEFAULT_NOTIFY_TIMEOUT;
use crate::error::{PaymentError, Result};
use std::time::Duration;
use url::Url;

pub const NOTIFY_URL_VAR: &str = "PAYMENT_NOTIFY_URL";
pub const NOTIFY_TIMEOUT_VAR: &str = "PAYMENT_NOTIFY_TIMEOUT_MS";
pub const LOG_FORMAT_VAR: &str = "LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Settings resolved once at start-up and passed down explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub notify_url: Url,
    pub notify_timeout: Duration,
    pub log_format: LogFormat,
}

/// Values given on the command line. They win over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub notify_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub log_format: Option<LogFormat>,
}

impl AppConfig {
    /// Loads `.env` (if present) and resolves the config from the process
    /// environment and `overrides`.
    pub fn load(overrides: ConfigOverrides) -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::resolve(overrides, |key| std::env::var(key).ok())
    }

    /// Resolves the config against an arbitrary variable lookup.
    pub fn resolve<F>(overrides: ConfigOverrides, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_url = overrides.notify_url.or_else(|| env(NOTIFY_URL_VAR)).ok_or_else(|| {
            PaymentError::ConfigError(format!(
                "{NOTIFY_URL_VAR} is not set and --notify-url was not given"
            ))
        })?;
        let notify_url = Url::parse(raw_url.trim()).map_err(|e| {
            PaymentError::ConfigError(format!("notification URL is invalid: {e}"))
        })?;

        let timeout_ms = match overrides.timeout_ms {
            Some(ms) => Some(ms),
            None => env(NOTIFY_TIMEOUT_VAR)
                .map(|raw| {
                    raw.trim().parse::<u64>().map_err(|e| {
                        PaymentError::ConfigError(format!("{NOTIFY_TIMEOUT_VAR} is invalid: {e}"))
                    })
                })
                .transpose()?,
        };
        let notify_timeout = match timeout_ms {
            Some(0) => {
                return Err(PaymentError::ConfigError(
                    "notification timeout must be greater than zero".to_string(),
                ));
            }
            Some(ms) => Duration::from_millis(ms),
            None => DEFAULT_NOTIFY_TIMEOUT,
        };

        let log_format = match overrides.log_format {
            Some(format) => format,
            None => match env(LOG_FORMAT_VAR) {
                Some(raw) => LogFormat::parse(&raw).ok_or_else(|| {
                    PaymentError::ConfigError(format!("{LOG_FORMAT_VAR} is invalid: {raw}"))
                })?,
                None => LogFormat::default(),
            },
        };

        Ok(Self {
            notify_url,
            notify_timeout,
            log_format,
        })
    }
}
