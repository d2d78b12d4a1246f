use clap::{Args, Parser, ValueEnum};
use email_address::EmailAddress;
use ipnetwork::IpNetwork;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("SENDGRID_API_KEY environment variable must be set")]
    MissingCredential,
    #[error("Invalid {field} address '{value}': {reason}")]
    InvalidAddress { field: &'static str, value: String, reason: String },
}

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub email: EmailConfig,

    #[command(flatten)]
    pub rate_limit: RateLimitConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "PORTFOLIO_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORTFOLIO_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Maximum time a single request may take before answering 408
    #[arg(long, env = "PORTFOLIO_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// How long to wait for in-flight requests after a shutdown signal
    #[arg(long, env = "PORTFOLIO_SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,

    /// Comma-separated list of CIDRs to trust for X-Forwarded-For IP extraction
    #[arg(
        long,
        env = "PORTFOLIO_TRUSTED_PROXIES",
        default_value = "10.0.0.0/8,172.16.0.0/12,192.168.0.0/16,127.0.0.1/32",
        value_delimiter = ','
    )]
    pub trusted_proxies: Vec<IpNetwork>,

    /// Directory holding the built front end (index.html and assets)
    #[arg(long, env = "PORTFOLIO_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct EmailConfig {
    /// SendGrid API key. Required: the server refuses to start without it.
    #[arg(long, env = "SENDGRID_API_KEY", hide_env_values = true)]
    pub sendgrid_api_key: Option<String>,

    /// Base URL of the SendGrid API
    #[arg(long, env = "PORTFOLIO_SENDGRID_BASE_URL", default_value = "https://api.sendgrid.com")]
    pub sendgrid_base_url: String,

    /// Address that receives contact form notifications
    #[arg(long, env = "PORTFOLIO_OWNER_EMAIL")]
    pub owner_email: String,

    /// Verified sender address used as the notification's From
    #[arg(long, env = "PORTFOLIO_SENDER_EMAIL", default_value = "noreply@yourportfolio.com")]
    pub sender_email: String,

    /// Display name used alongside the sender address
    #[arg(long, env = "PORTFOLIO_SENDER_NAME", default_value = "Portfolio Contact Form")]
    pub sender_name: String,

    /// Upper bound for a single provider round trip
    #[arg(long, env = "PORTFOLIO_EMAIL_SEND_TIMEOUT_SECS", default_value_t = 10)]
    pub send_timeout_secs: u64,
}

/// Owner and sender addresses after startup validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailAddresses {
    pub owner: EmailAddress,
    pub sender: EmailAddress,
    pub sender_name: String,
}

impl EmailConfig {
    /// Returns the provider credential.
    ///
    /// # Errors
    /// Returns `ConfigError::MissingCredential` if the key is unset or blank.
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.sendgrid_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingCredential)
    }

    /// Parses the configured owner and sender addresses.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidAddress` naming the offending setting.
    pub fn addresses(&self) -> Result<MailAddresses, ConfigError> {
        Ok(MailAddresses {
            owner: parse_address("owner", &self.owner_email)?,
            sender: parse_address("sender", &self.sender_email)?,
            sender_name: self.sender_name.clone(),
        })
    }

    #[must_use]
    pub const fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }
}

fn parse_address(field: &'static str, value: &str) -> Result<EmailAddress, ConfigError> {
    EmailAddress::from_str(value.trim()).map_err(|e| ConfigError::InvalidAddress {
        field,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[derive(Clone, Debug, Args)]
pub struct RateLimitConfig {
    /// Contact submissions replenished per minute for a single client IP
    #[arg(long, env = "PORTFOLIO_CONTACT_RATE_LIMIT_PER_MINUTE", default_value_t = 5)]
    pub contact_per_minute: u32,

    /// Burst allowance for contact submissions
    #[arg(long, env = "PORTFOLIO_CONTACT_RATE_LIMIT_BURST", default_value_t = 3)]
    pub contact_burst: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// Output format for log lines
    #[arg(long, env = "PORTFOLIO_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP/HTTP collector endpoint; telemetry export is disabled when unset
    #[arg(long, env = "PORTFOLIO_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Parses flags and environment.
    ///
    /// # Errors
    /// Returns the clap error when a required setting is missing or malformed.
    pub fn load() -> Result<Self, clap::Error> {
        Self::try_parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["portfolio-server"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["--owner-email", "owner@example.com", "--sendgrid-api-key", "SG.key"]);

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.email.sender_email, "noreply@yourportfolio.com");
        assert_eq!(config.email.send_timeout(), Duration::from_secs(10));
        assert_eq!(config.telemetry.log_format, LogFormat::Text);
        assert_eq!(config.server.trusted_proxies.len(), 4);
    }

    #[test]
    fn test_missing_credential_is_reported() {
        let mut config = parse(&["--owner-email", "owner@example.com", "--sendgrid-api-key", "SG.key"]);
        config.email.sendgrid_api_key = None;
        assert!(matches!(config.email.api_key(), Err(ConfigError::MissingCredential)));

        config.email.sendgrid_api_key = Some("   ".to_string());
        assert!(matches!(config.email.api_key(), Err(ConfigError::MissingCredential)));
    }

    #[test]
    fn test_missing_credential_message_names_the_variable() {
        assert_eq!(ConfigError::MissingCredential.to_string(), "SENDGRID_API_KEY environment variable must be set");
    }

    #[test]
    fn test_invalid_owner_address() {
        let config = parse(&["--owner-email", "not-an-address", "--sendgrid-api-key", "SG.key"]);
        let err = config.email.addresses().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAddress { field: "owner", .. }));
    }
}
