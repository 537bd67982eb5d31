//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 5000)
//! - `CHECKOUT_PAYMENT_DENY_EVERY` - Mock card processor: decline every Nth attempt (>= 2)
//! - `CART_SYNC_BASE_URL` - Storefront URL used by cart sync clients (default: <http://127.0.0.1:5000>)
//! - `CART_SYNC_DEBOUNCE_MS` - Cart sync debounce delay (default: 400)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 0.1)

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::services::payment::{AlwaysApprove, EveryNthDenied, PaymentGate};

const DEFAULT_DEBOUNCE_MS: u64 = 400;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Payment authorization policy
    pub payment: PaymentPolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "production", "staging")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Which payment gate the checkout engine consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentPolicy {
    #[default]
    AlwaysApprove,
    /// Decline every Nth attempt.
    DenyEvery(u64),
}

impl PaymentPolicy {
    /// Build the gate for this policy.
    #[must_use]
    pub fn gate(self) -> Arc<dyn PaymentGate> {
        match self {
            Self::AlwaysApprove => Arc::new(AlwaysApprove),
            Self::DenyEvery(n) => Arc::new(EveryNthDenied::new(n)),
        }
    }
}

/// Settings for cart sync clients (the reconciler).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSyncConfig {
    /// Base URL of the storefront API
    pub base_url: String,
    /// Quiet period before a local edit is written back
    pub debounce: Duration,
}

impl Default for CartSyncConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_owned(),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "5000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let payment =
            parse_payment_policy(get_optional_env("CHECKOUT_PAYMENT_DENY_EVERY").as_deref())?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            database_url,
            host,
            port,
            payment,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl CartSyncConfig {
    /// Load cart sync settings from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` for a non-numeric debounce.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let defaults = Self::default();
        Ok(Self {
            base_url: get_optional_env("CART_SYNC_BASE_URL")
                .map_or(defaults.base_url, |url| url.trim_end_matches('/').to_owned()),
            debounce: parse_debounce(get_optional_env("CART_SYNC_DEBOUNCE_MS").as_deref())?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_payment_policy(raw: Option<&str>) -> Result<PaymentPolicy, ConfigError> {
    let Some(raw) = raw else {
        return Ok(PaymentPolicy::AlwaysApprove);
    };
    let invalid = |msg: String| ConfigError::InvalidEnvVar("CHECKOUT_PAYMENT_DENY_EVERY".into(), msg);

    let every = raw.trim().parse::<u64>().map_err(|e| invalid(e.to_string()))?;
    if every < 2 {
        return Err(invalid(format!("must be at least 2 (got {every})")));
    }
    Ok(PaymentPolicy::DenyEvery(every))
}

fn parse_debounce(raw: Option<&str>) -> Result<Duration, ConfigError> {
    raw.map_or(Ok(DEFAULT_DEBOUNCE_MS), |v| v.trim().parse::<u64>())
        .map(Duration::from_millis)
        .map_err(|e| ConfigError::InvalidEnvVar("CART_SYNC_DEBOUNCE_MS".into(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::payment::PaymentDecision;

    #[test]
    fn test_payment_policy_defaults_to_approve() {
        assert_eq!(parse_payment_policy(None).unwrap(), PaymentPolicy::AlwaysApprove);
        assert_eq!(
            PaymentPolicy::default().gate().authorize(),
            PaymentDecision::Approved
        );
    }

    #[test]
    fn test_payment_policy_deny_every() {
        let policy = parse_payment_policy(Some("3")).unwrap();
        assert_eq!(policy, PaymentPolicy::DenyEvery(3));

        let gate = policy.gate();
        gate.authorize();
        gate.authorize();
        assert_eq!(gate.authorize(), PaymentDecision::Denied);
    }

    #[test]
    fn test_payment_policy_rejects_bad_values() {
        assert!(matches!(
            parse_payment_policy(Some("1")),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(parse_payment_policy(Some("often")).is_err());
    }

    #[test]
    fn test_debounce() {
        assert_eq!(parse_debounce(None).unwrap(), Duration::from_millis(400));
        assert_eq!(parse_debounce(Some(" 50 ")).unwrap(), Duration::from_millis(50));
        assert!(parse_debounce(Some("-1")).is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 5000,
            payment: PaymentPolicy::AlwaysApprove,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 5000);
    }

    #[test]
    fn test_config_debug_redacts_database_url() {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://app:hunter2@db/shop"),
            host: "0.0.0.0".parse().unwrap(),
            port: 5000,
            payment: PaymentPolicy::DenyEvery(3),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("DenyEvery(3)"));
        assert!(!debug_output.contains("hunter2"));
    }
}
