//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BAZAAR_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `BAZAAR_HOST` - Bind address (default: 127.0.0.1)
//! - `BAZAAR_PORT` - Listen port (default: 4000)
//! - `BAZAAR_SESSION_SECURE` - Mark the session cookie `Secure` (default: false)
//! - `BAZAAR_CORS_ORIGINS` - Comma-separated allowed origins (default: any origin)
//! - `BAZAAR_SHIPPING_FEE` - Flat shipping fee per order (default: 0)
//! - `BAZAAR_FREE_SHIPPING_THRESHOLD` - Subtotal at which shipping is free
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Whether the session cookie requires HTTPS
    pub session_secure: bool,
    /// Origins allowed by CORS; empty means any origin
    pub cors_origins: Vec<String>,
    /// Order shipping rules
    pub shipping: ShippingPolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// How shipping is charged on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShippingPolicy {
    /// Flat fee added to every order
    pub flat_fee: Decimal,
    /// Subtotal from which the fee is waived
    pub free_threshold: Option<Decimal>,
}

impl ShippingPolicy {
    /// Shipping fee for an order with the given subtotal.
    #[must_use]
    pub fn fee_for(&self, subtotal: Decimal) -> Decimal {
        match self.free_threshold {
            Some(threshold) if subtotal >= threshold => Decimal::ZERO,
            _ => self.flat_fee,
        }
    }
}

impl ApiConfig {
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
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("BAZAAR_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("BAZAAR_DATABASE_URL".to_string()))?;

        let host = parse_or_default(&lookup, "BAZAAR_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = parse_or_default(&lookup, "BAZAAR_PORT", 4000_u16)?;
        let session_secure = parse_or_default(&lookup, "BAZAAR_SESSION_SECURE", false)?;

        let cors_origins = lookup("BAZAAR_CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let shipping = ShippingPolicy {
            flat_fee: parse_or_default(&lookup, "BAZAAR_SHIPPING_FEE", Decimal::ZERO)?,
            free_threshold: parse_optional(&lookup, "BAZAAR_FREE_SHIPPING_THRESHOLD")?,
        };
        if shipping.flat_fee.is_sign_negative() {
            return Err(ConfigError::InvalidEnvVar(
                "BAZAAR_SHIPPING_FEE".to_string(),
                "must not be negative".to_string(),
            ));
        }

        Ok(Self {
            database_url,
            host,
            port,
            session_secure,
            cors_origins,
            shipping,
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_or_default(&lookup, "SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: parse_or_default(&lookup, "SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a variable, falling back to `default` when it is unset.
fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_optional(lookup, key)?.unwrap_or(default))
}

/// Parse a variable that may be unset.
fn parse_optional<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
        .transpose()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ApiConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_missing_database_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "BAZAAR_DATABASE_URL"));
    }

    #[test]
    fn test_database_url_fallback() {
        let config = load(&[("DATABASE_URL", "postgres://fallback/db")]).unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://fallback/db");

        let config = load(&[
            ("DATABASE_URL", "postgres://fallback/db"),
            ("BAZAAR_DATABASE_URL", "postgres://primary/db"),
        ])
        .unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgres://primary/db");
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/bazaar")]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:4000");
        assert!(!config.session_secure);
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.shipping, ShippingPolicy::default());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_invalid_port() {
        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/bazaar"),
            ("BAZAAR_PORT", "eighty"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "BAZAAR_PORT"));
    }

    #[test]
    fn test_cors_origins_are_split_and_trimmed() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/bazaar"),
            ("BAZAAR_CORS_ORIGINS", "https://admin.example.com, http://localhost:5173,"),
        ])
        .unwrap();
        assert_eq!(
            config.cors_origins,
            vec!["https://admin.example.com", "http://localhost:5173"]
        );
    }

    #[test]
    fn test_negative_shipping_fee_rejected() {
        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/bazaar"),
            ("BAZAAR_SHIPPING_FEE", "-5"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(..)));
    }

    #[test]
    fn test_shipping_policy_fee() {
        let policy = ShippingPolicy {
            flat_fee: Decimal::new(500, 2),
            free_threshold: Some(Decimal::new(10000, 2)),
        };
        assert_eq!(policy.fee_for(Decimal::new(9999, 2)), Decimal::new(500, 2));
        assert_eq!(policy.fee_for(Decimal::new(10000, 2)), Decimal::ZERO);

        let no_threshold = ShippingPolicy {
            flat_fee: Decimal::new(500, 2),
            free_threshold: None,
        };
        assert_eq!(no_threshold.fee_for(Decimal::new(1_000_000, 2)), Decimal::new(500, 2));
    }
}
