//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL (default: `http://localhost:<port>`)
//! - `TTD_DATA_FILE` - Store snapshot path (default: data/store.json)
//! - `APP_NAME` - Shop name shown in the header (default: TTD Software)
//! - `USE_MOCK_API` - Use the built-in auth stub (default: true)
//! - `AUTH_API_URL` - Remote auth API base URL (default: `http://localhost:3001/api/v1`)
//! - `AUTH_API_KEY` - Bearer key sent to the remote auth API
//! - `FEATURE_EMAIL_LOGIN` - Offer email + password sign-in (default: true)
//! - `FEATURE_PHONE_LOGIN` - Offer phone + OTP sign-in (default: true)
//! - `FEATURE_SOCIAL_LOGIN` - Show social sign-in buttons (default: false)
//! - `LOG_FORMAT` - `json` for JSON log lines, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// JSON snapshot shared with the admin
    pub data_file: PathBuf,
    /// Shop name used in page titles and the header
    pub app_name: String,
    /// Sign-in backend
    pub auth: AuthApiConfig,
    /// Which sign-in options are offered
    pub features: FeatureFlags,
    /// Emit JSON log lines
    pub json_logs: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

/// Remote auth API settings.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct AuthApiConfig {
    /// When true, every sign-in is handled locally and the API is never called.
    pub use_mock: bool,
    pub base_url: String,
    pub api_key: Option<SecretString>,
}

impl std::fmt::Debug for AuthApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthApiConfig")
            .field("use_mock", &self.use_mock)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct FeatureFlags {
    pub email_login: bool,
    pub phone_login: bool,
    pub social_login: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            email_login: true,
            phone_login: true,
            social_login: false,
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
    /// Returns `ConfigError` if a variable is present but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let host = env.parse_or("STOREFRONT_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port: u16 = env.parse_or("STOREFRONT_PORT", 3000)?;
        let base_url = env
            .optional("STOREFRONT_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"));

        let auth = AuthApiConfig {
            use_mock: env.flag("USE_MOCK_API", true)?,
            base_url: env.or_default("AUTH_API_URL", "http://localhost:3001/api/v1"),
            api_key: env.optional("AUTH_API_KEY").map(SecretString::from),
        };
        if !auth.use_mock {
            url::Url::parse(&auth.base_url)
                .map_err(|e| ConfigError::InvalidEnvVar("AUTH_API_URL".to_owned(), e.to_string()))?;
        }

        let features = FeatureFlags {
            email_login: env.flag("FEATURE_EMAIL_LOGIN", true)?,
            phone_login: env.flag("FEATURE_PHONE_LOGIN", true)?,
            social_login: env.flag("FEATURE_SOCIAL_LOGIN", false)?,
        };

        Ok(Self {
            host,
            port,
            base_url,
            data_file: PathBuf::from(env.or_default("TTD_DATA_FILE", "data/store.json")),
            app_name: env.or_default("APP_NAME", "TTD Software"),
            auth,
            features,
            json_logs: env
                .optional("LOG_FORMAT")
                .is_some_and(|f| f.eq_ignore_ascii_case("json")),
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.parse_or("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: env.parse_or("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
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

struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get an optional variable; empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_owned())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))
        })
    }

    /// Parse a boolean flag (`true/false`, `1/0`, `yes/no`, `on/off`).
    fn flag(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        let Some(raw) = self.optional(key) else {
            return Ok(default);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar(
                key.to_owned(),
                format!("expected a boolean, got '{other}'"),
            )),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        StorefrontConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.data_file, PathBuf::from("data/store.json"));
        assert_eq!(config.app_name, "TTD Software");
        assert!(config.auth.use_mock);
        assert_eq!(config.features, FeatureFlags::default());
        assert!(!config.json_logs);
    }

    #[test]
    fn test_socket_addr() {
        let config = load(&[("STOREFRONT_HOST", "0.0.0.0"), ("STOREFRONT_PORT", "8080")]).unwrap();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "0.0.0.0");
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_host_default_and_blank() {
        let config = load(&[]).unwrap();
        assert_eq!(config.host, IpAddr::from([127, 0, 0, 1]));

        let config = load(&[("STOREFRONT_HOST", "  ")]).unwrap();
        assert_eq!(config.host, IpAddr::from([127, 0, 0, 1]));

        let err = load(&[("STOREFRONT_HOST", "localhost:80")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "STOREFRONT_HOST"));
    }

    #[test]
    fn test_invalid_port() {
        let err = load(&[("STOREFRONT_PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "STOREFRONT_PORT"));
    }

    #[test]
    fn test_flags() {
        let config = load(&[
            ("USE_MOCK_API", "no"),
            ("FEATURE_SOCIAL_LOGIN", "1"),
            ("FEATURE_PHONE_LOGIN", "off"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();
        assert!(!config.auth.use_mock);
        assert!(config.features.social_login);
        assert!(!config.features.phone_login);
        assert!(config.json_logs);

        assert!(load(&[("USE_MOCK_API", "maybe")]).is_err());
    }

    #[test]
    fn test_remote_auth_url_must_parse() {
        let err = load(&[("USE_MOCK_API", "false"), ("AUTH_API_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "AUTH_API_URL"));
    }

    #[test]
    fn test_auth_config_debug_redacts_key() {
        let config = load(&[("AUTH_API_KEY", "super_secret_api_key")]).unwrap();
        assert_eq!(
            config.auth.api_key.as_ref().unwrap().expose_secret(),
            "super_secret_api_key"
        );
        let debug_output = format!("{:?}", config.auth);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_api_key"));
    }
}
