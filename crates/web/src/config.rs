//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `AGENTBI_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `WEBHOOK_SECRET` - Svix signing secret for identity-provider webhooks (`whsec_...`)
//! - `IDENTITY_JWT_KEY` - PEM public key used to verify identity session tokens
//!
//! ## Optional
//! - `AGENTBI_HOST` - Bind address (default: 127.0.0.1)
//! - `AGENTBI_PORT` - Listen port (default: 3000)
//! - `IDENTITY_SIGN_IN_URL` - Where unauthenticated page requests are sent (default: /sign-in)
//! - `IDENTITY_AUTHORIZED_PARTIES` - Comma-separated allowed `azp` origins
//! - `IDENTITY_PUBLIC_ROUTES` - Comma-separated extra public path patterns
//! - `TAB_SESSION_IDLE_SECS` - Idle lifetime of a tab session (default: 1800)
//! - `TAB_SESSION_CAPACITY` - Maximum live tab sessions (default: 10000)
//! - `TAB_UPLOAD_MAX_BYTES` - Body limit for multipart file uploads (default: 25 MiB)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::webhooks::WebhookVerifier;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Svix webhook signing secret
    pub webhook_secret: SecretString,
    /// Identity gate configuration
    pub identity: IdentityConfig,
    /// Tab session lifetime settings
    pub tab_sessions: TabSessionConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Identity gate configuration.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// PEM-encoded RSA public key of the identity provider
    pub jwt_key: String,
    /// Sign-in page for unauthenticated page requests
    pub sign_in_url: String,
    /// Accepted `azp` claim values; empty accepts any
    pub authorized_parties: Vec<String>,
    /// Path patterns exempt from requiring an identity, added to the defaults
    pub public_routes: Vec<String>,
}

/// Tab session settings.
#[derive(Debug, Clone, Copy)]
pub struct TabSessionConfig {
    pub idle_timeout: Duration,
    pub capacity: u64,
    /// Request body limit on the file upload routes
    pub max_upload_bytes: usize,
}

impl Default for TabSessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(30 * 60),
            capacity: 10_000,
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the webhook secret fails validation. The server must not start
    /// without a usable webhook secret.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let database_url = env.database_url("AGENTBI_DATABASE_URL")?;
        let host = env
            .or_default("AGENTBI_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("AGENTBI_HOST".to_string(), e.to_string()))?;
        let port = env.parsed_or("AGENTBI_PORT", 3000_u16)?;

        let webhook_secret = env.validated_secret("WEBHOOK_SECRET")?;
        WebhookVerifier::new(&webhook_secret).map_err(|e| {
            ConfigError::InvalidEnvVar("WEBHOOK_SECRET".to_string(), e.to_string())
        })?;

        let identity = IdentityConfig::from_env(&env)?;

        let defaults = TabSessionConfig::default();
        let tab_sessions = TabSessionConfig {
            idle_timeout: Duration::from_secs(
                env.parsed_or("TAB_SESSION_IDLE_SECS", defaults.idle_timeout.as_secs())?,
            ),
            capacity: env.parsed_or("TAB_SESSION_CAPACITY", defaults.capacity)?,
            max_upload_bytes: env.parsed_or("TAB_UPLOAD_MAX_BYTES", defaults.max_upload_bytes)?,
        };

        Ok(Self {
            database_url,
            host,
            port,
            webhook_secret,
            identity,
            tab_sessions,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl IdentityConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        // PEM keys pasted into a single-line env var usually carry literal "\n"
        let jwt_key = env.required("IDENTITY_JWT_KEY")?.replace("\\n", "\n");

        Ok(Self {
            jwt_key,
            sign_in_url: env.or_default("IDENTITY_SIGN_IN_URL", "/sign-in"),
            authorized_parties: env.list("IDENTITY_AUTHORIZED_PARTIES"),
            public_routes: env.list("IDENTITY_PUBLIC_ROUTES"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Environment accessor over a key lookup.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        (self.0)(key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, using `default` when unset.
    fn parsed_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    /// Split a comma-separated variable, dropping blanks.
    fn list(&self, key: &str) -> Vec<String> {
        self.optional(key)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get database URL with fallback to generic `DATABASE_URL`.
    fn database_url(&self, primary_key: &str) -> Result<SecretString, ConfigError> {
        self.optional(primary_key)
            .or_else(|| self.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
    }

    /// Load and validate a secret.
    fn validated_secret(&self, key: &str) -> Result<SecretString, ConfigError> {
        let value = self.required(key)?;
        validate_secret_strength(&value, key)?;
        Ok(SecretString::from(value))
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the secret issued by the identity provider."
            ),
        ));
    }

    Ok(())
}
