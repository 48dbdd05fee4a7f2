use std::time::Duration;

use doer_core::policy::{ActivationPolicy, TrainingScope, DEFAULT_PASS_THRESHOLD_PERCENT};
use doer_core::retry::RetryPolicy;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development except
/// the JWT secret. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long background services get to drain after shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// JWT validation settings.
    pub jwt: JwtConfig,
    /// Quiz pass mark and training scope.
    pub activation: ActivationPolicy,
    /// Backoff applied to every store call.
    pub store_retry: RetryPolicy,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                 |
    /// |--------------------------------|-------------------------|
    /// | `HOST`                         | `0.0.0.0`               |
    /// | `PORT`                         | `3000`                  |
    /// | `CORS_ORIGINS`                 | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`         | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`        | `30`                    |
    /// | `ACTIVATION_QUIZ_PASS_PERCENT` | `70`                    |
    /// | `ACTIVATION_TRAINING_SCOPE`    | `required`              |
    /// | `STORE_RETRY_ATTEMPTS`         | `3`                     |
    /// | `STORE_RETRY_INITIAL_MS`       | `200`                   |
    ///
    /// # Panics
    ///
    /// Panics on malformed values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let jwt = JwtConfig::from_env();

        let pass_threshold_percent: u8 = std::env::var("ACTIVATION_QUIZ_PASS_PERCENT")
            .unwrap_or_else(|_| DEFAULT_PASS_THRESHOLD_PERCENT.to_string())
            .parse()
            .expect("ACTIVATION_QUIZ_PASS_PERCENT must be a valid u8");

        let training_scope = TrainingScope::parse(
            &std::env::var("ACTIVATION_TRAINING_SCOPE").unwrap_or_else(|_| "required".into()),
        )
        .unwrap_or_else(|e| panic!("ACTIVATION_TRAINING_SCOPE: {e}"));

        let activation = ActivationPolicy::new(pass_threshold_percent, training_scope)
            .unwrap_or_else(|e| panic!("ACTIVATION_QUIZ_PASS_PERCENT: {e}"));

        let defaults = RetryPolicy::default();

        let max_attempts: u32 = std::env::var("STORE_RETRY_ATTEMPTS")
            .unwrap_or_else(|_| defaults.max_attempts.to_string())
            .parse()
            .expect("STORE_RETRY_ATTEMPTS must be a valid u32");
        assert!(max_attempts >= 1, "STORE_RETRY_ATTEMPTS must be at least 1");

        let initial_delay_ms: u64 = std::env::var("STORE_RETRY_INITIAL_MS")
            .unwrap_or_else(|_| (defaults.initial_delay.as_millis() as u64).to_string())
            .parse()
            .expect("STORE_RETRY_INITIAL_MS must be a valid u64");

        let store_retry = RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(initial_delay_ms),
            ..defaults
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt,
            activation,
            store_retry,
        }
    }
}
