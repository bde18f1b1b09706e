//! SDK configuration module
//! Handles environment variable loading, configuration validation, and billing settings

use std::env;
use std::str::FromStr;

pub const SANDBOX_BASE_URL: &str = "http://127.0.0.1:1180/v1";
pub const PROD_BASE_URL: &str = "https://pay.akouendy.com/v1";
pub const DEFAULT_USER_AGENT: &str = "akouendy-billing-api-sdk/v1.0";

/// Billing service environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Sandbox,
    Prod,
}

impl Environment {
    /// Parse an environment selector. Unrecognized values fall back to sandbox.
    pub fn from_selector(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "prod" => Environment::Prod,
            _ => Environment::Sandbox,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Sandbox => "sandbox",
            Environment::Prod => "prod",
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Sandbox => SANDBOX_BASE_URL,
            Environment::Prod => PROD_BASE_URL,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Environment::from_selector(value))
    }
}

/// What to do with a 2xx response whose body is not the expected JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Fail the call with `BillingError::Decode`
    #[default]
    Strict,
    /// Legacy behavior: log, succeed with a default response and no record
    Lenient,
}

/// Billing SDK configuration, built once and shared by reference
#[derive(Debug, Clone)]
pub struct BillingConfig {
    pub environment: Environment,
    pub base_url: String,
    /// Shared secret used for webhook signatures
    pub app_token: String,
    /// Public base URL of the calling application, used to build webhook URLs
    pub app_base_url: String,
    pub debug: bool,
    pub user_agent: String,
    pub request_timeout: u64, // seconds
    pub decode_policy: DecodePolicy,
}

impl BillingConfig {
    pub fn new(environment: Environment, app_token: impl Into<String>) -> Self {
        Self {
            environment,
            base_url: environment.base_url().to_string(),
            app_token: app_token.into(),
            app_base_url: String::new(),
            debug: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: 30,
            decode_policy: DecodePolicy::Strict,
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenv::dotenv().ok();

        let environment =
            Environment::from_selector(&env::var("BILLING_ENV").unwrap_or_default());

        Ok(BillingConfig {
            environment,
            base_url: env::var("BILLING_BASE_URL")
                .unwrap_or_else(|_| environment.base_url().to_string()),
            app_token: env::var("BILLING_APP_TOKEN")
                .map_err(|_| ConfigError::MissingVariable("BILLING_APP_TOKEN".to_string()))?,
            app_base_url: env::var("BILLING_APP_BASE_URL").unwrap_or_default(),
            debug: parse_flag("BILLING_DEBUG")?,
            user_agent: env::var("BILLING_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            request_timeout: env::var("BILLING_REQUEST_TIMEOUT")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BILLING_REQUEST_TIMEOUT".to_string()))?,
            decode_policy: if parse_flag("BILLING_LENIENT_DECODE")? {
                DecodePolicy::Lenient
            } else {
                DecodePolicy::Strict
            },
        })
    }

    pub fn with_app_base_url(mut self, app_base_url: impl Into<String>) -> Self {
        self.app_base_url = app_base_url.into();
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_decode_policy(mut self, decode_policy: DecodePolicy) -> Self {
        self.decode_policy = decode_policy;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_token.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "BILLING_APP_TOKEN cannot be empty".to_string(),
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "BILLING_BASE_URL must be a valid URL".to_string(),
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::InvalidValue(
                "BILLING_REQUEST_TIMEOUT".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_flag(name: &str) -> Result<bool, ConfigError> {
    env::var(name)
        .unwrap_or_else(|_| "false".to_string())
        .trim()
        .to_lowercase()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout: u64,   // seconds
    pub idle_timeout: Option<u64>, // seconds
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(DatabaseConfig {
            url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::MissingVariable("DATABASE_URL".to_string()))?,
            max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()))?,
            min_connections: env::var("DB_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_MIN_CONNECTIONS".to_string()))?,
            connection_timeout: env::var("DB_CONNECTION_TIMEOUT")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_CONNECTION_TIMEOUT".to_string()))?,
            idle_timeout: env::var("DB_IDLE_TIMEOUT")
                .ok()
                .and_then(|val| val.parse().ok()),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::InvalidValue("DATABASE_URL".to_string()));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::InvalidValue(
                "DB_MIN_CONNECTIONS must be <= DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log format options
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Plain,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            format: LogFormat::Plain,
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "plain".to_string())
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Plain,
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];
        if !valid_levels.contains(&self.level.to_uppercase().as_str()) {
            return Err(ConfigError::InvalidValue("LOG_LEVEL".to_string()));
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),

    #[error("Invalid value for configuration: {0}")]
    InvalidValue(String),
}
