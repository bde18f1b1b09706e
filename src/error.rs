//! Error types for the billing SDK
//!
//! Every failure is terminal for the call that produced it; nothing here is
//! retried. A webhook signature mismatch is not an error and never appears here.

use crate::config::ConfigError;
use crate::database::error::DatabaseError;
use thiserror::Error;

pub type BillingResult<T> = Result<T, BillingError>;

/// Where a caller-supplied hook aborted the call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    BeforeRequest,
    AfterResponse,
}

impl std::fmt::Display for HookStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookStage::BeforeRequest => write!(f, "before_request"),
            HookStage::AfterResponse => write!(f, "after_response"),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum BillingError {
    /// Transport-level failure, message carried verbatim from the HTTP client
    #[error("{message}")]
    Network { message: String },

    /// Non-2xx response; the raw body is the error text
    #[error("{body}")]
    Http { status: u16, body: String },

    #[error("Decode error: {message}")]
    Decode { message: String, body: String },

    #[error("Encode error: {message}")]
    Encode { message: String },

    #[error("Invalid URL: {message}")]
    InvalidUrl { message: String },

    #[error("Hook aborted call at {stage}: {message}")]
    Hook { stage: HookStage, message: String },

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BillingError {
    pub fn hook(stage: HookStage, message: impl Into<String>) -> Self {
        BillingError::Hook {
            stage,
            message: message.into(),
        }
    }

    /// HTTP status of a rejected call, if the service answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            BillingError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the billing service answered with a non-2xx status
    pub fn is_rejection(&self) -> bool {
        matches!(self, BillingError::Http { .. })
    }
}

impl From<reqwest::Error> for BillingError {
    fn from(err: reqwest::Error) -> Self {
        BillingError::Network {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_displays_raw_body() {
        let err = BillingError::Http {
            status: 404,
            body: r#"{"error":"not found"}"#.to_string(),
        };
        assert_eq!(err.to_string(), r#"{"error":"not found"}"#);
        assert_eq!(err.status_code(), Some(404));
        assert!(err.is_rejection());
    }

    #[test]
    fn hook_error_names_stage() {
        let err = BillingError::hook(HookStage::BeforeRequest, "denied");
        assert_eq!(err.to_string(), "Hook aborted call at before_request: denied");
        assert!(!err.is_rejection());
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn config_error_is_transparent() {
        let err: BillingError = ConfigError::MissingVariable("BILLING_APP_TOKEN".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Missing environment variable: BILLING_APP_TOKEN"
        );
    }
}
