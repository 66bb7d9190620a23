//! Error taxonomy shared by every Vortex endpoint.
//!
//! Validation and access-control failures are detected locally and carry a
//! client-facing message. Everything unexpected (hook failures, Vortex API
//! failures, store misconfiguration) becomes `Internal`, whose detail is only
//! ever logged.

use std::fmt;

use crate::store::ConfigError;

/// Message returned to clients for any internal failure.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred while processing your request";

/// Errors produced while handling a Vortex request.
#[derive(Debug, Clone)]
pub enum VortexError {
    /// Client input is missing or malformed (400).
    Validation(String),

    /// No identity could be resolved where one is mandatory (401).
    Unauthorized,

    /// An access hook refused the request, or no hook is registered and
    /// no user was resolved (403).
    AccessDenied(String),

    /// The route exists but not for this HTTP method (405).
    MethodNotAllowed,

    /// The adapter is configured in a way that cannot serve this endpoint (500).
    Configuration(String),

    /// Unexpected failure; the detail stays server-side (500).
    Internal(String),
}

impl fmt::Display for VortexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "Validation error: {}", msg),
            Self::Unauthorized => write!(f, "Unauthorized"),
            Self::AccessDenied(msg) => write!(f, "{}", msg),
            Self::MethodNotAllowed => write!(f, "Method not allowed"),
            Self::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            Self::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for VortexError {}

impl VortexError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// The access hook returned `false`.
    pub fn access_denied() -> Self {
        Self::AccessDenied("Access denied".to_string())
    }

    /// No access hook is registered and the request carries no user.
    pub fn access_requires_user() -> Self {
        Self::AccessDenied(
            "Access denied. Configure access control hooks for invitation endpoints.".to_string(),
        )
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Unauthorized => 401,
            Self::AccessDenied(_) => 403,
            Self::MethodNotAllowed => 405,
            Self::Configuration(_) | Self::Internal(_) => 500,
        }
    }

    /// Message safe to return in the `{error}` body.
    pub fn client_message(&self) -> String {
        match self {
            Self::Validation(msg) | Self::AccessDenied(msg) | Self::Configuration(msg) => {
                msg.clone()
            }
            Self::Unauthorized => "Unauthorized".to_string(),
            Self::MethodNotAllowed => "Method not allowed".to_string(),
            Self::Internal(_) => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

/// Result type for Vortex request handling.
pub type VortexResult<T> = Result<T, VortexError>;

impl From<anyhow::Error> for VortexError {
    fn from(err: anyhow::Error) -> Self {
        // `{:#}` keeps the context chain on a single line for the log.
        Self::Internal(format!("{:#}", err))
    }
}

impl From<ConfigError> for VortexError {
    fn from(err: ConfigError) -> Self {
        Self::Internal(err.to_string())
    }
}
