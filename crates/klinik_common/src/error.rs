use std::fmt;
use thiserror::Error;

use crate::services::StoreError;

/// Infrastructure-level error shared by all Klinik crates.
///
/// Business rejections of the booking actions are not modelled here; they are
/// answered with HTTP 200 and a `success: false` body. This type covers the
/// failures that sit outside an action: malformed requests, configuration,
/// authentication and the spreadsheet store.
#[derive(Error, Debug)]
pub enum KlinikError {
    /// Error occurred while parsing data
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred during authentication or authorization
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Error occurred during validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The spreadsheet store failed
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for KlinikError {
    fn status_code(&self) -> u16 {
        match self {
            KlinikError::ParseError(_) => 400,
            KlinikError::ConfigError(_) => 500,
            KlinikError::AuthError(_) => 401,
            KlinikError::ValidationError(_) => 400,
            KlinikError::StoreError(_) => 502,
            KlinikError::InternalError(_) => 500,
        }
    }
}

impl KlinikError {
    /// Stable machine-readable code sent alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            KlinikError::ParseError(_) => "PARSE_ERROR",
            KlinikError::ConfigError(_) => "CONFIG_ERROR",
            KlinikError::AuthError(_) => "AUTH_ERROR",
            KlinikError::ValidationError(_) => "VALIDATION_ERROR",
            KlinikError::StoreError(_) => "STORE_ERROR",
            KlinikError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

/// A trait for adding context to errors.
pub trait Context<T, E> {
    /// Adds context to an error.
    fn context<C>(self, context: C) -> Result<T, KlinikError>
    where
        C: fmt::Display + Send + Sync + 'static;

    /// Adds context to an error with a lazy context provider.
    fn with_context<C, F>(self, f: F) -> Result<T, KlinikError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E: fmt::Display> Context<T, E> for Result<T, E> {
    fn context<C>(self, context: C) -> Result<T, KlinikError>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|error| KlinikError::InternalError(format!("{}: {}", context, error)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, KlinikError>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|error| KlinikError::InternalError(format!("{}: {}", f(), error)))
    }
}

// Common error conversions
impl From<serde_json::Error> for KlinikError {
    fn from(err: serde_json::Error) -> Self {
        KlinikError::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for KlinikError {
    fn from(err: std::io::Error) -> Self {
        KlinikError::InternalError(err.to_string())
    }
}

pub fn config_error<T: fmt::Display>(message: T) -> KlinikError {
    KlinikError::ConfigError(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(KlinikError::ParseError("x".into()).status_code(), 400);
        assert_eq!(config_error("missing").status_code(), 500);
        let wrapped: Result<(), KlinikError> = Err::<(), _>("timed out").context("Binding listener");
        assert_eq!(
            wrapped.unwrap_err().to_string(),
            "Internal error: Binding listener: timed out"
        );
        let store: KlinikError = StoreError::MissingSheet("bookings".into()).into();
        assert_eq!(store.status_code(), 502);
        assert_eq!(store.code(), "STORE_ERROR");
    }

    #[test]
    fn context_wraps_display_errors() {
        let result: Result<(), &str> = Err("boom");
        let err = result.context("binding listener").unwrap_err();
        assert_eq!(err.to_string(), "Internal error: binding listener: boom");
    }
}
