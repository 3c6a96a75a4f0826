//! Error types for provider operations

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Closed classification of every failure the provider reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad or missing credential, malformed configuration
    Configuration,
    /// Generic failure while translating a text
    Translation,
    /// Too many requests
    RateLimit,
    /// Request exceeded the configured timeout
    Timeout,
    /// Any other service-side failure
    Provider,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "configuration"),
            ErrorKind::Translation => write!(f, "translation"),
            ErrorKind::RateLimit => write!(f, "rate_limit"),
            ErrorKind::Timeout => write!(f, "timeout"),
            ErrorKind::Provider => write!(f, "provider"),
        }
    }
}

/// Provider-related errors
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
    },

    /// Translation rejected before or by the service
    #[error("Translation error: {message}")]
    TranslationError {
        message: String,
    },

    /// Rate limit exceeded
    #[error("Rate limit exceeded{}", retry_hint(.retry_after))]
    RateLimitError {
        retry_after: Option<u64>,
    },

    /// Character quota exceeded for the billing period
    #[error("Quota exceeded: {message}")]
    QuotaExceededError {
        message: String,
    },

    /// Request timeout
    #[error("Request timeout after {timeout_secs}s")]
    TimeoutError {
        timeout_secs: u64,
    },

    /// API request failed
    #[error("API error: {status} - {message}")]
    ApiError {
        status: u16,
        message: String,
    },

    /// Network error
    #[error("Network error: {message}")]
    NetworkError {
        message: String,
    },

    /// Invalid response from API
    #[error("Invalid response: {message}")]
    InvalidResponseError {
        message: String,
    },
}

fn retry_hint(retry_after: &Option<u64>) -> String {
    match retry_after {
        Some(secs) => format!(". Retry after {} seconds", secs),
        None => String::new(),
    }
}

impl ProviderError {
    /// Shorthand for a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        ProviderError::ConfigError {
            message: message.into(),
        }
    }

    /// Shorthand for a translation error
    pub fn translation(message: impl Into<String>) -> Self {
        ProviderError::TranslationError {
            message: message.into(),
        }
    }

    /// Classify this error into the closed taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::ConfigError { .. } => ErrorKind::Configuration,
            ProviderError::TranslationError { .. } => ErrorKind::Translation,
            ProviderError::RateLimitError { .. } => ErrorKind::RateLimit,
            ProviderError::TimeoutError { .. } => ErrorKind::Timeout,
            ProviderError::QuotaExceededError { .. }
            | ProviderError::ApiError { .. }
            | ProviderError::NetworkError { .. }
            | ProviderError::InvalidResponseError { .. } => ErrorKind::Provider,
        }
    }
}

/// Result type for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;
