use thiserror::Error;

use crate::client::providers::ProviderError;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (permanent failures)
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Environment error: {0}")]
    Env(#[from] envy::Error),

    // I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    // Network errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Timeout error: operation timed out")]
    Timeout,

    // Client errors
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Unknown source: {name}")]
    UnknownSource { name: String },

    // Parse errors
    #[error("Parse error in {context}: {message}")]
    Parse { context: String, message: String },

    // General service error
    #[error("Service error: {0}")]
    Service(String),

    // Provider errors
    #[error("Provider error: {0}")]
    Provider(String),
}

impl Error {
    /// Whether the caller is at fault (bad request) rather than the service
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput { .. } | Self::UnknownSource { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// Provider error conversion
impl From<ProviderError> for Error {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Network(msg) => Self::Provider(format!("Network error: {msg}")),
            ProviderError::Parse(msg) => Self::Parse {
                context: "provider".to_string(),
                message: msg,
            },
            ProviderError::RateLimit => Self::Provider("Rate limit exceeded".to_string()),
            ProviderError::Auth(msg) => Self::Provider(format!("Authentication failed: {msg}")),
            ProviderError::InvalidQuery(msg) => Self::InvalidInput {
                field: "query".to_string(),
                reason: msg,
            },
            ProviderError::ServiceUnavailable(msg) => {
                Self::Provider(format!("Service unavailable: {msg}"))
            }
            ProviderError::Timeout => Self::Timeout,
            ProviderError::Other(msg) => Self::Provider(msg),
        }
    }
}
