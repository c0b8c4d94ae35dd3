//! Error handling for the cities console
//!
//! Transport failures are classified once (`TransportError`) and then
//! recontextualized by the domain layer with an operation prefix
//! (`ConsoleError::Operation`), so the UI can show
//! "Failed to fetch cities: <detail>" without losing the root cause.

use thiserror::Error;

use crate::validation::ValidationErrors;

/// Failure of a single HTTP exchange.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// No response reached the client (connection refused, DNS, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The server answered 2xx but the body could not be decoded.
    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Main error type for console operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConsoleError {
    /// A remote call failed; `operation` is the user-facing prefix.
    #[error("{operation}: {source}")]
    Operation {
        operation: &'static str,
        #[source]
        source: TransportError,
    },

    /// Client-side validation blocked the request before it hit the network.
    #[error("{0}")]
    Validation(ValidationErrors),

    /// Lookup by id found nothing.
    #[error("City with ID {0} not found")]
    NotFound(i64),

    /// Realtime channel failure. Non-fatal, the channel recovers on its own.
    #[error("Realtime channel error: {0}")]
    Channel(String),

    /// Malformed user input that is not tied to a form field.
    #[error("{0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ConsoleError {
    /// Wrap a transport failure with an operation prefix.
    pub fn operation(operation: &'static str, source: TransportError) -> Self {
        ConsoleError::Operation { operation, source }
    }

    /// HTTP status of the underlying failure, if the server responded.
    pub fn status(&self) -> Option<u16> {
        match self {
            ConsoleError::Operation { source, .. } => source.status(),
            ConsoleError::NotFound(_) => Some(404),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_network(&self) -> bool {
        matches!(
            self,
            ConsoleError::Operation {
                source: TransportError::Network(_),
                ..
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;

/// Message for a failed status when the body carries no usable message.
pub fn status_message(status: u16) -> String {
    let category = match status {
        400 => "Invalid request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not found",
        409 => "Conflict",
        422 => "Validation failed",
        500..=599 => "Server error",
        _ => "Request failed",
    };
    format!("{} (HTTP {})", category, status)
}
