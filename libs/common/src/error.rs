//! Custom error types for the mete client
//!
//! This module defines the error kinds every layer of the client reports:
//! transport failures, server rejections, malformed payloads, operations the
//! active protocol version cannot express and unresolved user queries.

use thiserror::Error;

use crate::api_version::ApiVersion;

/// Custom error type for mete operations
#[derive(Error, Debug)]
pub enum MeteError {
    /// The request never produced an HTTP response
    #[error("Connection error: {message}")]
    Transport { message: String },

    /// The server answered with a non-2xx status
    #[error("Server error: {status}{}", server_reason(.body))]
    Server { status: u16, body: String },

    /// The response JSON is missing required fields or has the wrong shape
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    /// The active protocol version has no way to express this operation
    #[error("{operation} is not supported by API version '{version}'")]
    UnsupportedOperation {
        operation: &'static str,
        version: ApiVersion,
    },

    /// The resolver could not pick exactly one entity
    #[error("{}", no_match_message(.query, .candidates))]
    NoMatch {
        query: String,
        candidates: Vec<String>,
    },

    /// Missing or inconsistent configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// An argument was rejected before anything was sent
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

/// Type alias for Result with MeteError
pub type MeteResult<T> = Result<T, MeteError>;

impl MeteError {
    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        MeteError::Transport {
            message: message.into(),
        }
    }

    /// Create a server error from a status and the raw response body
    pub fn server(status: u16, body: impl Into<String>) -> Self {
        MeteError::Server {
            status,
            body: body.into(),
        }
    }

    /// Create a malformed response error
    pub fn malformed(message: impl Into<String>) -> Self {
        MeteError::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported(operation: &'static str, version: ApiVersion) -> Self {
        MeteError::UnsupportedOperation { operation, version }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        MeteError::Config {
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        MeteError::InvalidInput {
            message: message.into(),
        }
    }

    /// Get exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            MeteError::Config { .. } => 1,
            MeteError::InvalidInput { .. } => 2,
            MeteError::Transport { .. } => 3,
            MeteError::Server { .. } => 4,
            MeteError::MalformedResponse { .. } => 5,
            MeteError::UnsupportedOperation { .. } => 6,
            MeteError::NoMatch { .. } => 7,
        }
    }
}

fn server_reason(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(" - {}", trimmed)
    }
}

fn no_match_message(query: &str, candidates: &[String]) -> String {
    if candidates.is_empty() {
        format!("No match was found for '{}'.", query)
    } else {
        format!(
            "No exact match was found for '{}'. Possibilities: {}",
            query,
            candidates.join(", ")
        )
    }
}
