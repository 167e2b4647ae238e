//! Unified error types for the analytics gateway.
//!
//! Every fallible path carries an explicit kind so the HTTP layer can map
//! status codes from a table instead of sniffing message text.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the gateway.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad user input: unknown field, malformed query shape, invalid value.
    #[error("{0}")]
    Validation(String),

    /// Query exceeds a configured resource bound (group count, time range,
    /// point count).
    #[error("{0}")]
    ResourceLimit(String),

    /// Missing or wrong API key.
    #[error("unauthorized: {0}")]
    Auth(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Store-level failure, wraps the underlying driver error text.
    #[error("store error: {0}")]
    Store(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn resource_limit(msg: impl Into<String>) -> Self {
        Self::ResourceLimit(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status code for this error kind.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::ResourceLimit(_) => 400,
            Self::Serialization(_) => 400,
            Self::Auth(_) => 401,
            Self::NotFound(_) => 404,
            Self::Store(_) => 500,
            Self::Internal(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(Error::validation("invalid field: foo").http_status(), 400);
        assert_eq!(
            Error::resource_limit("too many group by fields").http_status(),
            400
        );
        assert_eq!(Error::auth("missing api key").http_status(), 401);
        assert_eq!(Error::not_found("no such label").http_status(), 404);
        assert_eq!(Error::store("connection refused").http_status(), 500);
        assert_eq!(Error::internal("boom").http_status(), 500);
    }

    #[test]
    fn message_passthrough() {
        let err = Error::validation("invalid data field name: x;y");
        assert_eq!(err.to_string(), "invalid data field name: x;y");
    }
}
