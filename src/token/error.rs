//! Token subsystem error definitions.

use std::fmt;

/// Errors surfaced by token storage, refresh, and activation.
#[derive(Debug)]
pub enum TokenError {
    /// No record file exists under the given name.
    NotFound(String),
    Io(std::io::Error),
    Http(reqwest::Error),
    /// Non-2xx response from the identity provider.
    Status(u16, String),
    Invalid(String),
    /// The provider declared the refresh token invalid or revoked.
    /// The record is left on disk for inspection.
    RefreshRejected(String),
    /// The external IDE auth store could not be written.
    Activation(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(name) => write!(f, "token `{name}` not found"),
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Http(err) => write!(f, "http: {err}"),
            Self::Status(code, body) => write!(f, "status {code}: {body}"),
            Self::Invalid(msg) => write!(f, "{msg}"),
            Self::RefreshRejected(msg) => {
                write!(f, "refresh rejected by provider: {msg}")
            }
            Self::Activation(msg) => write!(f, "activation failed: {msg}"),
        }
    }
}

impl std::error::Error for TokenError {}

impl From<std::io::Error> for TokenError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<reqwest::Error> for TokenError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}
