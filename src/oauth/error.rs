//! Device-flow error definitions.

use std::fmt;

/// Terminal failures of one device-authorization attempt.
///
/// Every variant discards the in-flight session; no token record is
/// created. The provider's device code is left to expire on its own.
#[derive(Debug)]
pub enum DeviceFlowError {
    /// Dynamic client registration failed. Indicates misconfiguration, not
    /// a transient fault, so it is never retried.
    Registration(String),
    Http(reqwest::Error),
    Status(u16, String),
    Invalid(String),
    /// The provider declared the device code expired.
    Expired,
    /// The human denied the authorization request.
    Denied,
    /// The overall authorization wait elapsed.
    Timeout,
    /// The caller abandoned the poll.
    Cancelled,
}

impl fmt::Display for DeviceFlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registration(msg) => write!(f, "client registration failed: {msg}"),
            Self::Http(err) => write!(f, "http: {err}"),
            Self::Status(code, body) => write!(f, "status {code}: {body}"),
            Self::Invalid(msg) => write!(f, "{msg}"),
            Self::Expired => write!(f, "device code expired"),
            Self::Denied => write!(f, "access denied by user"),
            Self::Timeout => write!(f, "authorization timed out"),
            Self::Cancelled => write!(f, "authorization cancelled"),
        }
    }
}

impl std::error::Error for DeviceFlowError {}

impl From<reqwest::Error> for DeviceFlowError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}
