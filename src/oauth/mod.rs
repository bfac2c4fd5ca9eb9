//! OAuth device-authorization flow.
//!
//! Dynamic client registration, device-code issuance, and token polling
//! against the provider's OIDC service. Produces token records consumed by
//! the token store.

mod device;
mod error;
mod session;

pub use device::{
    build_token_record, oidc_base_url, DeviceFlowClient, IssuedToken, DEFAULT_AUTH_TIMEOUT,
    DEFAULT_POLL_INTERVAL_SECS, DEFAULT_REGION, DEFAULT_START_URL,
};
pub use error::DeviceFlowError;
pub use session::DeviceAuthSession;
