//! Ephemeral device-authorization session state.

/// State of one in-flight device-authorization attempt.
///
/// Lives only for the duration of the attempt: converted into a token
/// record on success, discarded on denial, expiry, or timeout. The device
/// code is the polling secret; the user code is what the human types.
#[derive(Debug, Clone)]
pub struct DeviceAuthSession {
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    pub(crate) device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    /// Verification URL with the user code pre-filled, when offered.
    pub verification_uri_complete: Option<String>,
    /// Provider poll interval in seconds; only ever adjusted upward.
    pub interval_secs: u64,
    /// Device-code lifetime declared by the provider.
    pub expires_in: i64,
}

impl DeviceAuthSession {
    /// URL to hand to the human, preferring the pre-filled variant.
    pub fn authorization_url(&self) -> &str {
        self.verification_uri_complete
            .as_deref()
            .unwrap_or(&self.verification_uri)
    }
}
