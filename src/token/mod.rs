//! Token lifecycle: durable credential records and the IDE's active slot.
//!
//! One JSON file per account under the tokens directory; the "active"
//! record is derived by comparing refresh-token secrets against the
//! external IDE's own auth file, never stored here.

mod error;
mod record;
mod service;
mod store;

pub use error::TokenError;
pub use record::{parse_timestamp, TokenRecord};
pub use service::{apply_refresh_grant, RefreshGrant, TokenService};
pub use store::{record_file_name, StoredToken, TokenStore};

#[cfg(test)]
pub(crate) mod testutil {
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::TokenRecord;

    /// Monotonic id source used to avoid temp-path collisions in tests.
    static NEXT_TMP_ID: AtomicU64 = AtomicU64::new(1);

    /// Build an isolated temp tokens directory for one test case.
    pub fn temp_tokens_dir() -> PathBuf {
        let mut root = std::env::temp_dir();
        let id = NEXT_TMP_ID.fetch_add(1, Ordering::Relaxed);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        root.push(format!("kiroswitch-tokens-test-{id}-{now}"));
        let _ = std::fs::create_dir_all(&root);
        root
    }

    /// A record with the given identity and expiry, everything else fixed.
    pub fn sample_record(account_name: &str, refresh_token: &str, expires_at: &str) -> TokenRecord {
        TokenRecord {
            access_token: format!("access-{account_name}"),
            refresh_token: refresh_token.to_string(),
            expires_at: expires_at.to_string(),
            token_type: "Bearer".into(),
            client_id_hash: None,
            account_name: account_name.to_string(),
            email: None,
            provider: "BuilderId".into(),
            auth_method: "IdC".into(),
            region: "us-east-1".into(),
            created_at: None,
            client_id: Some("client-id".into()),
            client_secret: Some("client-secret".into()),
            extra: BTreeMap::new(),
        }
    }
}
