//! External IDE auth-store boundary.
//!
//! The IDE owns one auth-token file; this module reads it to derive the
//! "active account" and overwrites it wholesale on activation. The file and
//! its directory layout belong to the IDE, not to this tool.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::token::{TokenError, TokenRecord};

/// Relative location of the IDE's cached auth token inside its storage root.
const AUTH_TOKEN_RELATIVE: &str = "User/globalStorage/kiro.kiroagent/cache/kiro-auth-token.json";

/// The auth payload the IDE reads. Only the fields the IDE consumes are
/// written; everything is replaced in one shot on activation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeAuthToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_at: String,
    #[serde(default)]
    pub client_id_hash: String,
    pub auth_method: String,
    pub provider: String,
    pub region: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Default IDE storage root for the current platform.
pub fn default_storage_root() -> Option<PathBuf> {
    if cfg!(target_os = "macos") {
        dirs::home_dir().map(|home| home.join("Library/Application Support/kiro"))
    } else {
        // Windows %APPDATA% and Linux ~/.config both come from config_dir.
        dirs::config_dir().map(|dir| dir.join("kiro"))
    }
}

/// Path of the IDE auth-token file under a storage root.
pub fn auth_token_path(storage_root: &Path) -> PathBuf {
    storage_root.join(AUTH_TOKEN_RELATIVE)
}

/// Read the IDE's current auth token.
///
/// Returns `None` when the file is missing or unreadable: a fresh install
/// has no active account, and a corrupt file is indistinguishable from one.
pub fn read_auth_token(path: &Path) -> Option<IdeAuthToken> {
    let text = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&text) {
        Ok(token) => Some(token),
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "unreadable IDE auth token");
            None
        }
    }
}

/// Overwrite the IDE auth token with a record's credentials.
///
/// The previous file is backed up first, then the full replacement payload
/// is written in a single call so the IDE never observes a partial token.
pub fn write_auth_token(path: &Path, record: &TokenRecord) -> Result<(), TokenError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|err| TokenError::Activation(format!("create {}: {err}", parent.display())))?;
    }

    if path.exists() {
        let stamp = Utc::now().format("%Y-%m-%dT%H-%M-%S");
        let backup = path.with_file_name(format!("kiro-auth-token.backup.{stamp}.json"));
        if let Err(err) = std::fs::copy(path, &backup) {
            tracing::warn!(%err, "failed to back up previous IDE auth token");
        }
    }

    let client_id_hash = record
        .client_id_hash
        .clone()
        .unwrap_or_else(|| issuer_binding_hash(crate::oauth::DEFAULT_START_URL));
    let payload = IdeAuthToken {
        access_token: record.access_token.clone(),
        refresh_token: Some(record.refresh_token.clone()),
        expires_at: record.expires_at.clone(),
        client_id_hash,
        auth_method: record.auth_method.clone(),
        provider: record.provider.clone(),
        region: record.region.clone(),
        extra: BTreeMap::new(),
    };
    let text = serde_json::to_string_pretty(&payload)
        .map_err(|err| TokenError::Activation(format!("serialize auth token: {err}")))?;
    std::fs::write(path, text)
        .map_err(|err| TokenError::Activation(format!("write {}: {err}", path.display())))?;
    Ok(())
}

/// SHA-256 hex digest binding a record to the issuer URL it was minted from.
pub fn issuer_binding_hash(start_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(start_url.as_bytes());
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static NEXT_TMP_ID: AtomicU64 = AtomicU64::new(1);

    fn temp_auth_path() -> PathBuf {
        let mut root = std::env::temp_dir();
        let id = NEXT_TMP_ID.fetch_add(1, Ordering::Relaxed);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        root.push(format!("kiroswitch-ide-test-{id}-{now}"));
        auth_token_path(&root)
    }

    fn sample_record() -> TokenRecord {
        TokenRecord {
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            expires_at: "2026-03-01T10:00:00Z".into(),
            token_type: "Bearer".into(),
            client_id_hash: Some("abc123".into()),
            account_name: "auto".into(),
            email: None,
            provider: "BuilderId".into(),
            auth_method: "IdC".into(),
            region: "us-east-1".into(),
            created_at: None,
            client_id: Some("client".into()),
            client_secret: Some("secret".into()),
            extra: BTreeMap::new(),
        }
    }

    // Verifies activation writes a complete payload the read side parses.
    #[test]
    fn write_then_read_round_trips_credentials() {
        let path = temp_auth_path();
        write_auth_token(&path, &sample_record()).expect("write auth token");

        let token = read_auth_token(&path).expect("read auth token");
        assert_eq!(token.access_token, "access");
        assert_eq!(token.refresh_token.as_deref(), Some("refresh"));
        assert_eq!(token.client_id_hash, "abc123");
        assert_eq!(token.provider, "BuilderId");
    }

    // Verifies a second activation backs up the previous token file.
    #[test]
    fn overwrite_creates_backup() {
        let path = temp_auth_path();
        write_auth_token(&path, &sample_record()).expect("first write");
        let mut second = sample_record();
        second.access_token = "access-2".into();
        write_auth_token(&path, &second).expect("second write");

        let dir = path.parent().unwrap();
        let backups = std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with("kiro-auth-token.backup.")
            })
            .count();
        assert_eq!(backups, 1);
        assert_eq!(
            read_auth_token(&path).unwrap().access_token,
            "access-2"
        );
    }

    // Verifies missing and malformed files both read as "no active account".
    #[test]
    fn missing_or_corrupt_file_reads_as_none() {
        let path = temp_auth_path();
        assert!(read_auth_token(&path).is_none());

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        assert!(read_auth_token(&path).is_none());
    }

    // Verifies the issuer binding hash is the SHA-256 of the start URL.
    #[test]
    fn issuer_binding_hash_is_sha256_hex() {
        let hash = issuer_binding_hash("https://view.awsapps.com/start");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        // Stable across calls.
        assert_eq!(hash, issuer_binding_hash("https://view.awsapps.com/start"));
    }
}
