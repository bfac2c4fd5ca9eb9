//! Token lifecycle operations over the store and the IDE auth slot.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::kiro;
use crate::oauth;

use super::error::TokenError;
use super::record::TokenRecord;
use super::store::{StoredToken, TokenStore};

/// Shared HTTP timeout for token-endpoint requests.
const REFRESH_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Token endpoint response for a `refresh_token` grant.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshGrant {
    pub access_token: Option<String>,
    /// Present only when the provider rotates the refresh token.
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

/// Lifecycle operations: enumerate, resolve current/best, refresh, activate,
/// delete. Paths are injected so tests run against temp directories.
#[derive(Debug, Clone)]
pub struct TokenService {
    store: TokenStore,
    ide_auth_path: PathBuf,
    http: reqwest::Client,
}

impl TokenService {
    pub fn new(store: TokenStore, ide_auth_path: impl Into<PathBuf>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REFRESH_HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            store,
            ide_auth_path: ide_auth_path.into(),
            http,
        }
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// All readable records.
    pub fn list(&self) -> Vec<StoredToken> {
        self.store.list()
    }

    /// One record by file name.
    pub fn get(&self, file_name: &str) -> Result<StoredToken, TokenError> {
        self.store.load(file_name)
    }

    /// Resolve a record by file name, account name, or file-name fragment.
    pub fn find(&self, name: &str) -> Result<StoredToken, TokenError> {
        if let Ok(token) = self.store.load(name) {
            return Ok(token);
        }
        self.store
            .list()
            .into_iter()
            .find(|token| token.record.account_name == name || token.file_name.contains(name))
            .ok_or_else(|| TokenError::NotFound(name.to_string()))
    }

    /// The record currently configured in the IDE, if any.
    ///
    /// "Active" is derived by comparing refresh-token secrets against the
    /// IDE's own auth file; it is never stored locally. At most one record
    /// can match because the secret is unique per record.
    pub fn current(&self) -> Option<StoredToken> {
        let ide_token = kiro::read_auth_token(&self.ide_auth_path)?;
        let secret = ide_token.refresh_token?;
        self.store
            .list()
            .into_iter()
            .find(|token| token.record.refresh_token == secret)
    }

    /// Best record to use when none is named: the active one, else the
    /// newest non-expired record, else the newest record of any state.
    pub fn best(&self) -> Option<StoredToken> {
        if let Some(current) = self.current() {
            return Some(current);
        }
        let mut tokens = self.store.list();
        if tokens.is_empty() {
            return None;
        }
        tokens.sort_by_key(|token| std::cmp::Reverse(creation_stamp_millis(token)));
        let now = Utc::now();
        tokens
            .iter()
            .find(|token| !token.record.is_expired_at(now))
            .cloned()
            .or_else(|| tokens.into_iter().next())
    }

    /// Exchange the record's refresh token for a new access token and
    /// persist the updated record to its own file.
    pub async fn refresh(&self, file_name: &str) -> Result<StoredToken, TokenError> {
        let token = self.store.load(file_name)?;
        let (client_id, client_secret) = match (&token.record.client_id, &token.record.client_secret)
        {
            (Some(id), Some(secret)) => (id.clone(), secret.clone()),
            _ => {
                return Err(TokenError::Invalid(format!(
                    "record `{file_name}` is missing refresh client credentials"
                )))
            }
        };

        let endpoint = format!("{}/token", oauth::oidc_base_url(&token.record.region));
        let response = self
            .http
            .post(&endpoint)
            .json(&serde_json::json!({
                "clientId": client_id,
                "clientSecret": client_secret,
                "grantType": "refresh_token",
                "refreshToken": token.record.refresh_token,
            }))
            .send()
            .await?;

        let status = response.status().as_u16();
        if status == 400 || status == 401 {
            // The provider declared the refresh token invalid. The record is
            // left on disk; the caller decides whether to re-run login.
            let body = response.text().await.unwrap_or_default();
            return Err(TokenError::RefreshRejected(body));
        }
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(TokenError::Status(status, body));
        }

        let grant: RefreshGrant = response.json().await?;
        let updated = apply_refresh_grant(&token.record, grant, Utc::now())?;
        self.store.save(file_name, &updated)?;
        tracing::debug!(file = %file_name, "token refreshed");
        Ok(StoredToken {
            file_name: file_name.to_string(),
            record: updated,
        })
    }

    /// Make a record the one the IDE uses.
    ///
    /// Refreshes first when forced or expired, then overwrites the IDE auth
    /// file with the full replacement payload in a single write.
    pub async fn activate(
        &self,
        file_name: &str,
        force_refresh: bool,
    ) -> Result<StoredToken, TokenError> {
        let mut token = self.store.load(file_name)?;
        if force_refresh || token.record.is_expired() {
            token = self.refresh(file_name).await?;
        }
        kiro::write_auth_token(&self.ide_auth_path, &token.record)?;
        tracing::info!(account = %token.record.account_name, "activated account");
        Ok(token)
    }

    /// Delete one record by file name.
    pub fn delete(&self, file_name: &str) -> Result<(), TokenError> {
        self.store.delete(file_name)
    }

    /// Delete every expired record, best effort. Returns the count deleted.
    ///
    /// One record's failure never aborts the batch; unreadable files are
    /// already skipped by `list` and therefore left untouched.
    pub fn delete_all_expired(&self) -> usize {
        let now = Utc::now();
        let mut deleted = 0;
        for token in self.store.list() {
            if !token.record.is_expired_at(now) {
                continue;
            }
            match self.store.delete(&token.file_name) {
                Ok(()) => deleted += 1,
                Err(err) => {
                    tracing::warn!(file = %token.file_name, %err, "failed to delete expired record");
                }
            }
        }
        deleted
    }
}

/// Apply a refresh grant to a record, preserving its identity fields.
///
/// Only the access token and expiry change; the refresh token is kept
/// unless the provider explicitly rotated it.
pub fn apply_refresh_grant(
    record: &TokenRecord,
    grant: RefreshGrant,
    now: DateTime<Utc>,
) -> Result<TokenRecord, TokenError> {
    let access_token = grant.access_token.unwrap_or_default().trim().to_string();
    if access_token.is_empty() {
        return Err(TokenError::Invalid(
            "refresh response did not include accessToken".to_string(),
        ));
    }
    let expires_in = grant.expires_in.unwrap_or(3600).max(60);
    let mut updated = record.clone();
    updated.access_token = access_token;
    if let Some(rotated) = grant.refresh_token {
        let rotated = rotated.trim().to_string();
        if !rotated.is_empty() {
            updated.refresh_token = rotated;
        }
    }
    updated.expires_at = (now + chrono::Duration::seconds(expires_in))
        .to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    Ok(updated)
}

/// Millisecond creation stamp for ordering, from `createdAt` or the
/// file-name suffix for records that predate the field.
fn creation_stamp_millis(token: &StoredToken) -> i64 {
    if let Some(created) = token.record.created_at_utc() {
        return created.timestamp_millis();
    }
    token
        .file_name
        .trim_end_matches(".json")
        .rsplit('-')
        .next()
        .and_then(|stamp| stamp.parse().ok())
        .unwrap_or(0)
}
