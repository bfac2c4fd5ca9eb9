//! SSO-session import: mint a token record from an existing signed-in
//! browser session instead of running the interactive device flow.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::kiro::issuer_binding_hash;
use crate::oauth::{oidc_base_url, IssuedToken};
use crate::quota::QuotaClient;
use crate::token::{StoredToken, TokenError, TokenRecord, TokenStore};

/// Shared HTTP timeout for import requests.
const SSO_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
/// Grant identifier for the session-token exchange.
const SSO_SESSION_GRANT_TYPE: &str = "urn:amazon:sso:session";

/// Importer that exchanges an SSO session cookie for token credentials.
#[derive(Debug, Clone)]
pub struct SsoImporter {
    http: reqwest::Client,
    region: String,
    start_url: String,
}

impl SsoImporter {
    pub fn new(region: impl Into<String>, start_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(SSO_HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            region: region.into(),
            start_url: start_url.into(),
        }
    }

    /// Exchange a session cookie for credentials and persist a new record.
    ///
    /// The email field is recovered from the usage endpoint when reachable;
    /// import still succeeds without it.
    pub async fn import(
        &self,
        session_cookie: &str,
        account_name: &str,
        store: &TokenStore,
        quota: Option<&QuotaClient>,
    ) -> Result<StoredToken, TokenError> {
        let (client_id, client_secret) = self.register_client().await?;
        let issued = self
            .exchange_session(&client_id, &client_secret, session_cookie)
            .await?;

        let email = match quota {
            Some(client) => match client.usage_limits(&issued.access_token).await {
                Ok(usage) => usage.user_info.and_then(|info| info.email),
                Err(err) => {
                    tracing::warn!(%err, "could not recover email from usage endpoint");
                    None
                }
            },
            None => None,
        };

        let record = build_sso_record(
            issued,
            &client_id,
            &client_secret,
            &self.region,
            &self.start_url,
            account_name,
            email,
            Utc::now(),
        );
        let file_name = store.save_new(&record)?;
        tracing::info!(file = %file_name, "imported SSO session");
        Ok(StoredToken { file_name, record })
    }

    async fn register_client(&self) -> Result<(String, String), TokenError> {
        #[derive(serde::Deserialize)]
        struct RegisterResponse {
            #[serde(rename = "clientId")]
            client_id: String,
            #[serde(rename = "clientSecret")]
            client_secret: String,
        }

        let response = self
            .http
            .post(format!("{}/client/register", oidc_base_url(&self.region)))
            .json(&serde_json::json!({
                "clientName": "kiroswitch",
                "clientType": "public",
                "grantTypes": [SSO_SESSION_GRANT_TYPE, "refresh_token"],
                "issuerUrl": self.start_url,
            }))
            .send()
            .await?;
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(TokenError::Invalid(format!(
                "client registration failed: {body}"
            )));
        }
        let payload: RegisterResponse = response.json().await?;
        Ok((payload.client_id, payload.client_secret))
    }

    async fn exchange_session(
        &self,
        client_id: &str,
        client_secret: &str,
        session_cookie: &str,
    ) -> Result<IssuedToken, TokenError> {
        let response = self
            .http
            .post(format!("{}/token", oidc_base_url(&self.region)))
            .json(&serde_json::json!({
                "clientId": client_id,
                "clientSecret": client_secret,
                "grantType": SSO_SESSION_GRANT_TYPE,
                "sessionToken": session_cookie,
            }))
            .send()
            .await?;
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(TokenError::Status(status, body));
        }
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|err| TokenError::Invalid(format!("unreadable exchange response: {err}")))
    }
}

/// Build the record for an imported session.
#[allow(clippy::too_many_arguments)]
pub fn build_sso_record(
    issued: IssuedToken,
    client_id: &str,
    client_secret: &str,
    region: &str,
    start_url: &str,
    account_name: &str,
    email: Option<String>,
    now: DateTime<Utc>,
) -> TokenRecord {
    let expires_in = issued.expires_in.unwrap_or(3600).max(60);
    let expires_at =
        (now + chrono::Duration::seconds(expires_in)).to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    TokenRecord {
        access_token: issued.access_token,
        refresh_token: issued.refresh_token,
        expires_at,
        token_type: issued.token_type.unwrap_or_else(|| "Bearer".to_string()),
        client_id_hash: Some(issuer_binding_hash(start_url)),
        account_name: account_name.to_string(),
        email,
        provider: "BuilderId".to_string(),
        auth_method: "IdC".to_string(),
        region: region.to_string(),
        created_at: Some(now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
        client_id: Some(client_id.to_string()),
        client_secret: Some(client_secret.to_string()),
        extra: issued.extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kiro;
    use crate::token::{TokenService, TokenStore};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static NEXT_TMP_ID: AtomicU64 = AtomicU64::new(1);

    fn temp_dir() -> std::path::PathBuf {
        let mut root = std::env::temp_dir();
        let id = NEXT_TMP_ID.fetch_add(1, Ordering::Relaxed);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        root.push(format!("kiroswitch-sso-test-{id}-{now}"));
        let _ = std::fs::create_dir_all(&root);
        root
    }

    fn issued() -> IssuedToken {
        serde_json::from_value(serde_json::json!({
            "accessToken": "sso-access",
            "refreshToken": "sso-refresh",
            "tokenType": "Bearer",
            "expiresIn": 28800,
        }))
        .unwrap()
    }

    // Verifies an imported record carries the provider tag, region, and a
    // readable email, and becomes current after activation.
    #[tokio::test]
    async fn imported_record_becomes_current_after_activation() {
        let dir = temp_dir();
        let store = TokenStore::new(&dir);
        let record = build_sso_record(
            issued(),
            "client-id",
            "client-secret",
            "us-east-1",
            crate::oauth::DEFAULT_START_URL,
            "imported",
            Some("user@mail.test".to_string()),
            Utc::now(),
        );
        assert_eq!(record.provider, "BuilderId");
        assert_eq!(record.region, "us-east-1");
        assert_eq!(record.email.as_deref(), Some("user@mail.test"));

        let file_name = store.save_new(&record).expect("persist record");
        let ide_auth = dir.join("ide/kiro-auth-token.json");
        let service = TokenService::new(store, &ide_auth);

        service
            .activate(&file_name, false)
            .await
            .expect("activate imported record");
        let current = service.current().expect("imported record is current");
        assert_eq!(current.file_name, file_name);
        assert_eq!(current.record, record);

        let ide_token = kiro::read_auth_token(&ide_auth).expect("ide token written");
        assert_eq!(ide_token.refresh_token.as_deref(), Some("sso-refresh"));
    }

    // Verifies import works without an email when the usage endpoint is
    // unreachable.
    #[test]
    fn build_sso_record_tolerates_missing_email() {
        let record = build_sso_record(
            issued(),
            "client-id",
            "client-secret",
            "eu-west-1",
            crate::oauth::DEFAULT_START_URL,
            "imported",
            None,
            Utc::now(),
        );
        assert!(record.email.is_none());
        assert_eq!(record.region, "eu-west-1");
        assert_eq!(record.client_id.as_deref(), Some("client-id"));
    }
}
