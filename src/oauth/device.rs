//! Device-authorization flow against the provider's OIDC endpoints.
//!
//! The attempt moves through: client registration, device-code issuance,
//! polling, and exactly one terminal outcome (token issued, denied,
//! expired, or error). Registration failures are fatal to the attempt and
//! never retried; polling respects the provider's declared interval and
//! its `slow_down` adjustments.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::kiro::issuer_binding_hash;
use crate::token::TokenRecord;

use super::error::DeviceFlowError;
use super::session::DeviceAuthSession;

/// SSO start URL the minted tokens are bound to.
pub const DEFAULT_START_URL: &str = "https://view.awsapps.com/start";
/// OIDC region used when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";
/// Poll interval assumed when the provider declares none.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
/// Overall authorization wait before the attempt is abandoned.
pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(300);
/// Client name sent during dynamic registration.
const CLIENT_NAME: &str = "kiroswitch";
/// Device-code grant identifier.
const DEVICE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";
/// Capability scopes requested at registration.
const SCOPES: [&str; 7] = [
    "sso:account:access",
    "codewhisperer:analysis",
    "codewhisperer:completions",
    "codewhisperer:conversations",
    "codewhisperer:taskassist",
    "codewhisperer:transformations",
    "codewhisperer:security_scans",
];
/// Shared HTTP timeout for individual OIDC requests.
const OIDC_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Base URL of the provider's OIDC service for a region.
pub fn oidc_base_url(region: &str) -> String {
    format!("https://oidc.{region}.amazonaws.com")
}

/// Token payload returned when authorization succeeds.
///
/// Provider fields outside the ones we consume are carried in `extra` so
/// the resulting record keeps them verbatim.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Non-terminal poll outcomes. Terminal ones are `DeviceFlowError`s or the
/// issued token itself.
#[derive(Debug)]
pub(crate) enum PollReply {
    Issued(IssuedToken),
    Pending,
    SlowDown,
}

#[derive(Debug, Deserialize)]
struct RegisterResponse {
    #[serde(rename = "clientId")]
    client_id: String,
    #[serde(rename = "clientSecret")]
    client_secret: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceAuthorizationResponse {
    device_code: String,
    user_code: String,
    verification_uri: String,
    #[serde(default)]
    verification_uri_complete: Option<String>,
    #[serde(default)]
    interval: Option<u64>,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct PollErrorBody {
    #[serde(default)]
    error: String,
}

/// Client for the three-phase device-authorization protocol.
#[derive(Debug, Clone)]
pub struct DeviceFlowClient {
    http: reqwest::Client,
    region: String,
    start_url: String,
    timeout: Duration,
}

impl DeviceFlowClient {
    pub fn new(region: impl Into<String>, start_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(OIDC_HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            region: region.into(),
            start_url: start_url.into(),
            timeout: DEFAULT_AUTH_TIMEOUT,
        }
    }

    /// Override the overall authorization wait.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn start_url(&self) -> &str {
        &self.start_url
    }

    /// Register an OIDC client for the device-code grant.
    pub async fn register_client(&self) -> Result<(String, String), DeviceFlowError> {
        let response = self
            .http
            .post(format!("{}/client/register", oidc_base_url(&self.region)))
            .json(&serde_json::json!({
                "clientName": CLIENT_NAME,
                "clientType": "public",
                "scopes": SCOPES,
                "grantTypes": [DEVICE_GRANT_TYPE, "refresh_token"],
                "issuerUrl": self.start_url,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeviceFlowError::Registration(body));
        }
        let payload: RegisterResponse = response.json().await?;
        Ok((payload.client_id, payload.client_secret))
    }

    /// Register a client and request a device code.
    ///
    /// The returned session carries the user code and verification URL; the
    /// caller surfaces them to the human before polling starts.
    pub async fn start(&self) -> Result<DeviceAuthSession, DeviceFlowError> {
        let (client_id, client_secret) = self.register_client().await?;

        let response = self
            .http
            .post(format!("{}/device_authorization", oidc_base_url(&self.region)))
            .json(&serde_json::json!({
                "clientId": client_id,
                "clientSecret": client_secret,
                "startUrl": self.start_url,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let code = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DeviceFlowError::Status(code, body));
        }

        let payload: DeviceAuthorizationResponse = response.json().await?;
        Ok(DeviceAuthSession {
            client_id,
            client_secret,
            device_code: payload.device_code,
            user_code: payload.user_code,
            verification_uri: payload.verification_uri,
            verification_uri_complete: payload.verification_uri_complete,
            interval_secs: payload.interval.unwrap_or(DEFAULT_POLL_INTERVAL_SECS).max(1),
            expires_in: payload.expires_in.unwrap_or(600),
        })
    }

    /// Poll until the provider issues a token or the attempt terminates.
    pub async fn wait_for_token(
        &self,
        session: &DeviceAuthSession,
        cancel: watch::Receiver<bool>,
    ) -> Result<IssuedToken, DeviceFlowError> {
        let endpoint = format!("{}/token", oidc_base_url(&self.region));
        poll_until_issued(
            || async {
                let response = self
                    .http
                    .post(&endpoint)
                    .json(&serde_json::json!({
                        "clientId": session.client_id,
                        "clientSecret": session.client_secret,
                        "grantType": DEVICE_GRANT_TYPE,
                        "deviceCode": session.device_code,
                    }))
                    .send()
                    .await?;
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                parse_poll_response(status, &body)
            },
            Duration::from_secs(session.interval_secs),
            self.timeout,
            cancel,
        )
        .await
    }
}

/// Classify one token-endpoint response during polling.
pub(crate) fn parse_poll_response(status: u16, body: &str) -> Result<PollReply, DeviceFlowError> {
    if (200..300).contains(&status) {
        let issued: IssuedToken = serde_json::from_str(body)
            .map_err(|err| DeviceFlowError::Invalid(format!("unreadable token response: {err}")))?;
        return Ok(PollReply::Issued(issued));
    }
    let error = serde_json::from_str::<PollErrorBody>(body)
        .unwrap_or_default()
        .error;
    match error.as_str() {
        "authorization_pending" => Ok(PollReply::Pending),
        "slow_down" => Ok(PollReply::SlowDown),
        "expired_token" => Err(DeviceFlowError::Expired),
        "access_denied" => Err(DeviceFlowError::Denied),
        _ => Err(DeviceFlowError::Status(status, body.to_string())),
    }
}

/// Drive the polling phase over an injected response source.
///
/// Sleeps before each poll so the human has time to authorize, never polls
/// faster than the current interval, and honors `slow_down` by widening the
/// interval by one second. Cancellation is cooperative and checked while
/// sleeping.
pub(crate) async fn poll_until_issued<F, Fut>(
    mut fetch: F,
    initial_interval: Duration,
    timeout: Duration,
    mut cancel: watch::Receiver<bool>,
) -> Result<IssuedToken, DeviceFlowError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollReply, DeviceFlowError>>,
{
    let started = Instant::now();
    let mut interval = initial_interval;
    loop {
        if started.elapsed() >= timeout {
            return Err(DeviceFlowError::Timeout);
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = cancel.changed() => {
                // A closed channel counts as abandonment too.
                if changed.is_err() || *cancel.borrow_and_update() {
                    return Err(DeviceFlowError::Cancelled);
                }
                continue;
            }
        }
        if started.elapsed() >= timeout {
            return Err(DeviceFlowError::Timeout);
        }
        match fetch().await? {
            PollReply::Issued(issued) => return Ok(issued),
            PollReply::Pending => {}
            PollReply::SlowDown => interval += Duration::from_secs(1),
        }
    }
}

/// Materialize a token record from an issued token and its session.
pub fn build_token_record(
    issued: IssuedToken,
    session: &DeviceAuthSession,
    region: &str,
    start_url: &str,
    account_name: &str,
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
        email: None,
        provider: "BuilderId".to_string(),
        auth_method: "IdC".to_string(),
        region: region.to_string(),
        created_at: Some(now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
        client_id: Some(session.client_id.clone()),
        client_secret: Some(session.client_secret.clone()),
        extra: issued.extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn issued_body() -> String {
        serde_json::json!({
            "accessToken": "aoaAA",
            "refreshToken": "aorAA",
            "tokenType": "Bearer",
            "expiresIn": 28800,
            "idToken": "opaque",
        })
        .to_string()
    }

    fn error_body(error: &str) -> String {
        serde_json::json!({ "error": error }).to_string()
    }

    fn no_cancel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
        watch::channel(false)
    }

    // Verifies poll-response classification for every provider outcome.
    #[test]
    fn parse_poll_response_classifies_outcomes() {
        assert!(matches!(
            parse_poll_response(200, &issued_body()),
            Ok(PollReply::Issued(_))
        ));
        assert!(matches!(
            parse_poll_response(400, &error_body("authorization_pending")),
            Ok(PollReply::Pending)
        ));
        assert!(matches!(
            parse_poll_response(400, &error_body("slow_down")),
            Ok(PollReply::SlowDown)
        ));
        assert!(matches!(
            parse_poll_response(400, &error_body("expired_token")),
            Err(DeviceFlowError::Expired)
        ));
        assert!(matches!(
            parse_poll_response(400, &error_body("access_denied")),
            Err(DeviceFlowError::Denied)
        ));
        assert!(matches!(
            parse_poll_response(500, "oops"),
            Err(DeviceFlowError::Status(500, _))
        ));
    }

    // Verifies pending responses keep the poll alive and a denial yields
    // exactly one terminal DENIED outcome.
    #[tokio::test(start_paused = true)]
    async fn pending_then_denied_terminates_once() {
        let (_cancel_tx, cancel_rx) = no_cancel();
        let polls = RefCell::new(0u32);
        let result = poll_until_issued(
            || {
                let replies = &polls;
                async move {
                    *replies.borrow_mut() += 1;
                    if *replies.borrow() <= 3 {
                        Ok(PollReply::Pending)
                    } else {
                        Err(DeviceFlowError::Denied)
                    }
                }
            },
            Duration::from_secs(5),
            Duration::from_secs(300),
            cancel_rx,
        )
        .await;

        assert!(matches!(result, Err(DeviceFlowError::Denied)));
        assert_eq!(*polls.borrow(), 4);
    }

    // Verifies an immediate 200 yields the issued token after one poll.
    #[tokio::test(start_paused = true)]
    async fn immediate_issue_returns_token() {
        let (_cancel_tx, cancel_rx) = no_cancel();
        let polls = RefCell::new(0u32);
        let result = poll_until_issued(
            || {
                let replies = &polls;
                async move {
                    *replies.borrow_mut() += 1;
                    parse_poll_response(200, &issued_body())
                }
            },
            Duration::from_secs(5),
            Duration::from_secs(300),
            cancel_rx,
        )
        .await;

        let issued = result.expect("token issued");
        assert_eq!(issued.access_token, "aoaAA");
        assert_eq!(*polls.borrow(), 1);
    }

    // Verifies slow_down widens the gap between polls by one second.
    #[tokio::test(start_paused = true)]
    async fn slow_down_widens_interval() {
        let (_cancel_tx, cancel_rx) = no_cancel();
        let stamps = RefCell::new(Vec::new());
        let result = poll_until_issued(
            || {
                let stamps = &stamps;
                async move {
                    stamps.borrow_mut().push(Instant::now());
                    match stamps.borrow().len() {
                        1 => Ok(PollReply::SlowDown),
                        2 => Ok(PollReply::Pending),
                        _ => Err(DeviceFlowError::Denied),
                    }
                }
            },
            Duration::from_secs(5),
            Duration::from_secs(300),
            cancel_rx,
        )
        .await;
        assert!(matches!(result, Err(DeviceFlowError::Denied)));

        let stamps = stamps.borrow();
        let first_gap = stamps[1] - stamps[0];
        let second_gap = stamps[2] - stamps[1];
        assert_eq!(first_gap, Duration::from_secs(6));
        assert_eq!(second_gap, Duration::from_secs(6));
    }

    // Verifies the overall timeout fires regardless of polling phase.
    #[tokio::test(start_paused = true)]
    async fn overall_timeout_terminates_poll() {
        let (_cancel_tx, cancel_rx) = no_cancel();
        let result = poll_until_issued(
            || async { Ok(PollReply::Pending) },
            Duration::from_secs(5),
            Duration::from_secs(12),
            cancel_rx,
        )
        .await;
        assert!(matches!(result, Err(DeviceFlowError::Timeout)));
    }

    // Verifies cooperative cancellation interrupts the sleep.
    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_poll() {
        let (tx, rx) = watch::channel(false);
        let poller = tokio::spawn(poll_until_issued(
            || async { Ok(PollReply::Pending) },
            Duration::from_secs(5),
            Duration::from_secs(300),
            rx,
        ));
        tokio::time::sleep(Duration::from_secs(1)).await;
        tx.send(true).expect("send cancel");

        let result = poller.await.expect("join poller");
        assert!(matches!(result, Err(DeviceFlowError::Cancelled)));
    }

    // Verifies the materialized record binds expiry, issuer hash, and the
    // session's client credentials.
    #[test]
    fn build_token_record_binds_session() {
        let issued: IssuedToken = serde_json::from_str(&issued_body()).unwrap();
        let session = DeviceAuthSession {
            client_id: "client-id".into(),
            client_secret: "client-secret".into(),
            device_code: "device".into(),
            user_code: "WXYZ-1234".into(),
            verification_uri: "https://device.example/verify".into(),
            verification_uri_complete: None,
            interval_secs: 5,
            expires_in: 600,
        };
        let now = Utc::now();
        let record =
            build_token_record(issued, &session, "us-east-1", DEFAULT_START_URL, "auto", now);

        assert_eq!(record.client_id.as_deref(), Some("client-id"));
        assert_eq!(record.provider, "BuilderId");
        assert_eq!(
            record.client_id_hash.as_deref(),
            Some(issuer_binding_hash(DEFAULT_START_URL).as_str())
        );
        assert_eq!(
            record.extra.get("idToken"),
            Some(&serde_json::Value::String("opaque".into()))
        );
        let expires = record.expires_at_utc().expect("parse expiry");
        let drift = (expires - now).num_seconds() - 28800;
        assert!(drift.abs() <= 1, "expiry drift {drift}s");
    }
}
