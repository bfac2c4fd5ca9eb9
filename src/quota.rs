//! Read-only usage-quota queries against the backend API.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use crate::token::parse_timestamp;

/// Default usage-reporting endpoint base.
pub const DEFAULT_QUOTA_BASE_URL: &str = "https://codewhisperer.us-east-1.amazonaws.com";
/// Usage limit assumed when the backend omits one.
pub const DEFAULT_USAGE_LIMIT: i64 = 500;
/// Shared HTTP timeout for quota requests.
const QUOTA_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the quota endpoint.
#[derive(Debug)]
pub enum QuotaError {
    Http(reqwest::Error),
    Status(u16, String),
    Invalid(String),
}

impl fmt::Display for QuotaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(err) => write!(f, "http: {err}"),
            Self::Status(code, body) => write!(f, "status {code}: {body}"),
            Self::Invalid(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for QuotaError {}

impl From<reqwest::Error> for QuotaError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

/// Account identity recovered from the usage endpoint, when the backend
/// includes it.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Usage figures for one account.
///
/// A `suspended` flag is data, not an error; suspended accounts still
/// report their numbers.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsageLimits {
    #[serde(default)]
    pub current_usage: i64,
    #[serde(default = "default_usage_limit")]
    pub usage_limit: i64,
    #[serde(default)]
    pub suspended: bool,
    #[serde(default)]
    pub reset_date: Option<String>,
    #[serde(default)]
    pub trial_usage: Option<i64>,
    #[serde(default)]
    pub trial_limit: Option<i64>,
    #[serde(default)]
    pub user_info: Option<UserInfo>,
}

fn default_usage_limit() -> i64 {
    DEFAULT_USAGE_LIMIT
}

impl UsageLimits {
    /// Usage as a percentage of the limit, clamped to sane input.
    pub fn percent_used(&self) -> f64 {
        if self.usage_limit <= 0 {
            return 0.0;
        }
        (self.current_usage as f64 / self.usage_limit as f64) * 100.0
    }

    /// Whole days until the reported reset date, when present and readable.
    pub fn days_until_reset(&self, now: DateTime<Utc>) -> Option<i64> {
        let reset = self.reset_date.as_deref().and_then(parse_timestamp)?;
        let days = reset.signed_duration_since(now).num_days();
        Some(days.max(0))
    }
}

/// Client for the usage endpoint: independent, retryless GETs per token.
#[derive(Debug, Clone)]
pub struct QuotaClient {
    http: reqwest::Client,
    base_url: String,
}

impl QuotaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(QUOTA_HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Fetch usage figures with a bearer access token.
    pub async fn usage_limits(&self, access_token: &str) -> Result<UsageLimits, QuotaError> {
        let response = self
            .http
            .get(format!("{}/getUsageLimits", self.base_url))
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            return Err(QuotaError::Status(status, body));
        }
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|err| QuotaError::Invalid(format!("unreadable usage response: {err}")))
    }
}
