//! On-disk token record model.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One stored account credential, serialized as a `token-*.json` file.
///
/// Field names match what the external IDE reads, so the serialized form is
/// camelCase. Unknown provider fields are preserved round-trip in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub access_token: String,
    pub refresh_token: String,
    /// Absolute expiry timestamp. Kept as the provider's original string so
    /// a load/save cycle never rewrites the representation.
    pub expires_at: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Binds the record to the issuer URL it was minted against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id_hash: Option<String>,
    #[serde(default)]
    pub account_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_auth_method")]
    pub auth_method: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    // Provider client credentials needed for refresh. Underscore-prefixed on
    // disk so the IDE's own reader ignores them.
    #[serde(rename = "_clientId", default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(rename = "_clientSecret", default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// Unknown provider fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

fn default_provider() -> String {
    "BuilderId".to_string()
}

fn default_auth_method() -> String {
    "IdC".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl TokenRecord {
    /// Parsed expiry instant, or `None` when the stored string is unreadable.
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.expires_at)
    }

    /// True when the record is expired at `now`.
    ///
    /// A record with an unparseable expiry counts as expired so it is never
    /// handed to the IDE as live.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at_utc() {
            Some(expires_at) => now >= expires_at,
            None => true,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Human label for remaining lifetime: `42m`, `3h`, `2d`, or `expired`.
    pub fn expires_in_text(&self, now: DateTime<Utc>) -> String {
        let Some(expires_at) = self.expires_at_utc() else {
            return "?".to_string();
        };
        let remaining = expires_at.signed_duration_since(now);
        if remaining.num_seconds() <= 0 {
            return "expired".to_string();
        }
        let minutes = remaining.num_minutes();
        if minutes < 60 {
            return format!("{minutes}m");
        }
        let hours = minutes / 60;
        if hours < 24 {
            return format!("{hours}h");
        }
        format!("{}d", hours / 24)
    }

    /// Parsed creation instant when present and readable.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }
}

/// Parse a provider timestamp.
///
/// Accepts RFC 3339 with offset or `Z`, and naive `YYYY-MM-DDTHH:MM:SS`
/// (optionally fractional) forms. Naive values are interpreted as UTC so
/// expiry comparisons do not depend on the representation.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record_expiring_at(expires_at: &str) -> TokenRecord {
        TokenRecord {
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            expires_at: expires_at.into(),
            token_type: "Bearer".into(),
            client_id_hash: None,
            account_name: "auto".into(),
            email: None,
            provider: "BuilderId".into(),
            auth_method: "IdC".into(),
            region: "us-east-1".into(),
            created_at: None,
            client_id: None,
            client_secret: None,
            extra: BTreeMap::new(),
        }
    }

    // Verifies expiry compares correctly for timezone-aware timestamps.
    #[test]
    fn expiry_with_offset_timestamp() {
        let record = record_expiring_at("2026-03-01T12:00:00+02:00");
        let before = Utc.with_ymd_and_hms(2026, 3, 1, 9, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        assert!(!record.is_expired_at(before));
        assert!(record.is_expired_at(after));
    }

    // Verifies naive timestamps are treated as UTC so the expiry invariant
    // holds regardless of representation.
    #[test]
    fn expiry_with_naive_timestamp() {
        let naive = record_expiring_at("2026-03-01T10:00:00");
        let aware = record_expiring_at("2026-03-01T10:00:00Z");
        let before = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2026, 3, 1, 11, 0, 0).unwrap();
        for record in [&naive, &aware] {
            assert!(!record.is_expired_at(before));
            assert!(record.is_expired_at(after));
        }
    }

    // Verifies fractional-second timestamps from older record files parse.
    #[test]
    fn expiry_with_fractional_seconds() {
        let record = record_expiring_at("2026-03-01T10:00:00.123456");
        assert!(record.expires_at_utc().is_some());
    }

    // Verifies a record with an unreadable expiry is treated as expired.
    #[test]
    fn unreadable_expiry_counts_as_expired() {
        let record = record_expiring_at("soon");
        assert!(record.is_expired_at(Utc::now()));
        assert_eq!(record.expires_in_text(Utc::now()), "?");
    }

    // Verifies remaining-lifetime labels for minute/hour/day ranges.
    #[test]
    fn expires_in_text_ranges() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let cases = [
            ("2026-03-01T00:30:00Z", "30m"),
            ("2026-03-01T05:00:00Z", "5h"),
            ("2026-03-04T00:00:00Z", "3d"),
            ("2026-02-28T00:00:00Z", "expired"),
        ];
        for (expires_at, expected) in cases {
            let record = record_expiring_at(expires_at);
            assert_eq!(record.expires_in_text(now), expected, "at {expires_at}");
        }
    }

    // Verifies unknown provider fields survive a serialize/deserialize cycle.
    #[test]
    fn round_trip_preserves_unknown_fields() {
        let raw = serde_json::json!({
            "accessToken": "aoaAA",
            "refreshToken": "aorAA",
            "expiresAt": "2026-03-01T10:00:00Z",
            "tokenType": "Bearer",
            "accountName": "auto",
            "provider": "BuilderId",
            "authMethod": "IdC",
            "region": "us-east-1",
            "idToken": "opaque-id-token",
            "ssoSessionId": "session-123",
        });
        let record: TokenRecord = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(
            record.extra.get("idToken"),
            Some(&serde_json::Value::String("opaque-id-token".into()))
        );

        let encoded = serde_json::to_value(&record).unwrap();
        assert_eq!(encoded["idToken"], raw["idToken"]);
        assert_eq!(encoded["ssoSessionId"], raw["ssoSessionId"]);
        assert_eq!(encoded["expiresAt"], raw["expiresAt"]);

        let again: TokenRecord = serde_json::from_value(encoded).unwrap();
        assert_eq!(again, record);
    }

    // Verifies missing optional fields fall back to IDE-compatible defaults.
    #[test]
    fn minimal_record_gets_defaults() {
        let raw = serde_json::json!({
            "accessToken": "a",
            "refreshToken": "r",
            "expiresAt": "2026-03-01T10:00:00Z",
        });
        let record: TokenRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(record.token_type, "Bearer");
        assert_eq!(record.provider, "BuilderId");
        assert_eq!(record.auth_method, "IdC");
        assert_eq!(record.region, "us-east-1");
    }
}
