use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;
use crate::analytics::ClickStats;
use crate::config::PublicConfig;
use crate::registry::expiry::EXPIRING_SOON_WINDOW_DAYS;
use crate::registry::secret::{process_stored_secret, SecretError};

/// A stored alias -> target mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredLink")]
pub struct LinkRecord {
    pub alias: String,
    pub target_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub click_count: u64,
    pub expires_at: Option<DateTime<Utc>>,
    /// Salted digest of the access password, never the password itself
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub utm_enabled: bool,
}

impl LinkRecord {
    /// Expired strictly after `expires_at`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| now > exp)
    }

    /// Expiry is set and falls strictly between now and now + 7 days
    pub fn is_expiring_soon(&self, now: DateTime<Utc>) -> bool {
        let window = TimeDelta::days(EXPIRING_SOON_WINDOW_DAYS);
        self.expires_at
            .is_some_and(|exp| now < exp && exp < now + window)
    }

    pub fn is_password_protected(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// On-disk shape of a link, accepting the field names of the earlier
/// flat-file format (`url`, `clicks`, `created`, `user_id`, `expiry_date`,
/// plaintext `password`, `utm_tracking`).
#[derive(Deserialize)]
struct StoredLink {
    #[serde(default)]
    alias: String,
    #[serde(alias = "url")]
    target_url: String,
    #[serde(default, alias = "user_id")]
    owner_id: Option<String>,
    #[serde(alias = "created", deserialize_with = "timestamp::deserialize")]
    created_at: DateTime<Utc>,
    #[serde(default, alias = "clicks")]
    click_count: u64,
    #[serde(
        default,
        alias = "expiry_date",
        deserialize_with = "timestamp::deserialize_option"
    )]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    password_hash: Option<String>,
    #[serde(default, rename = "password")]
    plaintext_password: Option<String>,
    #[serde(default, alias = "utm_tracking")]
    utm_enabled: bool,
}

impl TryFrom<StoredLink> for LinkRecord {
    type Error = SecretError;

    fn try_from(stored: StoredLink) -> Result<Self, Self::Error> {
        let password_hash = match stored.password_hash {
            Some(hash) => Some(hash),
            None => process_stored_secret(stored.plaintext_password.as_deref())?,
        };

        Ok(Self {
            alias: stored.alias,
            target_url: stored.target_url,
            owner_id: stored.owner_id,
            created_at: stored.created_at,
            click_count: stored.click_count,
            expires_at: stored.expires_at,
            password_hash,
            utm_enabled: stored.utm_enabled,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    pub url: String,
    #[serde(default)]
    pub alias: Option<String>,
    /// `never`, `1day`, `7days`, `1d12h`, RFC 3339 or `YYYY-MM-DD`
    #[serde(default)]
    pub expiry: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub utm: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateLinkResponse {
    pub alias: String,
    pub short_url: String,
    pub qr_code_url: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A link as presented to API clients
#[derive(Debug, Serialize, Deserialize)]
pub struct LinkView {
    pub alias: String,
    pub target_url: String,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub click_count: u64,
    pub expires_at: Option<DateTime<Utc>>,
    pub expiring_soon: bool,
    pub password_protected: bool,
    pub utm_enabled: bool,
    pub short_url: String,
    pub qr_code_url: String,
}

impl LinkView {
    pub fn new(record: LinkRecord, now: DateTime<Utc>, public: &PublicConfig) -> Self {
        let short_url = public.short_url(&record.alias);
        Self {
            expiring_soon: record.is_expiring_soon(now),
            password_protected: record.is_password_protected(),
            qr_code_url: public.qr_code_url(&short_url),
            short_url,
            alias: record.alias,
            target_url: record.target_url,
            owner_id: record.owner_id,
            created_at: record.created_at,
            click_count: record.click_count,
            expires_at: record.expires_at,
            utm_enabled: record.utm_enabled,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LinkStatsResponse {
    pub alias: String,
    pub click_count: u64,
    pub stats: ClickStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::secret::verify_secret;
    use chrono::TimeZone;

    fn record(expires_at: Option<DateTime<Utc>>) -> LinkRecord {
        LinkRecord {
            alias: "demo".into(),
            target_url: "https://example.com".into(),
            owner_id: None,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            click_count: 0,
            expires_at,
            password_hash: None,
            utm_enabled: false,
        }
    }

    #[test]
    fn test_expiry_is_strict() {
        let exp = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let link = record(Some(exp));
        assert!(!link.is_expired(exp));
        assert!(link.is_expired(exp + TimeDelta::seconds(1)));
        assert!(!link.is_expired(exp - TimeDelta::seconds(1)));
        assert!(!record(None).is_expired(exp));
    }

    #[test]
    fn test_expiring_soon_window() {
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        assert!(record(Some(now + TimeDelta::days(3))).is_expiring_soon(now));
        assert!(!record(Some(now + TimeDelta::days(7))).is_expiring_soon(now));
        assert!(!record(Some(now - TimeDelta::days(1))).is_expiring_soon(now));
        assert!(!record(None).is_expiring_soon(now));
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut link = record(None);
        link.password_hash = Some(crate::registry::secret::hash_secret("pw").unwrap());
        link.click_count = 4;
        let json = serde_json::to_string(&link).unwrap();
        let back: LinkRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, link);
    }

    #[test]
    fn test_legacy_shape() {
        let json = r#"{
            "url": "https://old.example",
            "created": "2024-06-01 08:30:00",
            "clicks": 12,
            "user_id": "u1",
            "expiry_date": null,
            "password": "letmein",
            "utm_tracking": true
        }"#;
        let link: LinkRecord = serde_json::from_str(json).unwrap();
        assert_eq!(link.target_url, "https://old.example");
        assert_eq!(link.click_count, 12);
        assert_eq!(link.owner_id.as_deref(), Some("u1"));
        assert!(link.utm_enabled);
        let hash = link.password_hash.as_deref().unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_secret("letmein", hash));

        let written = serde_json::to_string(&link).unwrap();
        assert!(!written.contains("letmein"));
    }
}
