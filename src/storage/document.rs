use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analytics::ClickStats;
use crate::models::LinkRecord;

/// The full persisted state: every link plus its analytics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedDocument {
    pub links: BTreeMap<String, LinkRecord>,
    #[serde(default)]
    pub analytics: BTreeMap<String, ClickStats>,
}

/// Accepted on-disk layouts. The earlier flat-file shortener wrote a bare
/// alias -> link map with no analytics section.
#[derive(Deserialize)]
#[serde(untagged)]
enum DocumentFormat {
    Current(PersistedDocument),
    Flat(BTreeMap<String, LinkRecord>),
}

impl PersistedDocument {
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        let mut document = match serde_json::from_slice::<DocumentFormat>(bytes)? {
            DocumentFormat::Current(document) => document,
            DocumentFormat::Flat(links) => PersistedDocument {
                links,
                analytics: BTreeMap::new(),
            },
        };

        // The map key is authoritative for the alias
        for (alias, link) in document.links.iter_mut() {
            link.alias.clone_from(alias);
        }
        Ok(document)
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_layout() {
        let json = br#"{
            "links": {
                "demo": {
                    "alias": "demo",
                    "target_url": "https://example.com",
                    "created_at": "2026-01-01T00:00:00Z",
                    "click_count": 3,
                    "expires_at": null,
                    "utm_enabled": false
                }
            },
            "analytics": {
                "demo": { "events": [], "referrers": {"direct": 3}, "countries": {}, "browsers": {} }
            }
        }"#;
        let doc = PersistedDocument::from_json(json).unwrap();
        assert_eq!(doc.links["demo"].click_count, 3);
        assert_eq!(doc.analytics["demo"].referrers["direct"], 3);
    }

    #[test]
    fn test_flat_legacy_layout() {
        let json = br#"{
            "abc123": { "url": "https://a.example", "created": "2024-01-01 10:00:00", "clicks": 2 },
            "links": { "url": "https://b.example", "created": "2024-01-02 10:00:00", "clicks": 0 }
        }"#;
        let doc = PersistedDocument::from_json(json).unwrap();
        assert_eq!(doc.links.len(), 2);
        assert_eq!(doc.links["abc123"].alias, "abc123");
        assert_eq!(doc.links["links"].target_url, "https://b.example");
        assert!(doc.analytics.is_empty());
    }

    #[test]
    fn test_empty_object_is_empty_document() {
        let doc = PersistedDocument::from_json(b"{}").unwrap();
        assert_eq!(doc, PersistedDocument::default());
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(PersistedDocument::from_json(b"not json").is_err());
        assert!(PersistedDocument::from_json(br#"{"a": 1}"#).is_err());
    }
}
