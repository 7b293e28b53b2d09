//! Data models for click analytics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use url::Url;

use super::browser::classify_browser;

pub const DIRECT_REFERRER: &str = "direct";
pub const UNKNOWN_COUNTRY: &str = "unknown";

/// Request attributes captured by the redirect layer
#[derive(Debug, Clone, Default)]
pub struct Visit {
    /// Raw Referer header
    pub referrer: Option<String>,

    /// Raw User-Agent header
    pub user_agent: Option<String>,

    /// Country code from the configured geo header
    pub country: Option<String>,
}

/// A single successful redirect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub at: DateTime<Utc>,

    /// Host part of the referrer
    #[serde(default)]
    pub referrer: Option<String>,

    /// ISO country code, upper-cased
    #[serde(default)]
    pub country: Option<String>,

    pub browser: String,
}

impl ClickEvent {
    pub fn from_visit(visit: &Visit, at: DateTime<Utc>) -> Self {
        Self {
            at,
            referrer: visit.referrer.as_deref().and_then(referrer_host),
            country: visit.country.as_deref().and_then(country_code),
            browser: classify_browser(visit.user_agent.as_deref()),
        }
    }
}

/// Referrer reduced to its host; anything that is not a URL with a host
/// counts as a direct visit.
fn referrer_host(referrer: &str) -> Option<String> {
    Url::parse(referrer.trim())
        .ok()?
        .host_str()
        .map(str::to_ascii_lowercase)
}

/// Two-letter country code, upper-cased; other values are dropped
fn country_code(raw: &str) -> Option<String> {
    let raw = raw.trim();
    (raw.len() == 2 && raw.bytes().all(|b| b.is_ascii_alphabetic()))
        .then(|| raw.to_ascii_uppercase())
}

/// Per-link click analytics: recent events plus running aggregates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickStats {
    /// Most recent events, oldest first
    #[serde(default)]
    pub events: VecDeque<ClickEvent>,

    #[serde(default)]
    pub referrers: BTreeMap<String, u64>,

    #[serde(default)]
    pub countries: BTreeMap<String, u64>,

    #[serde(default)]
    pub browsers: BTreeMap<String, u64>,
}

impl ClickStats {
    /// Record an event, keeping at most `max_events` raw events.
    ///
    /// Aggregates count every event, including ones dropped from the window.
    pub fn record(&mut self, event: ClickEvent, max_events: usize) {
        let referrer = event
            .referrer
            .clone()
            .unwrap_or_else(|| DIRECT_REFERRER.to_string());
        let country = event
            .country
            .clone()
            .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string());

        *self.referrers.entry(referrer).or_insert(0) += 1;
        *self.countries.entry(country).or_insert(0) += 1;
        *self.browsers.entry(event.browser.clone()).or_insert(0) += 1;

        if max_events == 0 {
            return;
        }
        self.events.push_back(event);
        while self.events.len() > max_events {
            self.events.pop_front();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.browsers.is_empty()
    }
}
