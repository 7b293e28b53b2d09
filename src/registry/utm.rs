use chrono::{DateTime, Utc};
use url::Url;

pub const UTM_KEYS: [&str; 4] = ["utm_source", "utm_medium", "utm_campaign", "utm_term"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtmSettings {
    pub source: String,
    pub medium: String,
}

impl Default for UtmSettings {
    fn default() -> Self {
        Self {
            source: "aliaskeep".to_string(),
            medium: "shortlink".to_string(),
        }
    }
}

/// Append UTM tracking parameters to `target`.
///
/// Existing `utm_*` parameters with the same names are replaced, other query
/// parameters and the fragment are preserved. A target that does not parse is
/// returned untouched.
pub fn decorate(target: &str, alias: &str, now: DateTime<Utc>, settings: &UtmSettings) -> String {
    let Ok(mut url) = Url::parse(target) else {
        tracing::warn!(target_url = %target, "cannot parse target URL, skipping UTM parameters");
        return target.to_string();
    };

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !UTM_KEYS.contains(&key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let term = now.format("%Y-%m-%d").to_string();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("utm_source", &settings.source)
        .append_pair("utm_medium", &settings.medium)
        .append_pair("utm_campaign", alias)
        .append_pair("utm_term", &term);

    url.to_string()
}
