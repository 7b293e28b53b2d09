use url::Url;

use super::error::{RegistryError, RegistryResult};

pub const MAX_URL_LENGTH: usize = 2048;

const ACCEPTED_SCHEMES: [&str; 2] = ["http://", "https://"];

/// Check that a target URL is an absolute http(s) URL with a host.
pub fn validate_target_url(target: &str) -> RegistryResult<()> {
    if target.len() > MAX_URL_LENGTH {
        return Err(RegistryError::InvalidUrl(format!(
            "URL must be at most {MAX_URL_LENGTH} characters"
        )));
    }

    let has_scheme = ACCEPTED_SCHEMES.iter().any(|scheme| {
        target
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    });
    if !has_scheme {
        return Err(RegistryError::InvalidUrl(
            "URL must start with http:// or https://".into(),
        ));
    }

    let parsed = Url::parse(target).map_err(|e| RegistryError::InvalidUrl(e.to_string()))?;
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(RegistryError::InvalidUrl("URL has no host".into()));
    }
    Ok(())
}

/// `target` as a value that can go into a `Location` header.
///
/// Visible ASCII passes through unchanged. Anything else is re-serialized by
/// the URL parser, which percent-encodes it; `None` if it does not parse.
pub fn redirect_location(target: &str) -> Option<String> {
    if !target.is_empty() && target.bytes().all(|b| b.is_ascii_graphic()) {
        return Some(target.to_string());
    }
    Url::parse(target).ok().map(String::from)
}
