use woothee::parser::Parser;

pub const UNKNOWN_BROWSER: &str = "unknown";

/// Classify a User-Agent header into a browser family name
pub fn classify_browser(user_agent: Option<&str>) -> String {
    let Some(ua) = user_agent.map(str::trim).filter(|ua| !ua.is_empty()) else {
        return UNKNOWN_BROWSER.to_string();
    };

    match Parser::new().parse(ua) {
        Some(result) if result.name != "UNKNOWN" => result.name.to_string(),
        _ => UNKNOWN_BROWSER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_browsers() {
        let chrome = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
        let firefox = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";
        assert_eq!(classify_browser(Some(chrome)), "Chrome");
        assert_eq!(classify_browser(Some(firefox)), "Firefox");
    }

    #[test]
    fn test_missing_user_agent() {
        assert_eq!(classify_browser(None), UNKNOWN_BROWSER);
        assert_eq!(classify_browser(Some("   ")), UNKNOWN_BROWSER);
        assert_eq!(classify_browser(Some("definitely-not-a-browser")), UNKNOWN_BROWSER);
    }
}
