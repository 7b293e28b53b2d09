use rand::RngExt;
use std::collections::HashSet;

use super::error::{RegistryError, RegistryResult};

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Path segments the router already uses; an alias with one of these names
/// would shadow a system route.
pub const BUILTIN_RESERVED: &[&str] = &[
    "api", "go", "health", "shorten", "delete", "links", "static", "login", "logout", "register",
    "dashboard", "admin",
];

/// Generate a random alias of `length` alphanumeric characters
pub fn generate_alias(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Reserved alias set, stored lowercased for case-insensitive lookups
#[derive(Debug, Clone)]
pub struct ReservedAliases(HashSet<String>);

impl ReservedAliases {
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set: HashSet<String> = BUILTIN_RESERVED.iter().map(|s| s.to_string()).collect();
        set.extend(
            extra
                .into_iter()
                .map(|s| s.as_ref().trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty()),
        );
        Self(set)
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.0.contains(&alias.to_ascii_lowercase())
    }
}

impl Default for ReservedAliases {
    fn default() -> Self {
        Self::with_extra(std::iter::empty::<&str>())
    }
}

/// Validate a caller-supplied alias: charset, length and reserved names.
pub fn validate_requested_alias(
    alias: &str,
    max_length: usize,
    reserved: &ReservedAliases,
) -> RegistryResult<()> {
    if alias.is_empty() {
        return Err(RegistryError::InvalidAlias("alias cannot be empty".into()));
    }
    if alias.chars().count() > max_length {
        return Err(RegistryError::InvalidAlias(format!(
            "alias must be at most {max_length} characters"
        )));
    }
    if !alias
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(RegistryError::InvalidAlias(
            "alias may only contain letters, digits, '-' and '_'".into(),
        ));
    }
    if reserved.contains(alias) {
        return Err(RegistryError::ReservedAlias(alias.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_alias_shape() {
        let alias = generate_alias(6);
        assert_eq!(alias.len(), 6);
        assert!(alias.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generated_aliases_differ() {
        let a: HashSet<String> = (0..100).map(|_| generate_alias(8)).collect();
        assert!(a.len() > 95);
    }

    #[test]
    fn test_reserved_is_case_insensitive() {
        let reserved = ReservedAliases::with_extra(["Promo"]);
        assert!(reserved.contains("API"));
        assert!(reserved.contains("promo"));
        assert!(!reserved.contains("demo"));
    }

    #[test]
    fn test_validate_requested_alias() {
        let reserved = ReservedAliases::default();
        assert!(validate_requested_alias("demo-1_x", 32, &reserved).is_ok());
        assert!(matches!(
            validate_requested_alias("", 32, &reserved),
            Err(RegistryError::InvalidAlias(_))
        ));
        assert!(matches!(
            validate_requested_alias("has space", 32, &reserved),
            Err(RegistryError::InvalidAlias(_))
        ));
        assert!(matches!(
            validate_requested_alias("abcdef", 5, &reserved),
            Err(RegistryError::InvalidAlias(_))
        ));
        assert_eq!(
            validate_requested_alias("Health", 32, &reserved),
            Err(RegistryError::ReservedAlias("Health".into()))
        );
    }
}
