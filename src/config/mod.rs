use anyhow::Context;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

use crate::registry::{RegistrySettings, ReservedAliases, UtmSettings};

/// `DATA_FILE` value that disables persistence
pub const IN_MEMORY_DATA_FILE: &str = ":memory:";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub server: ServerConfig,
    pub public: PublicConfig,
    pub aliases: AliasConfig,
    pub utm: UtmConfig,
    pub analytics: AnalyticsConfig,
    /// Whether deletes must come from the link's owner
    pub enforce_ownership: bool,
    pub redirect_status: RedirectMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the JSON document; `None` keeps everything in memory
    pub data_file: Option<PathBuf>,
    /// Quiet period before a burst of changes is written out
    pub persist_debounce_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// How links are presented to the outside world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicConfig {
    /// Base URL the redirect route is reachable under, e.g. `https://sho.rt`
    pub base_url: String,
    pub qr_code_service_url: Url,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasConfig {
    pub generated_length: usize,
    pub max_length: usize,
    pub reserved: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtmConfig {
    pub source: String,
    pub medium: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    pub enabled: bool,
    /// Raw click events kept per link
    pub max_events: usize,
    /// Request header carrying the visitor's country code
    pub country_header: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectMode {
    #[default]
    Found,
    Temporary,
    Permanent,
}

impl RedirectMode {
    pub fn status_code(self) -> StatusCode {
        match self {
            RedirectMode::Found => StatusCode::FOUND,
            RedirectMode::Temporary => StatusCode::TEMPORARY_REDIRECT,
            RedirectMode::Permanent => StatusCode::PERMANENT_REDIRECT,
        }
    }
}

impl PublicConfig {
    pub fn short_url(&self, alias: &str) -> String {
        format!("{}/go/{}", self.base_url.trim_end_matches('/'), alias)
    }

    /// Display link for a QR image of `short_url`, rendered by the external service
    pub fn qr_code_url(&self, short_url: &str) -> String {
        let mut url = self.qr_code_service_url.clone();
        url.query_pairs_mut()
            .append_pair("size", "150x150")
            .append_pair("data", short_url);
        url.to_string()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                data_file: Some(PathBuf::from("links.json")),
                persist_debounce_ms: 250,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
            },
            public: PublicConfig {
                base_url: "http://localhost:5000".to_string(),
                qr_code_service_url: default_qr_service(),
            },
            aliases: AliasConfig {
                generated_length: 6,
                max_length: 32,
                reserved: Vec::new(),
            },
            utm: UtmConfig {
                source: "aliaskeep".to_string(),
                medium: "shortlink".to_string(),
            },
            analytics: AnalyticsConfig {
                enabled: true,
                max_events: 100,
                country_header: "cf-ipcountry".to_string(),
            },
            enforce_ownership: true,
            redirect_status: RedirectMode::Found,
        }
    }
}

fn default_qr_service() -> Url {
    Url::parse("https://api.qrserver.com/v1/create-qr-code/").expect("static URL is valid")
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Config::default();

        let data_file = match std::env::var("DATA_FILE") {
            Ok(v) if v == IN_MEMORY_DATA_FILE => None,
            Ok(v) => Some(PathBuf::from(v)),
            Err(_) => defaults.storage.data_file,
        };
        let persist_debounce_ms =
            env_parse("PERSIST_DEBOUNCE_MS", defaults.storage.persist_debounce_ms)?;

        let host = env_string("API_HOST", &defaults.server.host);
        let port = env_parse::<u16>("API_PORT", defaults.server.port)?;

        let base_url = env_string("PUBLIC_BASE_URL", &defaults.public.base_url);
        let qr_code_service_url = match std::env::var("QR_CODE_SERVICE_URL") {
            Ok(raw) => Url::parse(&raw)
                .with_context(|| format!("QR_CODE_SERVICE_URL is not a valid URL: '{raw}'"))?,
            Err(_) => defaults.public.qr_code_service_url,
        };

        let generated_length =
            env_parse::<usize>("ALIAS_LENGTH", defaults.aliases.generated_length)?;
        let max_length = env_parse::<usize>("ALIAS_MAX_LENGTH", defaults.aliases.max_length)?;
        if generated_length == 0 || generated_length > max_length {
            anyhow::bail!(
                "ALIAS_LENGTH must be between 1 and ALIAS_MAX_LENGTH ({max_length}), got {generated_length}"
            );
        }
        let reserved = std::env::var("RESERVED_ALIASES")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let redirect_status = match std::env::var("REDIRECT_STATUS")
            .unwrap_or_else(|_| "found".to_string())
            .to_lowercase()
            .as_str()
        {
            "found" | "302" => RedirectMode::Found,
            "temporary" | "307" => RedirectMode::Temporary,
            "permanent" | "308" => RedirectMode::Permanent,
            other => {
                tracing::warn!(
                    "Unknown REDIRECT_STATUS '{other}', falling back to 'found'. Supported values: found, temporary, permanent"
                );
                RedirectMode::Found
            }
        };

        Ok(Config {
            storage: StorageConfig {
                data_file,
                persist_debounce_ms,
            },
            server: ServerConfig { host, port },
            public: PublicConfig {
                base_url,
                qr_code_service_url,
            },
            aliases: AliasConfig {
                generated_length,
                max_length,
                reserved,
            },
            utm: UtmConfig {
                source: env_string("UTM_SOURCE", &defaults.utm.source),
                medium: env_string("UTM_MEDIUM", &defaults.utm.medium),
            },
            analytics: AnalyticsConfig {
                enabled: env_bool("ANALYTICS_ENABLED", defaults.analytics.enabled),
                max_events: env_parse("ANALYTICS_MAX_EVENTS", defaults.analytics.max_events)?,
                country_header: env_string("COUNTRY_HEADER", &defaults.analytics.country_header)
                    .to_lowercase(),
            },
            enforce_ownership: env_bool("ENFORCE_OWNERSHIP", defaults.enforce_ownership),
            redirect_status,
        })
    }

    /// Registry behaviour derived from this configuration
    pub fn registry_settings(&self) -> RegistrySettings {
        RegistrySettings {
            alias_length: self.aliases.generated_length,
            max_alias_length: self.aliases.max_length,
            reserved: ReservedAliases::with_extra(&self.aliases.reserved),
            enforce_ownership: self.enforce_ownership,
            utm: UtmSettings {
                source: self.utm.source.clone(),
                medium: self.utm.medium.clone(),
            },
            analytics_enabled: self.analytics.enabled,
            max_click_events: self.analytics.max_events,
        }
    }
}
