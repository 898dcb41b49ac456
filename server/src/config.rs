use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result, anyhow};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use platform_authn::SessionKeys;
use platform_db::DatabaseSettings;

const DEFAULT_SESSION_TTL_MINUTES: i64 = 480;
const DEFAULT_PAGE_CACHE_TTL_SECS: u64 = 60;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub session_keys: Arc<SessionKeys>,
    pub session_ttl: chrono::Duration,
    pub secure_cookies: bool,
    pub cors_allowed_origins: Vec<String>,
    pub page_cache_ttl: Duration,
    pub database: DatabaseSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let secret = lookup("AUTH_SECRET_BASE64").context("AUTH_SECRET_BASE64 missing")?;
        let secret_bytes = STANDARD
            .decode(secret.trim())
            .context("invalid AUTH_SECRET_BASE64")?;
        let session_keys = SessionKeys::from_secret(&secret_bytes)
            .map_err(|err| anyhow!("AUTH_SECRET_BASE64: {err}"))?;

        let ttl_minutes = match lookup("SESSION_TTL_MINUTES") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|m| *m > 0)
                .ok_or_else(|| anyhow!("SESSION_TTL_MINUTES must be a positive integer"))?,
            None => DEFAULT_SESSION_TTL_MINUTES,
        };

        let secure_cookies = lookup("SECURE_COOKIES")
            .map(|val| matches!(val.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(true);

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.into())
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect::<Vec<_>>();

        let cache_secs = match lookup("PAGE_CACHE_TTL_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .context("PAGE_CACHE_TTL_SECS must be a number of seconds")?,
            None => DEFAULT_PAGE_CACHE_TTL_SECS,
        };

        let mut database = DatabaseSettings::default();
        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()) {
            database.url = url;
        }
        database.max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .and_then(|v| v.trim().parse().ok());

        Ok(Self {
            session_keys: Arc::new(session_keys),
            session_ttl: chrono::Duration::minutes(ttl_minutes),
            secure_cookies,
            cors_allowed_origins,
            page_cache_ttl: Duration::from_secs(cache_secs),
            database,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    // 32 bytes of 'k'
    const TEST_SECRET: &str = "a2tra2tra2tra2tra2tra2tra2tra2tra2tra2tra2s=";

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = AppConfig::from_lookup(lookup(&[("AUTH_SECRET_BASE64", TEST_SECRET)])).unwrap();
        assert_eq!(config.session_ttl, chrono::Duration::minutes(480));
        assert!(config.secure_cookies);
        assert_eq!(config.cors_allowed_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.page_cache_ttl, Duration::from_secs(60));
        assert_eq!(config.database.url, DatabaseSettings::DEFAULT_URL);
    }

    #[test]
    fn missing_or_short_secret_is_rejected() {
        assert!(AppConfig::from_lookup(lookup(&[])).is_err());
        let short = STANDARD.encode(b"too-short");
        assert!(AppConfig::from_lookup(lookup(&[("AUTH_SECRET_BASE64", &short)])).is_err());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = AppConfig::from_lookup(lookup(&[
            ("AUTH_SECRET_BASE64", TEST_SECRET),
            ("SESSION_TTL_MINUTES", "15"),
            ("SECURE_COOKIES", "false"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, ,https://b.example"),
            ("PAGE_CACHE_TTL_SECS", "5"),
            ("DATABASE_URL", "sqlite::memory:"),
        ]))
        .unwrap();
        assert_eq!(config.session_ttl, chrono::Duration::minutes(15));
        assert!(!config.secure_cookies);
        assert_eq!(config.cors_allowed_origins.len(), 2);
        assert_eq!(config.page_cache_ttl, Duration::from_secs(5));
        assert_eq!(config.database.url, "sqlite::memory:");
    }
}
