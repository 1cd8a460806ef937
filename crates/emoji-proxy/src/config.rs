use std::env;
use std::path::PathBuf;

/// Service configuration parsed from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub lookup_url: String,
    pub cache_ttl_days: u32,
    pub coalesce_inflight: bool,
    pub sweep_on_start: bool,
    /// Live `/blob/` urls kept before the least recently used are dropped
    pub object_url_capacity: u64,
    pub object_url_idle_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3005,
            database_url: "sqlite://./cache/emoji.db?mode=rwc".to_string(),
            lookup_url: "http://localhost:3000/api/emoji".to_string(),
            cache_ttl_days: 7,
            coalesce_inflight: false,
            sweep_on_start: true,
            object_url_capacity: 4096,
            object_url_idle_secs: 60 * 60,
        }
    }
}

impl Config {
    /// Parse configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = var("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        let database_url = var("DATABASE_URL").unwrap_or(defaults.database_url);

        let lookup_url = var("EMOJI_LOOKUP_URL").unwrap_or(defaults.lookup_url);

        let cache_ttl_days = var("CACHE_TTL_DAYS")
            .and_then(|d| d.parse().ok())
            .unwrap_or(defaults.cache_ttl_days);

        let coalesce_inflight = var("COALESCE_INFLIGHT")
            .map(|v| parse_flag(&v))
            .unwrap_or(defaults.coalesce_inflight);

        let sweep_on_start = var("SWEEP_ON_START")
            .map(|v| parse_flag(&v))
            .unwrap_or(defaults.sweep_on_start);

        let object_url_capacity = var("OBJECT_URL_CAPACITY")
            .and_then(|c| c.parse().ok())
            .unwrap_or(defaults.object_url_capacity);

        let object_url_idle_secs = var("OBJECT_URL_IDLE_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.object_url_idle_secs);

        Self {
            port,
            database_url,
            lookup_url,
            cache_ttl_days,
            coalesce_inflight,
            sweep_on_start,
            object_url_capacity,
            object_url_idle_secs,
        }
    }
}

impl Config {
    /// Parent directory of an on-disk SQLite database, if any
    pub fn database_dir(&self) -> Option<PathBuf> {
        let path = self.database_url.strip_prefix("sqlite://")?;
        let path = path.split('?').next().unwrap_or(path);
        if path.is_empty() || path.starts_with(':') {
            return None;
        }
        PathBuf::from(path)
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(PathBuf::from)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(config_from(&[]), Config::default());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("EMOJI_LOOKUP_URL", "https://social.example/api/emoji"),
            ("CACHE_TTL_DAYS", "0"),
            ("COALESCE_INFLIGHT", "true"),
            ("SWEEP_ON_START", "no"),
            ("OBJECT_URL_CAPACITY", "64"),
            ("OBJECT_URL_IDLE_SECS", "30"),
        ]);

        assert_eq!(config.port, 8080);
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.lookup_url, "https://social.example/api/emoji");
        assert_eq!(config.cache_ttl_days, 0);
        assert!(config.coalesce_inflight);
        assert!(!config.sweep_on_start);
        assert_eq!(config.object_url_capacity, 64);
        assert_eq!(config.object_url_idle_secs, 30);
    }

    #[test]
    fn test_unparseable_numbers_fall_back() {
        let config = config_from(&[("PORT", "http"), ("CACHE_TTL_DAYS", "-3")]);
        assert_eq!(config.port, 3005);
        assert_eq!(config.cache_ttl_days, 7);
    }

    #[test]
    fn test_database_dir() {
        let config = Config::default();
        assert_eq!(config.database_dir(), Some(PathBuf::from("./cache")));

        let memory = config_from(&[("DATABASE_URL", "sqlite::memory:")]);
        assert_eq!(memory.database_dir(), None);

        let bare = config_from(&[("DATABASE_URL", "sqlite://emoji.db")]);
        assert_eq!(bare.database_dir(), None);
    }
}
