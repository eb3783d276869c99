use std::env::var;
use std::time::Duration;

use dotenvy::dotenv;

use crate::error::ConfigError;

pub const DEFAULT_MOJANG_API_URL: &str = "https://api.mojang.com";
pub const DEFAULT_HYPIXEL_API_URL: &str = "https://api.hypixel.net";

/// Application configuration with environment variable overrides
#[derive(Debug, Clone)]
pub struct Config {
    /// Keep-alive HTTP port
    /// Env: PORT (default: 3000)
    pub port: u16,

    /// Request timeout for the keep-alive server
    /// Env: REQUEST_TIMEOUT_SECS (default: 30)
    pub request_timeout: Duration,

    /// Subscription file path
    /// Env: SUBSCRIPTIONS_PATH (default: "monitored_users.json")
    pub subscriptions_path: String,

    /// Discord API Token
    /// Env: DISCORD_TOKEN (required)
    pub discord_token: String,

    /// Hypixel API key
    /// Env: HYPIXEL_API_KEY (required)
    pub hypixel_api_key: String,

    /// Discord Command Prefix
    /// Env: DISCORD_COMMAND_PREFIX (default: "!")
    pub discord_command_prefix: String,

    /// How often the login cache is rebuilt
    /// Env: REFRESH_INTERVAL_SECS (default: 300)
    pub refresh_interval: Duration,

    /// How often the cache is checked for logins to notify about
    /// Env: SWEEP_INTERVAL_SECS (default: 60)
    pub sweep_interval: Duration,

    /// A login younger than this triggers a notification
    /// Env: NOTIFY_WINDOW_SECS (default: 600)
    pub notify_window: Duration,

    /// Window used by the `recentonline` command
    /// Env: RECENT_ONLINE_WINDOW_SECS (default: 86400)
    pub recent_online_window: Duration,

    /// Per-request timeout for Mojang/Hypixel calls
    /// Env: LOOKUP_TIMEOUT_SECS (default: 10)
    pub lookup_timeout: Duration,

    /// Lookups in flight at once during a refresh
    /// Env: LOOKUP_CONCURRENCY (default: 4)
    pub lookup_concurrency: usize,

    /// Env: MOJANG_API_URL (default: "https://api.mojang.com")
    pub mojang_api_url: String,

    /// Env: HYPIXEL_API_URL (default: "https://api.hypixel.net")
    pub hypixel_api_url: String,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv(); //for debugging mostly
        Self::from_lookup(|key| var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    /// Missing credentials are an error, everything else falls back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let secs = |key: &str, default: Duration| {
            Duration::from_secs(parse_or(&lookup, key, default.as_secs()))
        };

        Ok(Self {
            port: parse_or(&lookup, "PORT", defaults.port),
            request_timeout: secs("REQUEST_TIMEOUT_SECS", defaults.request_timeout),
            subscriptions_path: lookup("SUBSCRIPTIONS_PATH").unwrap_or(defaults.subscriptions_path),
            discord_token: required(&lookup, "DISCORD_TOKEN")?,
            hypixel_api_key: required(&lookup, "HYPIXEL_API_KEY")?,
            discord_command_prefix: lookup("DISCORD_COMMAND_PREFIX")
                .unwrap_or(defaults.discord_command_prefix),
            refresh_interval: secs("REFRESH_INTERVAL_SECS", defaults.refresh_interval),
            sweep_interval: secs("SWEEP_INTERVAL_SECS", defaults.sweep_interval),
            notify_window: secs("NOTIFY_WINDOW_SECS", defaults.notify_window),
            recent_online_window: secs("RECENT_ONLINE_WINDOW_SECS", defaults.recent_online_window),
            lookup_timeout: secs("LOOKUP_TIMEOUT_SECS", defaults.lookup_timeout),
            lookup_concurrency: parse_or(&lookup, "LOOKUP_CONCURRENCY", defaults.lookup_concurrency)
                .max(1),
            mojang_api_url: lookup("MOJANG_API_URL").unwrap_or(defaults.mojang_api_url),
            hypixel_api_url: lookup("HYPIXEL_API_URL").unwrap_or(defaults.hypixel_api_url),
        })
    }
}

impl Default for Config {
    /// Create configuration with all default values and empty credentials
    fn default() -> Self {
        Self {
            port: 3000,
            request_timeout: Duration::from_secs(30),
            subscriptions_path: "monitored_users.json".to_string(),
            discord_token: String::new(),
            hypixel_api_key: String::new(),
            discord_command_prefix: "!".to_string(),
            refresh_interval: Duration::from_secs(5 * 60),
            sweep_interval: Duration::from_secs(60),
            notify_window: Duration::from_secs(10 * 60),
            recent_online_window: Duration::from_secs(24 * 60 * 60),
            lookup_timeout: Duration::from_secs(10),
            lookup_concurrency: 4,
            mojang_api_url: DEFAULT_MOJANG_API_URL.to_string(),
            hypixel_api_url: DEFAULT_HYPIXEL_API_URL.to_string(),
        }
    }
}

/// Parse a value or return the default
fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|val| val.parse().ok())
        .unwrap_or(default)
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<String, ConfigError> {
    lookup(key)
        .filter(|val| !val.trim().is_empty())
        .ok_or(ConfigError::MissingVar(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.subscriptions_path, "monitored_users.json");
        assert_eq!(config.discord_command_prefix, "!");
        assert_eq!(config.refresh_interval, Duration::from_secs(300));
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.notify_window, Duration::from_secs(600));
        assert_eq!(config.recent_online_window, Duration::from_secs(86400));
        assert_eq!(config.lookup_concurrency, 4);
    }

    #[test]
    fn test_credentials_are_required() {
        let err = Config::from_lookup(lookup_from(&[("HYPIXEL_API_KEY", "key")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("DISCORD_TOKEN")));

        let err = Config::from_lookup(lookup_from(&[("DISCORD_TOKEN", "token")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("HYPIXEL_API_KEY")));

        let err = Config::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "  "),
            ("HYPIXEL_API_KEY", "key"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("DISCORD_TOKEN")));
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "token"),
            ("HYPIXEL_API_KEY", "key"),
            ("PORT", "8080"),
            ("SWEEP_INTERVAL_SECS", "30"),
            ("NOTIFY_WINDOW_SECS", "not-a-number"),
            ("LOOKUP_CONCURRENCY", "0"),
        ]))
        .unwrap();

        assert_eq!(config.discord_token, "token");
        assert_eq!(config.hypixel_api_key, "key");
        assert_eq!(config.port, 8080);
        assert_eq!(config.sweep_interval, Duration::from_secs(30));
        assert_eq!(config.notify_window, Duration::from_secs(600));
        assert_eq!(config.lookup_concurrency, 1);
    }
}
