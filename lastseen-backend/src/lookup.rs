//! Last-login lookups against Mojang and Hypixel.
//!
//! Resolving a name takes two calls: Mojang maps the name to an account uuid,
//! then Hypixel returns the player profile with `lastLogin` in epoch millis.
//! Every failure collapses to "unknown" for the caller; the distinction only
//! shows up in the logs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use crate::config::Config;
use crate::error::LookupError;

/// Source of last-login instants.
#[async_trait]
pub trait LoginLookup: Send + Sync {
    /// Most recent login of `player`, or `None` when it cannot be determined.
    /// Never fails: transport errors degrade to `None`.
    async fn last_login(&self, player: &str) -> Option<DateTime<Utc>>;
}

#[derive(Debug, Deserialize)]
struct MojangProfile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PlayerResponse {
    success: bool,
    #[serde(default)]
    cause: Option<String>,
    #[serde(default)]
    player: Option<PlayerProfile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerProfile {
    #[serde(default)]
    last_login: Option<i64>,
}

/// HTTP client for the Mojang profile API and the Hypixel v2 player API.
pub struct HypixelClient {
    http: reqwest::Client,
    api_key: String,
    mojang_url: Url,
    hypixel_url: String,
}

impl HypixelClient {
    pub fn new(config: &Config) -> Result<Self, LookupError> {
        let http = reqwest::Client::builder()
            .timeout(config.lookup_timeout)
            .user_agent(concat!("lastseen/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let mojang_url = Url::parse(&config.mojang_api_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| LookupError::InvalidBaseUrl(config.mojang_api_url.clone()))?;

        Ok(Self {
            http,
            api_key: config.hypixel_api_key.clone(),
            mojang_url,
            hypixel_url: config.hypixel_api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Both calls, with the reason for an empty result preserved.
    pub async fn lookup(&self, player: &str) -> Result<Option<DateTime<Utc>>, LookupError> {
        let uuid = self.resolve_uuid(player).await?;
        self.fetch_last_login(&uuid).await
    }

    async fn resolve_uuid(&self, player: &str) -> Result<String, LookupError> {
        let response = self.http.get(self.profile_url(player)?).send().await?;

        // Mojang answers unknown names with 204 or 404
        if response.status() != StatusCode::OK {
            return Err(LookupError::UnknownPlayer(player.to_string()));
        }

        let profile: MojangProfile = response.json().await?;
        Ok(profile.id)
    }

    /// `{mojang}/users/profiles/minecraft/{player}` with the name as one
    /// percent-encoded segment, so `#`, `?` or `/` cannot change the request.
    fn profile_url(&self, player: &str) -> Result<Url, LookupError> {
        let mut url = self.mojang_url.clone();
        url.path_segments_mut()
            .map_err(|_| LookupError::InvalidBaseUrl(self.mojang_url.to_string()))?
            .pop_if_empty()
            .extend(["users", "profiles", "minecraft", player]);
        Ok(url)
    }

    async fn fetch_last_login(&self, uuid: &str) -> Result<Option<DateTime<Utc>>, LookupError> {
        let response = self
            .http
            .get(format!("{}/v2/player", self.hypixel_url))
            .query(&[("uuid", uuid)])
            .header("API-Key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Rejected(status.to_string()));
        }

        let body: PlayerResponse = response.json().await?;
        last_login_from(body)
    }
}

#[async_trait]
impl LoginLookup for HypixelClient {
    async fn last_login(&self, player: &str) -> Option<DateTime<Utc>> {
        match self.lookup(player).await {
            Ok(Some(at)) => {
                tracing::debug!(player, last_login = %at, "fetched last login");
                Some(at)
            }
            Ok(None) => {
                tracing::info!(player, "no login data recorded");
                None
            }
            Err(LookupError::UnknownPlayer(_)) => {
                tracing::info!(player, "could not resolve player uuid");
                None
            }
            Err(e) => {
                tracing::warn!(player, error = %e, "last login lookup failed");
                None
            }
        }
    }
}

fn last_login_from(response: PlayerResponse) -> Result<Option<DateTime<Utc>>, LookupError> {
    if !response.success {
        return Err(LookupError::Rejected(
            response.cause.unwrap_or_else(|| "unknown cause".to_string()),
        ));
    }

    match response.player.and_then(|p| p.last_login) {
        None => Ok(None),
        Some(millis) => DateTime::from_timestamp_millis(millis)
            .map(Some)
            .ok_or(LookupError::InvalidTimestamp(millis)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn client(mojang_api_url: &str) -> HypixelClient {
        let config = Config {
            mojang_api_url: mojang_api_url.to_string(),
            ..Config::default()
        };
        HypixelClient::new(&config).unwrap()
    }

    fn parse(json: &str) -> Result<Option<DateTime<Utc>>, LookupError> {
        last_login_from(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_last_login_is_utc_millis() {
        let at = parse(r#"{"success": true, "player": {"lastLogin": 1700000000123}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(
            at,
            Utc.timestamp_millis_opt(1_700_000_000_123).unwrap()
        );
    }

    #[test]
    fn test_missing_login_data_is_none() {
        assert!(parse(r#"{"success": true, "player": null}"#).unwrap().is_none());
        assert!(parse(r#"{"success": true, "player": {}}"#).unwrap().is_none());
        assert!(parse(r#"{"success": true}"#).unwrap().is_none());
    }

    #[test]
    fn test_unsuccessful_response_is_rejected() {
        let err = parse(r#"{"success": false, "cause": "Invalid API key"}"#).unwrap_err();
        assert!(matches!(err, LookupError::Rejected(cause) if cause == "Invalid API key"));
    }

    #[test]
    fn test_out_of_range_timestamp() {
        let err = parse(r#"{"success": true, "player": {"lastLogin": 9223372036854775807}}"#)
            .unwrap_err();
        assert!(matches!(err, LookupError::InvalidTimestamp(_)));
    }

    #[test]
    fn test_profile_url_encodes_player_name() {
        let client = client("https://mojang.example/");
        assert_eq!(
            client.profile_url("Steve").unwrap().as_str(),
            "https://mojang.example/users/profiles/minecraft/Steve"
        );
        assert_eq!(
            client.profile_url("Steve#x").unwrap().as_str(),
            "https://mojang.example/users/profiles/minecraft/Steve%23x"
        );
        assert_eq!(
            client.profile_url("a/../b?x").unwrap().as_str(),
            "https://mojang.example/users/profiles/minecraft/a%2F..%2Fb%3Fx"
        );
    }

    #[test]
    fn test_profile_url_keeps_base_path() {
        let client = client("http://127.0.0.1:8080/mojang");
        assert_eq!(
            client.profile_url("Steve").unwrap().as_str(),
            "http://127.0.0.1:8080/mojang/users/profiles/minecraft/Steve"
        );
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let config = Config {
            mojang_api_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            HypixelClient::new(&config),
            Err(LookupError::InvalidBaseUrl(_))
        ));
    }
}
