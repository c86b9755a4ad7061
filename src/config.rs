//! Runtime configuration read from the environment.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::Snowflake;

pub const DEFAULT_API_URL: &str = "https://discord.com/api/v10";
pub const DEFAULT_CDN_URL: &str = "https://cdn.discordapp.com";
const DEFAULT_CHANNEL_ID: &str = "1166970462094503936";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("DISCORD_BOT_TOKEN is not set")]
    MissingToken,

    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub api_url: String,
    pub cdn_url: String,
    /// Matched longest first; trailing whitespace is significant.
    pub prefixes: Vec<String>,
    pub trigger_words: Vec<String>,
    pub reaction_emoji: String,
    pub announce_channel_id: Snowflake,
    pub tournament_channel_id: Snowflake,
    pub owner_ids: Vec<Snowflake>,
    pub data_file: PathBuf,
    /// `None` turns the liveness endpoint off.
    pub health_addr: Option<String>,
}

impl Config {
    /// Reads the process environment, after loading `.env` if there is one.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("DISCORD_BOT_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let prefixes = split_list(&get("BOT_PREFIXES", "-,afgm "), false);
        if prefixes.is_empty() {
            return Err(ConfigError::Invalid {
                key: "BOT_PREFIXES",
                value: get("BOT_PREFIXES", ""),
            });
        }

        let owner_ids = split_list(&get("BOT_OWNER_IDS", ""), true);
        if let Some(bad) = owner_ids.iter().find(|id| !is_snowflake(id)) {
            return Err(ConfigError::Invalid { key: "BOT_OWNER_IDS", value: bad.clone() });
        }

        let health_addr = get("HEALTH_ADDR", "0.0.0.0:8080");

        Ok(Self {
            token,
            api_url: get("DISCORD_API_URL", DEFAULT_API_URL),
            cdn_url: get("DISCORD_CDN_URL", DEFAULT_CDN_URL),
            prefixes,
            trigger_words: split_list(&get("TRIGGER_WORDS", "afgm"), true)
                .into_iter()
                .map(|w| w.to_lowercase())
                .collect(),
            reaction_emoji: get("REACTION_EMOJI", "👀"),
            announce_channel_id: snowflake("ANNOUNCE_CHANNEL_ID", get("ANNOUNCE_CHANNEL_ID", DEFAULT_CHANNEL_ID))?,
            tournament_channel_id: snowflake("TOURNAMENT_CHANNEL_ID", get("TOURNAMENT_CHANNEL_ID", DEFAULT_CHANNEL_ID))?,
            owner_ids,
            data_file: PathBuf::from(get("DATA_FILE", "data.json")),
            health_addr: Some(health_addr.trim().to_string()).filter(|a| !a.is_empty()),
        })
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner_ids.iter().any(|id| id == user_id)
    }

    /// The prefix shown in help texts and error hints.
    pub fn display_prefix(&self) -> &str {
        self.prefixes.first().map(String::as_str).unwrap_or("-")
    }
}

fn split_list(raw: &str, trim: bool) -> Vec<String> {
    raw.split(',')
        .map(|item| if trim { item.trim() } else { item })
        .filter(|item| !item.trim().is_empty())
        .map(String::from)
        .collect()
}

fn is_snowflake(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

fn snowflake(key: &'static str, value: String) -> Result<Snowflake, ConfigError> {
    let value = value.trim().to_string();
    if is_snowflake(&value) {
        Ok(value)
    } else {
        Err(ConfigError::Invalid { key, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn missing_token_is_fatal() {
        assert!(matches!(config(&[]), Err(ConfigError::MissingToken)));
        assert!(matches!(
            config(&[("DISCORD_BOT_TOKEN", "  ")]),
            Err(ConfigError::MissingToken)
        ));
    }

    #[test]
    fn defaults_match_the_deployed_bot() {
        let cfg = config(&[("DISCORD_BOT_TOKEN", "t")]).unwrap();
        assert_eq!(cfg.prefixes, vec!["-".to_string(), "afgm ".to_string()]);
        assert_eq!(cfg.trigger_words, vec!["afgm".to_string()]);
        assert_eq!(cfg.announce_channel_id, "1166970462094503936");
        assert_eq!(cfg.data_file, PathBuf::from("data.json"));
        assert_eq!(cfg.health_addr.as_deref(), Some("0.0.0.0:8080"));
        assert!(cfg.owner_ids.is_empty());
    }

    #[test]
    fn prefixes_keep_trailing_whitespace() {
        let cfg = config(&[("DISCORD_BOT_TOKEN", "t"), ("BOT_PREFIXES", "!,bot ")]).unwrap();
        assert_eq!(cfg.prefixes, vec!["!".to_string(), "bot ".to_string()]);
        assert_eq!(cfg.display_prefix(), "!");
    }

    #[test]
    fn non_numeric_channel_is_rejected() {
        let err = config(&[("DISCORD_BOT_TOKEN", "t"), ("ANNOUNCE_CHANNEL_ID", "general")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "ANNOUNCE_CHANNEL_ID", .. }));
    }

    #[test]
    fn owners_and_disabled_health() {
        let cfg = config(&[
            ("DISCORD_BOT_TOKEN", "t"),
            ("BOT_OWNER_IDS", "11, 22"),
            ("HEALTH_ADDR", ""),
        ])
        .unwrap();
        assert!(cfg.is_owner("22"));
        assert!(!cfg.is_owner("33"));
        assert!(cfg.health_addr.is_none());
    }
}
