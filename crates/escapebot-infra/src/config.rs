//! Startup configuration.
//!
//! Reads the game script (`game.toml`) and the channel/model credentials.
//! The script falls back to defaults when the file is missing or malformed;
//! missing credentials are fatal.

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use secrecy::SecretString;

use escapebot_types::config::GameConfig;
use escapebot_types::error::ConfigError;

pub const CHANNEL_ACCESS_TOKEN: &str = "CHANNEL_ACCESS_TOKEN";
pub const CHANNEL_SECRET: &str = "CHANNEL_SECRET";
pub const SECRET_KEY: &str = "SECRET_KEY";

/// Location of the game script: `ESCAPEBOT_CONFIG`, else `{data_dir}/game.toml`.
pub fn game_config_path(data_dir: &Path) -> PathBuf {
    std::env::var_os("ESCAPEBOT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| data_dir.join("game.toml"))
}

/// Load the game script from `path`.
///
/// - If the file does not exist, returns [`GameConfig::default()`].
/// - If the file exists but fails to read or parse, logs a warning and returns the default.
pub async fn load_game_config(path: &Path) -> GameConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No game script at {}, using defaults", path.display());
            return GameConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return GameConfig::default();
        }
    };

    match toml::from_str::<GameConfig>(&content) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "game script loaded");
            config
        }
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            GameConfig::default()
        }
    }
}

/// Parse the configured IANA timezone name.
pub fn resolve_timezone(name: &str) -> Result<Tz, ConfigError> {
    name.parse::<Tz>()
        .map_err(|_| ConfigError::InvalidTimezone(name.to_string()))
}

/// Current time in `tz`, as stamped on history entries.
pub fn local_now(tz: Tz) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&tz).fixed_offset()
}

/// Channel and model credentials.
pub struct Credentials {
    pub channel_access_token: SecretString,
    pub channel_secret: SecretString,
    /// Generation backend API key.
    pub secret_key: SecretString,
}

impl Credentials {
    /// Read every credential from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through `lookup`. Blank values count as missing, and
    /// the error names every missing variable at once.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        let mut fetch = |name: &str| match lookup(name).filter(|v| !v.trim().is_empty()) {
            Some(value) => Some(SecretString::from(value)),
            None => {
                missing.push(name.to_string());
                None
            }
        };

        let channel_access_token = fetch(CHANNEL_ACCESS_TOKEN);
        let channel_secret = fetch(CHANNEL_SECRET);
        let secret_key = fetch(SECRET_KEY);

        match (channel_access_token, channel_secret, secret_key) {
            (Some(channel_access_token), Some(channel_secret), Some(secret_key)) => Ok(Self {
                channel_access_token,
                channel_secret,
                secret_key,
            }),
            _ => Err(ConfigError::MissingEnv(missing)),
        }
    }
}

/// Only the generation key, for local console play.
pub fn secret_key_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    lookup(SECRET_KEY)
        .filter(|v| !v.trim().is_empty())
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnv(vec![SECRET_KEY.to_string()]))
}

pub fn secret_key_from_env() -> Result<SecretString, ConfigError> {
    secret_key_from_lookup(|name| std::env::var(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[tokio::test]
    async fn load_game_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_game_config(&tmp.path().join("game.toml")).await;
        assert_eq!(config.history_window, 15);
        assert!(config.urls.locations.is_empty());
    }

    #[tokio::test]
    async fn load_game_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("game.toml");
        tokio::fs::write(
            &path,
            r#"
timezone = "UTC"

[generation]
model = "gpt-4o-mini"

[[urls.endings]]
keyword = "正解"
url = "https://example.com/true-end"
"#,
        )
        .await
        .unwrap();

        let config = load_game_config(&path).await;
        assert_eq!(config.timezone, "UTC");
        assert_eq!(config.generation.model, "gpt-4o-mini");
        assert_eq!(config.generation.max_tokens, 100);
        assert_eq!(
            config.urls.ending_url("正解"),
            Some("https://example.com/true-end")
        );
    }

    #[tokio::test]
    async fn load_game_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("game.toml");
        tokio::fs::write(&path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_game_config(&path).await;
        assert_eq!(config.keywords.finish, "終了");
    }

    #[test]
    fn example_game_script_parses() {
        let config: GameConfig =
            toml::from_str(include_str!("../../../config/game.example.toml")).unwrap();
        assert_eq!(
            config.urls.location_url("書斎の机の引き出し"),
            Some("https://example.com/clues/study-desk")
        );
        assert_eq!(config.keywords.endings, vec!["不正解", "正解"]);
        assert_eq!(config.lines.survey, GameConfig::default().lines.survey);
        assert!(resolve_timezone(&config.timezone).is_ok());
    }

    #[test]
    fn resolve_timezone_known_and_unknown() {
        assert_eq!(resolve_timezone("Asia/Tokyo").unwrap(), chrono_tz::Asia::Tokyo);
        assert!(matches!(
            resolve_timezone("Mars/Olympus"),
            Err(ConfigError::InvalidTimezone(_))
        ));
    }

    #[test]
    fn local_now_uses_zone_offset() {
        let now = local_now(chrono_tz::Asia::Tokyo);
        assert_eq!(now.offset().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn credentials_all_present() {
        let creds = Credentials::from_lookup(env(&[
            (CHANNEL_ACCESS_TOKEN, "token"),
            (CHANNEL_SECRET, "secret"),
            (SECRET_KEY, "sk-test"),
        ]))
        .unwrap();
        assert_eq!(creds.channel_secret.expose_secret(), "secret");
        assert_eq!(creds.secret_key.expose_secret(), "sk-test");
    }

    #[test]
    fn credentials_report_every_missing_name() {
        let err = Credentials::from_lookup(env(&[(CHANNEL_SECRET, "secret"), (SECRET_KEY, " ")]))
            .err()
            .unwrap();
        match err {
            ConfigError::MissingEnv(names) => {
                assert_eq!(names, vec![CHANNEL_ACCESS_TOKEN, SECRET_KEY]);
            }
            other => panic!("expected MissingEnv, got {other}"),
        }
    }

    #[test]
    fn secret_key_alone_is_enough_for_console_play() {
        assert!(secret_key_from_lookup(env(&[(SECRET_KEY, "sk")])).is_ok());
        assert!(matches!(
            secret_key_from_lookup(env(&[])),
            Err(ConfigError::MissingEnv(_))
        ));
    }
}
