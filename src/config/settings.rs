//! Application settings and Telegram configuration.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Telegram Bot API configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by @BotFather.
    pub bot_token: String,
}

// Keeps the token out of logs
impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .finish()
    }
}

impl TelegramConfig {
    /// Creates a new Telegram configuration.
    #[must_use]
    pub fn new(bot_token: String) -> Self {
        Self { bot_token }
    }

    /// Creates configuration from environment variables.
    ///
    /// Reads `BOT_TOKEN`, falling back to `TELOXIDE_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns an error if neither variable is set or the token is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    ///
    /// # Errors
    ///
    /// Returns an error if neither variable is set or the token is malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bot_token = lookup("BOT_TOKEN")
            .or_else(|| lookup("TELOXIDE_TOKEN"))
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingEnvVar("BOT_TOKEN"))?;

        // Tokens look like "123456:ABC-DEF..."
        let well_formed = bot_token
            .split_once(':')
            .is_some_and(|(id, secret)| {
                !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) && !secret.is_empty()
            });
        if !well_formed {
            return Err(ConfigError::InvalidToken);
        }

        Ok(Self { bot_token })
    }
}

/// Bot-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// sqlx connection URL of the progress database.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Catalog JSON file. The built-in catalog is used when unset.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,

    /// Page library JSON file. The built-in pages are used when unset.
    #[serde(default)]
    pub pages_path: Option<PathBuf>,

    /// Directory page illustrations are loaded from.
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,
}

fn default_database_url() -> String {
    "sqlite://user_progress.db".to_owned()
}

fn default_images_dir() -> PathBuf {
    PathBuf::from("images")
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            catalog_path: None,
            pages_path: None,
            images_dir: default_images_dir(),
        }
    }
}

impl BotSettings {
    /// Creates bot settings from environment variables with defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env_with_defaults`](Self::from_env_with_defaults) with a
    /// custom variable source.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            database_url: non_empty("DATABASE_URL").unwrap_or_else(default_database_url),
            catalog_path: non_empty("CATALOG_PATH").map(PathBuf::from),
            pages_path: non_empty("PAGES_PATH").map(PathBuf::from),
            images_dir: non_empty("IMAGES_DIR").map_or_else(default_images_dir, PathBuf::from),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid bot token format (expected <bot id>:<secret>)")]
    InvalidToken,
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_settings() {
        let settings = BotSettings::default();
        assert_eq!(settings.database_url, "sqlite://user_progress.db");
        assert_eq!(settings.images_dir, PathBuf::from("images"));
        assert!(settings.catalog_path.is_none());
    }

    #[test]
    fn test_settings_from_lookup() {
        let settings = BotSettings::from_lookup(env(&[
            ("DATABASE_URL", "sqlite://data/progress.db"),
            ("CATALOG_PATH", "course/catalog.json"),
            ("IMAGES_DIR", ""),
        ]));
        assert_eq!(settings.database_url, "sqlite://data/progress.db");
        assert_eq!(settings.catalog_path, Some(PathBuf::from("course/catalog.json")));
        assert!(settings.pages_path.is_none());
        assert_eq!(settings.images_dir, PathBuf::from("images"));
    }

    #[test]
    fn test_token_fallback() {
        let config = TelegramConfig::from_lookup(env(&[("TELOXIDE_TOKEN", "123:abc")])).unwrap();
        assert_eq!(config.bot_token, "123:abc");

        let config = TelegramConfig::from_lookup(env(&[
            ("BOT_TOKEN", " 456:def "),
            ("TELOXIDE_TOKEN", "123:abc"),
        ]))
        .unwrap();
        assert_eq!(config.bot_token, "456:def");
    }

    #[test]
    fn test_token_errors() {
        assert!(matches!(
            TelegramConfig::from_lookup(env(&[])),
            Err(ConfigError::MissingEnvVar("BOT_TOKEN"))
        ));
        assert!(matches!(
            TelegramConfig::from_lookup(env(&[("BOT_TOKEN", "not-a-token")])),
            Err(ConfigError::InvalidToken)
        ));
    }

    #[test]
    fn test_token_is_redacted() {
        let config = TelegramConfig::new("123:secret".to_owned());
        assert!(!format!("{config:?}").contains("secret"));
    }
}
