//! Configuration module for the course bot.
//!
//! Handles the bot token, the progress database location and the paths
//! of the course content.

mod settings;

pub use settings::{BotSettings, ConfigError, TelegramConfig};
