// Bot configuration, loaded from the environment (and `.env`, via dotenv).
//
// Only the token is required. Everything else has the defaults the core
// config types carry, but a value that is present and malformed is an error
// rather than being quietly replaced by the default.

use crate::core::moderation::{ModerationConfig, ModerationPolicy};
use crate::core::relay::RelayConfig;
use std::str::FromStr;
use thiserror::Error;

/// Longest accepted duration setting: one (leap) year. Telegram treats a
/// restriction longer than 366 days as permanent.
const MAX_DURATION_SECS: u64 = 366 * 24 * 60 * 60;
/// Telegram treats a restriction shorter than 30 seconds as permanent too.
const MIN_MUTE_SECS: u64 = 30;
/// Upper bound on the getUpdates long-poll timeout
const MAX_POLL_TIMEOUT_SECS: u64 = 3_600;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing {0} environment variable! Create a .env file with your bot token.")]
    MissingVar(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    InvalidVar { name: &'static str, value: String },
}

/// Everything the bot needs at startup.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub telegram_token: String,
    /// Long-polling timeout for getUpdates (seconds)
    pub poll_timeout_secs: u64,
    pub moderation: ModerationConfig,
    pub relay: RelayConfig,
}

impl BotConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let telegram_token = env
            .get("TELEGRAM_TOKEN")
            .ok_or(ConfigError::MissingVar("TELEGRAM_TOKEN"))?;

        let moderation_defaults = ModerationConfig::default();
        let policy_defaults = ModerationPolicy::default();
        let relay_defaults = RelayConfig::default();

        let policy = ModerationPolicy {
            pin_admin_messages: env
                .flag("PIN_ADMIN_MESSAGES")?
                .unwrap_or(policy_defaults.pin_admin_messages),
            spam_detection: env
                .flag("SPAM_DETECTION")?
                .unwrap_or(policy_defaults.spam_detection),
            ban_escalation: env
                .flag("BAN_ESCALATION")?
                .unwrap_or(policy_defaults.ban_escalation),
            welcome_new_members: env
                .flag("WELCOME_NEW_MEMBERS")?
                .unwrap_or(policy_defaults.welcome_new_members),
        };

        let moderation = ModerationConfig {
            spam_message_limit: env
                .bounded("SPAM_MSG_LIMIT", 1, usize::MAX)?
                .unwrap_or(moderation_defaults.spam_message_limit),
            spam_window_secs: env
                .bounded("SPAM_TIME_WINDOW_SECS", 1, MAX_DURATION_SECS)?
                .unwrap_or(moderation_defaults.spam_window_secs),
            mute_duration_secs: env
                .bounded("MUTE_DURATION_SECS", MIN_MUTE_SECS, MAX_DURATION_SECS)?
                .unwrap_or(moderation_defaults.mute_duration_secs),
            max_warnings: env
                .parse("MAX_WARNINGS")?
                .unwrap_or(moderation_defaults.max_warnings),
            admin_contact: env.chat_id("ADMIN_ID")?,
            tracked_users_cap: env
                .bounded("TRACKED_USERS_CAP", 1, usize::MAX)?
                .unwrap_or(moderation_defaults.tracked_users_cap),
            tracked_user_ttl_secs: env
                .bounded("TRACKED_USER_TTL_SECS", 1, MAX_DURATION_SECS)?
                .unwrap_or(moderation_defaults.tracked_user_ttl_secs),
            policy,
        };

        let relay = RelayConfig {
            target_chat_id: env.chat_id("TARGET_CHAT_ID")?,
            interval_secs: env
                .bounded("RELAY_INTERVAL_SECS", 1, MAX_DURATION_SECS)?
                .unwrap_or(relay_defaults.interval_secs),
            first_delay_secs: env
                .bounded("RELAY_FIRST_DELAY_SECS", 0, MAX_DURATION_SECS)?
                .unwrap_or(relay_defaults.first_delay_secs),
        };

        Ok(Self {
            telegram_token,
            poll_timeout_secs: env
                .bounded("POLL_TIMEOUT_SECS", 0, MAX_POLL_TIMEOUT_SECS)?
                .unwrap_or(30),
            moderation,
            relay,
        })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Trimmed, non-blank value of a variable.
    fn get(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T: FromStr>(&self, name: &'static str) -> Result<Option<T>, ConfigError> {
        match self.get(name) {
            None => Ok(None),
            Some(value) => value
                .parse::<T>()
                .map(Some)
                .map_err(|_| ConfigError::InvalidVar { name, value }),
        }
    }

    /// Like `parse`, but values outside `min..=max` are rejected too.
    fn bounded<T>(&self, name: &'static str, min: T, max: T) -> Result<Option<T>, ConfigError>
    where
        T: FromStr + PartialOrd,
    {
        match self.parse::<T>(name)? {
            Some(value) if value < min || value > max => Err(ConfigError::InvalidVar {
                name,
                value: self.get(name).unwrap_or_default(),
            }),
            parsed => Ok(parsed),
        }
    }

    /// A chat or user id where 0 means "not set".
    fn chat_id(&self, name: &'static str) -> Result<Option<i64>, ConfigError> {
        Ok(self.parse::<i64>(name)?.filter(|id| *id != 0))
    }

    fn flag(&self, name: &'static str) -> Result<Option<bool>, ConfigError> {
        match self.get(name) {
            None => Ok(None),
            Some(value) => match value.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(Some(true)),
                "0" | "false" | "no" | "off" => Ok(Some(false)),
                _ => Err(ConfigError::InvalidVar { name, value }),
            },
        }
    }
}
