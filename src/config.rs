// src/config.rs
//! Runtime settings for the sync service.
//!
//! Values come from the process environment (after `.env` has been loaded
//! by `main`). Every setting is optional at load time so the server can
//! start and report which one is missing; accessors turn absence into
//! [`AuthError::ConfigurationMissing`].

use crate::error::AuthError;
use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

const DEFAULT_TABLE: &str = "telegram_users";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Process-wide settings, built once at startup and passed by reference.
#[derive(Clone, Deserialize)]
pub struct Settings {
    /// Issuing bot's private token (`TELEGRAM_BOT_TOKEN`)
    #[serde(default)]
    telegram_bot_token: Option<String>,
    /// Hosted store base URL (`SUPABASE_URL`)
    #[serde(default)]
    supabase_url: Option<String>,
    /// Hosted store service key (`SUPABASE_KEY`)
    #[serde(default)]
    supabase_key: Option<String>,
    /// Table receiving user rows (`SUPABASE_TABLE`)
    pub supabase_table: String,
    /// Listen address (`BIND_ADDR`)
    pub bind_addr: String,
}

impl Settings {
    /// Loads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(None)
    }

    /// Loads settings from an explicit variable map instead of the process
    /// environment. Keys use the environment spelling (`SUPABASE_URL`).
    pub fn from_source(vars: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("supabase_table", DEFAULT_TABLE)?
            .set_default("bind_addr", DEFAULT_BIND_ADDR)?
            .add_source(Environment::default().ignore_empty(true).source(vars))
            .build()?
            .try_deserialize()
    }

    /// The bot token, or `ConfigurationMissing` when unset or empty.
    pub fn bot_token(&self) -> Result<&str, AuthError> {
        non_empty(&self.telegram_bot_token)
            .ok_or(AuthError::ConfigurationMissing("TELEGRAM_BOT_TOKEN"))
    }

    /// Store URL and key, or `ConfigurationMissing` naming the first unset one.
    pub fn supabase(&self) -> Result<(&str, &str), AuthError> {
        let url = non_empty(&self.supabase_url)
            .ok_or(AuthError::ConfigurationMissing("SUPABASE_URL"))?;
        let key = non_empty(&self.supabase_key)
            .ok_or(AuthError::ConfigurationMissing("SUPABASE_KEY"))?;
        Ok((url, key))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| if non_empty(v).is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Settings")
            .field("telegram_bot_token", &redact(&self.telegram_bot_token))
            .field("supabase_url", &self.supabase_url)
            .field("supabase_key", &redact(&self.supabase_key))
            .field("supabase_table", &self.supabase_table)
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults_apply() {
        let settings = Settings::from_source(vars(&[])).unwrap();
        assert_eq!(settings.supabase_table, "telegram_users");
        assert_eq!(settings.bind_addr, "127.0.0.1:3000");
        assert_eq!(
            settings.bot_token(),
            Err(AuthError::ConfigurationMissing("TELEGRAM_BOT_TOKEN"))
        );
    }

    #[test]
    fn test_reads_environment_spelling() {
        let settings = Settings::from_source(vars(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("SUPABASE_URL", "https://db.example"),
            ("SUPABASE_KEY", "service"),
            ("BIND_ADDR", "0.0.0.0:8080"),
        ]))
        .unwrap();
        assert_eq!(settings.bot_token(), Ok("123:abc"));
        assert_eq!(settings.supabase(), Ok(("https://db.example", "service")));
        assert_eq!(settings.bind_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_empty_values_count_as_missing() {
        let settings = Settings::from_source(vars(&[
            ("TELEGRAM_BOT_TOKEN", ""),
            ("SUPABASE_URL", "https://db.example"),
        ]))
        .unwrap();
        assert!(settings.bot_token().is_err());
        assert_eq!(
            settings.supabase(),
            Err(AuthError::ConfigurationMissing("SUPABASE_KEY"))
        );
    }

    #[test]
    fn test_empty_values_fall_back_to_defaults() {
        let settings = Settings::from_source(vars(&[
            ("SUPABASE_TABLE", ""),
            ("BIND_ADDR", ""),
        ]))
        .unwrap();
        assert_eq!(settings.supabase_table, "telegram_users");
        assert_eq!(settings.bind_addr, "127.0.0.1:3000");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let settings = Settings::from_source(vars(&[
            ("TELEGRAM_BOT_TOKEN", "123:very-secret"),
            ("SUPABASE_KEY", "service-secret"),
        ]))
        .unwrap();
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("very-secret"));
        assert!(!rendered.contains("service-secret"));
        assert!(rendered.contains("<set>"));
    }
}
