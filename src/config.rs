use crate::services::firebase_auth::DEFAULT_FIREBASE_AUTH_URL;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub firebase_api_key: String,
    pub firebase_auth_url: String,
    pub resend_cooldown: Duration,
    pub session_idle_timeout: Duration,
    pub session_reaper_interval: Duration,
    pub password_hash_cost: u32,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{0} has an invalid value: {1}")]
    Invalid(&'static str, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_or("PORT", 3002)?,
            database_url: required("DATABASE_URL")?,
            firebase_api_key: required("FIREBASE_API_KEY")?,
            firebase_auth_url: env::var("FIREBASE_AUTH_URL")
                .unwrap_or_else(|_| DEFAULT_FIREBASE_AUTH_URL.to_string()),
            resend_cooldown: Duration::from_secs(parse_or("RESEND_COOLDOWN_SECS", 30)?),
            session_idle_timeout: Duration::from_secs(parse_or("SESSION_IDLE_TIMEOUT_SECS", 1800)?),
            session_reaper_interval: Duration::from_secs(
                parse_or("SESSION_REAPER_INTERVAL_SECS", 60)?.max(5),
            ),
            password_hash_cost: parse_or("PASSWORD_HASH_COST", bcrypt::DEFAULT_COST)?,
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn parse_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(key, raw)),
        Err(_) => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_list_ignores_blanks() {
        assert_eq!(
            split_list("http://localhost:3000, ,http://127.0.0.1:8081,"),
            vec!["http://localhost:3000", "http://127.0.0.1:8081"]
        );
    }

    #[test]
    fn unset_numbers_fall_back() {
        assert_eq!(parse_or("CAMPUS_IDENTITY_TEST_UNSET_PORT", 3002u16).unwrap(), 3002);
    }
}
