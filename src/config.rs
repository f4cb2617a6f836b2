//! Service configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::db::PoolSettings;
use crate::domain::UserPolicy;
use crate::rate_limit::RateLimitSettings;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Reads:
/// - `DATABASE_URL` (required)
/// - `HOST` (default `0.0.0.0`), `PORT` (default `8080`)
/// - `DB_POOL_MAX_SIZE` (default `10`), `DB_CONNECTION_TIMEOUT_SECS` (default `5`)
/// - `REQUEST_TIMEOUT_SECS` (default `10`)
/// - `MIN_USER_AGE` (default `18`), `MIN_PASSWORD_LENGTH` (default `8`)
/// - `USER_RATE_LIMIT_PER_MINUTE` / `USER_RATE_LIMIT_BURST` (default `5` / `2`)
/// - `ORDER_RATE_LIMIT_PER_MINUTE` / `ORDER_RATE_LIMIT_BURST` (default `10` / `3`)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub pool: PoolSettings,
    pub request_timeout: Duration,
    pub user_policy: UserPolicy,
    pub user_rate_limit: RateLimitSettings,
    pub order_rate_limit: RateLimitSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let defaults = UserPolicy::default();
        let pool_defaults = PoolSettings::default();

        Ok(Self {
            database_url,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(get("PORT"), "PORT", 8080)?,
            pool: PoolSettings {
                max_size: parse_or(get("DB_POOL_MAX_SIZE"), "DB_POOL_MAX_SIZE", pool_defaults.max_size)?,
                connection_timeout: Duration::from_secs(parse_or(
                    get("DB_CONNECTION_TIMEOUT_SECS"),
                    "DB_CONNECTION_TIMEOUT_SECS",
                    pool_defaults.connection_timeout.as_secs(),
                )?),
            },
            request_timeout: Duration::from_secs(parse_or(
                get("REQUEST_TIMEOUT_SECS"),
                "REQUEST_TIMEOUT_SECS",
                10,
            )?),
            user_policy: UserPolicy {
                min_age: parse_or(get("MIN_USER_AGE"), "MIN_USER_AGE", defaults.min_age)?,
                min_password_length: parse_or(
                    get("MIN_PASSWORD_LENGTH"),
                    "MIN_PASSWORD_LENGTH",
                    defaults.min_password_length,
                )?,
            },
            user_rate_limit: rate_limit(
                &get,
                ("USER_RATE_LIMIT_PER_MINUTE", "USER_RATE_LIMIT_BURST"),
                RateLimitSettings::USER_REGISTRATION,
            )?,
            order_rate_limit: rate_limit(
                &get,
                ("ORDER_RATE_LIMIT_PER_MINUTE", "ORDER_RATE_LIMIT_BURST"),
                RateLimitSettings::ORDER_CREATION,
            )?,
        })
    }
}

fn rate_limit<G>(
    get: &G,
    (rate_key, burst_key): (&'static str, &'static str),
    default: RateLimitSettings,
) -> Result<RateLimitSettings, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    Ok(RateLimitSettings {
        per_minute: parse_or(get(rate_key), rate_key, default.per_minute)?,
        burst: parse_or(get(burst_key), burst_key, default.burst)?,
    })
}

fn parse_or<T: FromStr>(
    raw: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
