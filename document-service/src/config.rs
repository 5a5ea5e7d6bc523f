use chrono::Duration;
use shared::pagination::PaginationConfig;
use thiserror::Error;
use url::Url;

use crate::infrastructure::token::{
    DEFAULT_ACCESS_EXPIRY_MINS, DEFAULT_REFRESH_EXPIRY_DAYS, JwtConfig,
};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_PAGINATION_CONFIG_PATH: &str = "pagination.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Process-wide settings, read once at startup.
///
/// | Env Var                   | Required | Default           |
/// |---------------------------|----------|-------------------|
/// | `DATABASE_URL`            | yes      |                   |
/// | `REDIS_URL`               | yes      |                   |
/// | `JWT_SECRET`              | yes      |                   |
/// | `SERVER_PORT`             | no       | `8080`            |
/// | `JWT_ACCESS_EXPIRY_MINS`  | no       | `60`              |
/// | `JWT_REFRESH_EXPIRY_DAYS` | no       | `1`               |
/// | `PUBLIC_BASE_URL`         | no       | from `Host`       |
/// | `PAGINATION_CONFIG_PATH`  | no       | `pagination.toml` |
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub redis_url: String,
    pub port: u16,
    pub jwt: JwtConfig,
    /// Scheme and host used for pagination links instead of the request's `Host`.
    pub public_base_url: Option<Url>,
    pub pagination: PaginationConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let port = parse_or(get("SERVER_PORT"), "SERVER_PORT", DEFAULT_PORT)?;
        let access_mins = parse_or(
            get("JWT_ACCESS_EXPIRY_MINS"),
            "JWT_ACCESS_EXPIRY_MINS",
            DEFAULT_ACCESS_EXPIRY_MINS,
        )?;
        let refresh_days = parse_or(
            get("JWT_REFRESH_EXPIRY_DAYS"),
            "JWT_REFRESH_EXPIRY_DAYS",
            DEFAULT_REFRESH_EXPIRY_DAYS,
        )?;

        let access_ttl =
            positive_ttl(access_mins, "JWT_ACCESS_EXPIRY_MINS", Duration::try_minutes)?;
        let refresh_ttl =
            positive_ttl(refresh_days, "JWT_REFRESH_EXPIRY_DAYS", Duration::try_days)?;

        let public_base_url = get("PUBLIC_BASE_URL")
            .map(|raw| {
                Url::parse(&raw).map_err(|e| ConfigError::Invalid {
                    name: "PUBLIC_BASE_URL",
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let pagination_path = get("PAGINATION_CONFIG_PATH")
            .unwrap_or_else(|| DEFAULT_PAGINATION_CONFIG_PATH.to_string());
        let pagination =
            PaginationConfig::load(&pagination_path).map_err(|e| ConfigError::Invalid {
                name: "PAGINATION_CONFIG_PATH",
                reason: e.to_string(),
            })?;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            redis_url: required("REDIS_URL")?,
            port,
            jwt: JwtConfig {
                secret: required("JWT_SECRET")?,
                access_ttl,
                refresh_ttl,
            },
            public_base_url,
            pagination,
        })
    }
}

fn parse_or<T>(raw: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn positive_ttl(
    value: i64,
    name: &'static str,
    to_duration: fn(i64) -> Option<Duration>,
) -> Result<Duration, ConfigError> {
    to_duration(value)
        .filter(|ttl| *ttl > Duration::zero())
        .ok_or_else(|| ConfigError::Invalid {
            name,
            reason: format!("{value} is not a usable token lifetime"),
        })
}
