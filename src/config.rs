//! Runtime settings, read from the environment once at startup.

use std::str::FromStr;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calendar::CalendarConfig;
use crate::rate_limiter::RateLimitConfig;
use crate::sequencer::DEFAULT_WIDTH;

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::London;

/// Longest accepted rate-limit window: a leap year.
pub const MAX_WINDOW_SECS: i64 = 366 * 24 * 60 * 60;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("{var} is not a valid value: {value:?}")]
    Invalid { var: &'static str, value: String },
    #[error("{var} must be greater than zero")]
    NotPositive { var: &'static str },
    #[error("unknown timezone {0:?}")]
    UnknownTimezone(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub rate_limit: RateLimitConfig,
    /// Minimum digits of the sequence part of a public id.
    pub id_width: usize,
    /// Zone used for "today" and for the year of new identifiers.
    pub timezone: Tz,
    pub calendar: CalendarConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitConfig::default(),
            id_width: DEFAULT_WIDTH,
            timezone: DEFAULT_TIMEZONE,
            calendar: CalendarConfig::default(),
        }
    }
}

fn parse_positive<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value: T = raw
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { var, value: raw.clone() })?;
    if value <= T::default() {
        return Err(ConfigError::NotPositive { var });
    }
    Ok(value)
}

fn parse_window(raw: Option<String>, default: i64) -> Result<i64, ConfigError> {
    const VAR: &str = "RATELIMIT_WINDOW_SECS";
    let secs = parse_positive(VAR, raw, default)?;
    if secs > MAX_WINDOW_SECS {
        return Err(ConfigError::Invalid { var: VAR, value: secs.to_string() });
    }
    Ok(secs)
}

impl TrackerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the config from any variable source. Unset variables take
    /// their defaults; set but malformed ones are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let rate_limit = RateLimitConfig {
            max_attempts: parse_positive("RATELIMIT_MAX_PER_HOUR", get("RATELIMIT_MAX_PER_HOUR"), defaults.rate_limit.max_attempts)?,
            window_secs: parse_window(get("RATELIMIT_WINDOW_SECS"), defaults.rate_limit.window_secs)?,
            max_tracked_keys: parse_positive("RATELIMIT_MAX_KEYS", get("RATELIMIT_MAX_KEYS"), defaults.rate_limit.max_tracked_keys)?,
            ..defaults.rate_limit
        };
        let id_width = parse_positive("PUBLIC_ID_WIDTH", get("PUBLIC_ID_WIDTH"), defaults.id_width)?;

        let timezone = match get("TRACKER_TIMEZONE") {
            Some(name) => Tz::from_str(name.trim()).map_err(|_| ConfigError::UnknownTimezone(name))?,
            None => defaults.timezone,
        };

        let calendar = CalendarConfig {
            prod_id: get("CALENDAR_PRODID").unwrap_or(defaults.calendar.prod_id),
            uid_domain: get("CALENDAR_UID_DOMAIN").unwrap_or(defaults.calendar.uid_domain),
            calendar_name: get("CALENDAR_NAME").unwrap_or(defaults.calendar.calendar_name),
        };

        Ok(Self {
            rate_limit,
            id_width,
            timezone,
            calendar,
        })
    }
}
