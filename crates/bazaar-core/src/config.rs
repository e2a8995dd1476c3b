//! Helpers for loading service configuration from environment variables.
//!
//! Service config structs call these from their `from_env()` constructors.
//! Optional values fall back to a default when the variable is unset or fails
//! to parse, the latter with a warning naming the variable. Required values
//! panic at startup.

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Read a required variable.
///
/// # Panics
///
/// Panics if the variable is missing, which aborts service startup.
pub fn required(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| panic!("missing required env var {key}"))
}

/// Read a string variable, falling back to `default`.
pub fn string_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Read and parse a variable, falling back to `default`.
pub fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    parse_value(key, std::env::var(key).ok(), default)
}

/// Read a duration expressed in milliseconds.
pub fn millis_or(key: &str, default: Duration) -> Duration {
    Duration::from_millis(parse_value(
        key,
        std::env::var(key).ok(),
        default.as_millis() as u64,
    ))
}

/// Read a duration expressed in whole seconds.
pub fn secs_or(key: &str, default: Duration) -> Duration {
    Duration::from_secs(parse_value(key, std::env::var(key).ok(), default.as_secs()))
}

/// Read a boolean flag (`1/0`, `true/false`, `yes/no`, `on/off`).
pub fn flag_or(key: &str, default: bool) -> bool {
    let Ok(raw) = std::env::var(key) else {
        return default;
    };
    parse_flag(&raw).unwrap_or_else(|| {
        warn!(key, value = %raw, "ignoring unparsable env var, using default");
        default
    })
}

fn parse_value<T: FromStr>(key: &str, raw: Option<String>, default: T) -> T {
    let Some(raw) = raw else {
        return default;
    };
    raw.trim().parse().unwrap_or_else(|_| {
        warn!(key, value = %raw, "ignoring unparsable env var, using default");
        default
    })
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
