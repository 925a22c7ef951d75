//! Validation helpers and parsing utilities for configuration values.

use std::num::NonZeroU32;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::defaults::MAX_DURATION_SECS;
use crate::error::{ConfigError, ConfigResult};

#[allow(clippy::redundant_pub_crate)]
pub(crate) fn parse_max_count(field: &'static str, raw: &str) -> ConfigResult<NonZeroU32> {
    let trimmed = raw.trim();
    let count = trimmed
        .parse::<u32>()
        .map_err(|_| ConfigError::invalid_field(field, "not_an_integer", trimmed))?;
    NonZeroU32::new(count)
        .ok_or_else(|| ConfigError::invalid_field(field, "must_be_positive", trimmed))
}

#[allow(clippy::redundant_pub_crate)]
pub(crate) fn parse_positive_secs(field: &'static str, raw: &str) -> ConfigResult<Duration> {
    let secs = parse_positive_u64(field, raw)?;
    if secs > MAX_DURATION_SECS {
        return Err(ConfigError::invalid_field(field, "out_of_range", raw.trim()));
    }
    Ok(Duration::from_secs(secs))
}

#[allow(clippy::redundant_pub_crate)]
pub(crate) fn parse_positive_millis(field: &'static str, raw: &str) -> ConfigResult<Duration> {
    bounded_millis(field, parse_positive_u64(field, raw)?)
}

fn bounded_millis(field: &'static str, millis: u64) -> ConfigResult<Duration> {
    if millis > MAX_DURATION_SECS.saturating_mul(1_000) {
        return Err(ConfigError::invalid_field(
            field,
            "out_of_range",
            millis.to_string(),
        ));
    }
    Ok(Duration::from_millis(millis))
}

fn parse_positive_u64(field: &'static str, raw: &str) -> ConfigResult<u64> {
    let trimmed = raw.trim();
    let value = trimmed
        .parse::<u64>()
        .map_err(|_| ConfigError::invalid_field(field, "not_an_integer", trimmed))?;
    if value == 0 {
        return Err(ConfigError::invalid_field(field, "must_be_positive", trimmed));
    }
    Ok(value)
}

/// Borrow an optional object section from a configuration document.
#[allow(clippy::redundant_pub_crate)]
pub(crate) fn section<'a>(
    document: &'a Value,
    name: &'static str,
) -> ConfigResult<Option<&'a Map<String, Value>>> {
    let root = document.as_object().ok_or(ConfigError::InvalidDocument {
        section: "root",
        reason: "must_be_object",
    })?;
    match root.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(ConfigError::InvalidDocument {
            section: name,
            reason: "must_be_object",
        }),
    }
}

/// Read an optional positive integer from a section; `null` counts as absent.
#[allow(clippy::redundant_pub_crate)]
pub(crate) fn positive_u64_field(
    map: &Map<String, Value>,
    key: &str,
    field: &'static str,
) -> ConfigResult<Option<u64>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => {
            let number = value.as_u64().ok_or_else(|| {
                ConfigError::invalid_field(field, "not_an_integer", value.to_string())
            })?;
            if number == 0 {
                return Err(ConfigError::invalid_field(field, "must_be_positive", "0"));
            }
            Ok(Some(number))
        }
    }
}

/// Read an optional millisecond duration from a section, bounded like env values.
#[allow(clippy::redundant_pub_crate)]
pub(crate) fn millis_field(
    map: &Map<String, Value>,
    key: &str,
    field: &'static str,
) -> ConfigResult<Option<Duration>> {
    positive_u64_field(map, key, field)?
        .map(|millis| bounded_millis(field, millis))
        .transpose()
}
