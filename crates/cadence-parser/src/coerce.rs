//! Type coercions from raw configuration values.
//!
//! Every function reports failures without a path; callers attach the field
//! location through [`ConfigResultExt`](crate::error::ConfigResultExt).

use crate::error::ConfigError;
use crate::urls::parse_fuzzy_url;
use cadence_common::{duration_from_secs, parse_duration, Timeout};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a dict",
    }
}

pub fn string(value: &Value) -> Result<String, ConfigError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(ConfigError::new(format!(
            "Expected a string, got {}",
            describe(other)
        ))),
    }
}

pub fn non_empty_string(value: &Value) -> Result<String, ConfigError> {
    let s = string(value)?;
    if s.is_empty() {
        return Err(ConfigError::new("Expected a non-empty string"));
    }
    Ok(s)
}

pub fn boolean(value: &Value) -> Result<bool, ConfigError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" => Ok(true),
            "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::new(format!("Expected a bool, got '{}'", s))),
        },
        other => Err(ConfigError::new(format!(
            "Expected a bool, got {}",
            describe(other)
        ))),
    }
}

pub fn int(value: &Value) -> Result<i64, ConfigError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| ConfigError::new(format!("Expected an integer, got {}", n))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| ConfigError::new(format!("Expected an integer, got '{}'", s))),
        other => Err(ConfigError::new(format!(
            "Expected an integer, got {}",
            describe(other)
        ))),
    }
}

pub fn non_negative_int(value: &Value) -> Result<u32, ConfigError> {
    let n = int(value)?;
    u32::try_from(n)
        .map_err(|_| ConfigError::new(format!("Expected a non-negative integer, got {}", n)))
}

pub fn positive_int(value: &Value) -> Result<u32, ConfigError> {
    let n = non_negative_int(value)?;
    if n == 0 {
        return Err(ConfigError::new("Expected a positive integer, got 0"));
    }
    Ok(n)
}

pub fn float(value: &Value) -> Result<f64, ConfigError> {
    let f = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    match f {
        Some(f) if f.is_finite() => Ok(f),
        _ => Err(ConfigError::new(format!(
            "Expected a number, got {}",
            value
        ))),
    }
}

/// Numbers are seconds, strings use the duration syntax.
pub fn duration(value: &Value) -> Result<Duration, ConfigError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ConfigError::new(format!("Invalid duration {}", n)))
            .and_then(|secs| duration_from_secs(secs).map_err(|e| ConfigError::new(e.to_string()))),
        Value::String(s) => parse_duration(s).map_err(|e| ConfigError::new(e.to_string())),
        other => Err(ConfigError::new(format!(
            "Expected a duration, got {}",
            describe(other)
        ))),
    }
}

pub fn non_zero_duration(value: &Value) -> Result<Duration, ConfigError> {
    let d = duration(value)?;
    if d.is_zero() {
        return Err(ConfigError::new("Expected a non-zero duration"));
    }
    Ok(d)
}

pub fn timeout(value: &Value) -> Result<Timeout, ConfigError> {
    match value {
        Value::Null => Ok(Timeout::Unlimited),
        Value::String(s) => Timeout::parse(s).map_err(|e| ConfigError::new(e.to_string())),
        other => duration(other).map(Timeout::Limited),
    }
}

pub fn fuzzy_url(value: &Value) -> Result<String, ConfigError> {
    let raw = non_empty_string(value)?;
    parse_fuzzy_url(&raw)
}

/// Parses any vocabulary enum from its string spelling.
pub fn variant<T>(value: &Value) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let s = non_empty_string(value)?;
    s.parse::<T>().map_err(|e| ConfigError::new(e.to_string()))
}

/// String-to-string map with non-empty keys.
pub fn replacements(value: &Value) -> Result<BTreeMap<String, String>, ConfigError> {
    let Value::Object(map) = value else {
        return Err(ConfigError::new(format!(
            "Expected a dict of replacements, got {}",
            describe(value)
        )));
    };
    let mut out = BTreeMap::new();
    for (key, replacement) in map {
        if key.is_empty() {
            return Err(ConfigError::new("Replacement keys must be non-empty"));
        }
        let replacement = match replacement {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => {
                return Err(ConfigError::new(format!(
                    "Replacement for '{}' must be a string, got {}",
                    key,
                    describe(other)
                ))
                .prepend_key(key.clone()));
            }
        };
        out.insert(key.clone(), replacement);
    }
    Ok(out)
}
