use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationError {
    #[error("Empty duration")]
    Empty,

    #[error("Invalid duration '{0}'")]
    Invalid(String),

    #[error("Duration must not be negative, got '{0}'")]
    Negative(String),

    #[error("Duration '{0}' is out of range")]
    OutOfRange(String),
}

/// Parses a human duration such as `"500ms"`, `"1.5s"`, `"2m"` or `"1h"`.
///
/// A bare number is read as seconds.
pub fn parse_duration(value: &str) -> Result<Duration, DurationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DurationError::Empty);
    }
    let (number, unit_secs) = split_unit(value);
    let amount: f64 = number
        .trim()
        .parse()
        .map_err(|_| DurationError::Invalid(value.to_string()))?;
    from_secs(amount * unit_secs, value)
}

/// Converts a plain number of seconds, as found in JSON or YAML.
pub fn duration_from_secs(secs: f64) -> Result<Duration, DurationError> {
    from_secs(secs, &secs.to_string())
}

fn from_secs(secs: f64, original: &str) -> Result<Duration, DurationError> {
    if secs.is_nan() {
        return Err(DurationError::Invalid(original.to_string()));
    }
    if secs < 0.0 {
        return Err(DurationError::Negative(original.to_string()));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| DurationError::OutOfRange(original.to_string()))
}

fn split_unit(value: &str) -> (&str, f64) {
    // Longest suffixes first so that "ms" is not read as "m".
    const UNITS: [(&str, f64); 12] = [
        ("milliseconds", 0.001),
        ("seconds", 1.0),
        ("minutes", 60.0),
        ("hours", 3600.0),
        ("secs", 1.0),
        ("mins", 60.0),
        ("sec", 1.0),
        ("min", 60.0),
        ("ms", 0.001),
        ("s", 1.0),
        ("m", 60.0),
        ("h", 3600.0),
    ];
    for (suffix, factor) in UNITS {
        if let Some(number) = value.strip_suffix(suffix) {
            return (number, factor);
        }
    }
    (value, 1.0)
}

/// Upper bound on how long an action may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeout {
    Limited(Duration),
    Unlimited,
}

impl Timeout {
    /// Default per-action timeout.
    pub const DEFAULT: Timeout = Timeout::Limited(Duration::from_secs(20));

    /// Like [`parse_duration`], but also accepts `inf`, `infinite` and `none`.
    pub fn parse(value: &str) -> Result<Timeout, DurationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "inf" | "infinite" | "infinity" | "none" | "unlimited" => Ok(Timeout::Unlimited),
            _ => parse_duration(value).map(Timeout::Limited),
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Timeout::Limited(duration) => Some(*duration),
            Timeout::Unlimited => None,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        matches!(self, Timeout::Unlimited)
    }

    /// Extends a limited timeout by `extra`; unlimited stays unlimited.
    pub fn saturating_add(&self, extra: Duration) -> Timeout {
        match self {
            Timeout::Limited(duration) => Timeout::Limited(duration.saturating_add(extra)),
            Timeout::Unlimited => Timeout::Unlimited,
        }
    }
}

impl Default for Timeout {
    fn default() -> Self {
        Timeout::DEFAULT
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timeout::Limited(duration) => write!(f, "{:?}", duration),
            Timeout::Unlimited => f.write_str("unlimited"),
        }
    }
}

impl Serialize for Timeout {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Timeout::Limited(duration) => serializer.serialize_f64(duration.as_secs_f64()),
            Timeout::Unlimited => serializer.serialize_none(),
        }
    }
}
