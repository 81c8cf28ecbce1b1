use crate::error::{ConfigError, ConfigResultExt};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Field binder over one configuration dict.
///
/// Fields are pulled by canonical name plus aliases. Supplying the same field
/// under two spellings is rejected, and [`Fields::finish`] rejects every key
/// nobody asked for. `null` values count as absent.
pub struct Fields<'a> {
    map: &'a Map<String, Value>,
    consumed: BTreeSet<&'a str>,
}

impl<'a> Fields<'a> {
    pub fn new(value: &'a Value, what: &str) -> Result<Self, ConfigError> {
        match value {
            Value::Object(map) => Ok(Self::from_map(map)),
            _ => Err(ConfigError::new(format!("Expected a dict for {}", what))),
        }
    }

    pub fn from_map(map: &'a Map<String, Value>) -> Self {
        Self {
            map,
            consumed: BTreeSet::new(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Finds the value of `name` under any of its spellings.
    pub fn lookup(
        &mut self,
        name: &'static str,
        aliases: &[&'static str],
    ) -> Result<Option<(&'a str, &'a Value)>, ConfigError> {
        self.find(name, aliases, false)
    }

    fn find(
        &mut self,
        name: &'static str,
        aliases: &[&'static str],
        keep_null: bool,
    ) -> Result<Option<(&'a str, &'a Value)>, ConfigError> {
        let map = self.map;
        let mut found: Option<(&'a str, &'a Value)> = None;
        for spelling in std::iter::once(&name).chain(aliases.iter()) {
            let Some((key, value)) = map.get_key_value(*spelling) else {
                continue;
            };
            self.consumed.insert(key.as_str());
            if value.is_null() && !keep_null {
                continue;
            }
            if let Some((previous, _)) = found {
                return Err(ConfigError::new(format!(
                    "Field '{}' given twice, as '{}' and '{}'",
                    name, previous, key
                )));
            }
            found = Some((key.as_str(), value));
        }
        Ok(found)
    }

    pub fn optional<T, F>(
        &mut self,
        name: &'static str,
        aliases: &[&'static str],
        coerce: F,
    ) -> Result<Option<T>, ConfigError>
    where
        F: FnOnce(&Value) -> Result<T, ConfigError>,
    {
        match self.lookup(name, aliases)? {
            Some((key, value)) => coerce(value).at_key(key).map(Some),
            None => Ok(None),
        }
    }

    pub fn required<T, F>(
        &mut self,
        name: &'static str,
        aliases: &[&'static str],
        coerce: F,
    ) -> Result<T, ConfigError>
    where
        F: FnOnce(&Value) -> Result<T, ConfigError>,
    {
        self.optional(name, aliases, coerce)?
            .ok_or_else(|| ConfigError::new("Missing required field").prepend_key(name))
    }

    pub fn with_default<T, F>(
        &mut self,
        name: &'static str,
        aliases: &[&'static str],
        coerce: F,
        default: T,
    ) -> Result<T, ConfigError>
    where
        F: FnOnce(&Value) -> Result<T, ConfigError>,
    {
        Ok(self.optional(name, aliases, coerce)?.unwrap_or(default))
    }

    /// Like [`Fields::with_default`], but an explicit `null` reaches `coerce`
    /// instead of selecting the default.
    pub fn nullable_with_default<T, F>(
        &mut self,
        name: &'static str,
        aliases: &[&'static str],
        coerce: F,
        default: T,
    ) -> Result<T, ConfigError>
    where
        F: FnOnce(&Value) -> Result<T, ConfigError>,
    {
        match self.find(name, aliases, true)? {
            Some((key, value)) => coerce(value).at_key(key),
            None => Ok(default),
        }
    }

    /// Marks a key as handled without coercing it.
    pub fn ignore(&mut self, name: &'static str) {
        let map = self.map;
        if let Some((key, _)) = map.get_key_value(name) {
            self.consumed.insert(key.as_str());
        }
    }

    pub fn finish(self) -> Result<(), ConfigError> {
        let unknown: Vec<&str> = self
            .map
            .keys()
            .map(String::as_str)
            .filter(|key| !self.consumed.contains(key))
            .collect();
        match unknown.first() {
            None => Ok(()),
            Some(first) => Err(ConfigError::new(format!(
                "Unknown field{}: {}",
                if unknown.len() > 1 { "s" } else { "" },
                unknown.join(", ")
            ))
            .prepend_key(*first)),
        }
    }
}
