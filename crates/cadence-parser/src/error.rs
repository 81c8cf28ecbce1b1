use std::fmt;
use thiserror::Error;

/// One step in the path from the configuration root to a failing value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Construction-time rejection of an action, block or page.
///
/// `field` names the offending field when the failure is attributable to one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub field: Option<&'static str>,
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }

    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field: Some(field),
            message: message.into(),
        }
    }
}

/// Malformed or contradictory script configuration.
///
/// Carries the path of the innermost failing value plus breadcrumb notes
/// added by the enclosing parse steps, outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    path: Vec<PathSegment>,
    message: String,
    notes: Vec<String>,
}

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            path: Vec::new(),
            message: message.into(),
            notes: Vec::new(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.path
    }

    /// Dotted path such as `blocks[1].actions[2].duration`.
    pub fn path(&self) -> String {
        let mut out = String::new();
        for segment in &self.path {
            match segment {
                PathSegment::Key(key) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(key);
                }
                PathSegment::Index(index) => {
                    out.push_str(&format!("[{}]", index));
                }
            }
        }
        out
    }

    pub fn prepend_key(mut self, key: impl Into<String>) -> Self {
        self.path.insert(0, PathSegment::Key(key.into()));
        self
    }

    pub fn prepend_index(mut self, index: usize) -> Self {
        self.path.insert(0, PathSegment::Index(index));
        self
    }

    pub fn prepend_note(mut self, note: impl Into<String>) -> Self {
        self.notes.insert(0, note.into());
        self
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path();
        if path.is_empty() {
            write!(f, "{}", self.message)?;
        } else {
            write!(f, "{}: {}", path, self.message)?;
        }
        for note in &self.notes {
            write!(f, "\n  while {}", note)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigError {}

impl From<ValidationError> for ConfigError {
    fn from(err: ValidationError) -> Self {
        let config = ConfigError::new(err.message);
        match err.field {
            Some(field) => config.prepend_key(field),
            None => config,
        }
    }
}

/// Annotates errors of nested parse calls with the location they occurred at.
pub trait ConfigResultExt<T> {
    fn at_key(self, key: &str) -> Result<T, ConfigError>;
    fn at_index(self, index: usize) -> Result<T, ConfigError>;
    fn with_note<F: FnOnce() -> String>(self, note: F) -> Result<T, ConfigError>;
}

impl<T, E: Into<ConfigError>> ConfigResultExt<T> for Result<T, E> {
    fn at_key(self, key: &str) -> Result<T, ConfigError> {
        self.map_err(|err| err.into().prepend_key(key))
    }

    fn at_index(self, index: usize) -> Result<T, ConfigError> {
        self.map_err(|err| err.into().prepend_index(index))
    }

    fn with_note<F: FnOnce() -> String>(self, note: F) -> Result<T, ConfigError> {
        self.map_err(|err| err.into().prepend_note(note()))
    }
}

/// Failure to read a configuration document from disk.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
