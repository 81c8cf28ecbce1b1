use cadence_common::{ActionKind, InputSource, SurfaceError, Timeout};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("{kind}-action not implemented in {runner}. Context: {context}")]
    NotImplemented {
        kind: ActionKind,
        input: Option<InputSource>,
        runner: String,
        context: String,
    },

    #[error("Element not found: '{selector}'")]
    ElementNotFound { selector: String },

    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),

    #[error("{kind}-action timed out after {timeout}")]
    Timeout { kind: ActionKind, timeout: Timeout },

    #[error("Unexpected value from surface: {0}")]
    UnexpectedValue(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunError {
    pub fn not_implemented(
        kind: ActionKind,
        input: Option<InputSource>,
        runner: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        RunError::NotImplemented {
            kind,
            input,
            runner: runner.into(),
            context: context.into(),
        }
    }

    /// True for failures caused by a missing capability rather than by the page.
    pub fn is_not_implemented(&self) -> bool {
        match self {
            RunError::NotImplemented { .. } => true,
            RunError::Surface(err) => err.is_not_supported(),
            _ => false,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            RunError::NotImplemented { .. } => "NOT_IMPLEMENTED",
            RunError::ElementNotFound { .. } => "ELEMENT_NOT_FOUND",
            RunError::Surface(err) => err.code(),
            RunError::Timeout { .. } => "TIMEOUT",
            RunError::UnexpectedValue(_) => "UNEXPECTED_VALUE",
            RunError::Io(_) => "IO_ERROR",
        }
    }
}
