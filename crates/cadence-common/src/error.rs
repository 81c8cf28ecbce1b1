/// Failures reported by an interaction surface (a live browser tab).
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SurfaceError {
    // ============================================================
    // Navigation Errors
    // ============================================================
    #[error("Navigation failed: {0}")]
    Navigation(String),

    // ============================================================
    // Execution Errors
    // ============================================================
    #[error("Script execution error: {0}")]
    Script(String),

    #[error("Input synthesis failed: {0}")]
    Input(String),

    #[error("Timeout: {operation}")]
    Timeout { operation: String },

    // ============================================================
    // System Errors
    // ============================================================
    #[error("Surface not ready")]
    NotReady,

    #[error("Connection lost")]
    ConnectionLost,

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Other: {0}")]
    Other(String),
}

impl From<std::io::Error> for SurfaceError {
    fn from(err: std::io::Error) -> Self {
        SurfaceError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SurfaceError {
    fn from(err: serde_json::Error) -> Self {
        SurfaceError::Serialization(err.to_string())
    }
}

impl SurfaceError {
    /// Stable error code, suitable for logs and reports.
    pub fn code(&self) -> &'static str {
        match self {
            SurfaceError::Navigation(_) => "NAVIGATION_ERROR",
            SurfaceError::Script(_) => "SCRIPT_ERROR",
            SurfaceError::Input(_) => "INPUT_ERROR",
            SurfaceError::Timeout { .. } => "TIMEOUT",
            SurfaceError::NotReady => "NOT_READY",
            SurfaceError::ConnectionLost => "CONNECTION_LOST",
            SurfaceError::Io(_) => "IO_ERROR",
            SurfaceError::Serialization(_) => "SERIALIZATION_ERROR",
            SurfaceError::NotSupported(_) => "NOT_SUPPORTED",
            SurfaceError::Other(_) => "INTERNAL_ERROR",
        }
    }

    pub fn recovery_hint(&self) -> &'static str {
        match self {
            SurfaceError::Navigation(_) => "Check URL and network connectivity",
            SurfaceError::Script(_) => "Check the script for syntax or runtime errors",
            SurfaceError::Timeout { .. } => "Increase the action timeout",
            SurfaceError::NotReady | SurfaceError::ConnectionLost => {
                "Relaunch the browser before running the script"
            }
            SurfaceError::NotSupported(_) => "Use a runner or input source this surface supports",
            _ => "Check surface logs",
        }
    }

    pub fn is_not_supported(&self) -> bool {
        matches!(self, SurfaceError::NotSupported(_))
    }
}
