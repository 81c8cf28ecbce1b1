pub mod config;
pub mod diagnostics;
pub mod error;
pub mod pacing;
pub mod runner;
pub mod selector;
pub mod story;
pub mod surface;
pub mod viewport;

pub use config::{CadenceConfig, ConfigLoadError, ConfigLoader, RunnerBackend};
pub use diagnostics::{DiagnosticsSink, OutputDir, RecordingSink};
pub use error::RunError;
pub use pacing::{Pacer, StepSchedule};
pub use runner::{ActionHandler, ActionRunner, ActionTag, RunContext, RunnerSettings};
pub use story::{PageReport, PageRun, RunState, StoryRunner};
pub use surface::{Surface, SurfaceError};
pub use viewport::ViewportInfo;
