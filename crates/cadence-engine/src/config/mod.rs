pub mod loader;
pub mod schema;

pub use loader::{CONFIG_ENV, ConfigLoadError, ConfigLoader};
pub use schema::{BrowserConfig, CadenceConfig, OutputConfig, RunnerBackend, RunnerConfig};
