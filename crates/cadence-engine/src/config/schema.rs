use crate::runner::RunnerSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CadenceConfig {
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

/// Which handler set plays back scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunnerBackend {
    /// Everything through page scripts.
    #[default]
    Basic,
    /// Adds synthesized touch, mouse and keyboard input.
    Input,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default)]
    pub backend: RunnerBackend,
    #[serde(default = "default_scroll_step_interval_ms")]
    pub scroll_step_interval_ms: u64,
    #[serde(default = "default_ready_state_poll_ms")]
    pub ready_state_poll_ms: u64,
    #[serde(default = "default_keystroke_overrun_warning_ms")]
    pub keystroke_overrun_warning_ms: u64,
    #[serde(default = "default_wait_for_element_grace_ms")]
    pub wait_for_element_grace_ms: u64,
    #[serde(default)]
    pub about_blank_duration_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            backend: RunnerBackend::default(),
            scroll_step_interval_ms: default_scroll_step_interval_ms(),
            ready_state_poll_ms: default_ready_state_poll_ms(),
            keystroke_overrun_warning_ms: default_keystroke_overrun_warning_ms(),
            wait_for_element_grace_ms: default_wait_for_element_grace_ms(),
            about_blank_duration_ms: 0,
        }
    }
}

impl RunnerConfig {
    pub fn settings(&self) -> RunnerSettings {
        RunnerSettings {
            scroll_step_interval: Duration::from_millis(self.scroll_step_interval_ms),
            ready_state_poll: Duration::from_millis(self.ready_state_poll_ms),
            keystroke_overrun_warning: Duration::from_millis(self.keystroke_overrun_warning_ms),
            wait_for_element_grace: Duration::from_millis(self.wait_for_element_grace_ms),
            about_blank_duration: Duration::from_millis(self.about_blank_duration_ms),
        }
    }
}

fn default_scroll_step_interval_ms() -> u64 {
    200
}

fn default_ready_state_poll_ms() -> u64 {
    200
}

fn default_keystroke_overrun_warning_ms() -> u64 {
    10
}

fn default_wait_for_element_grace_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./results")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub chrome_bin: Option<PathBuf>,
}
