use crate::diagnostics::DiagnosticsSink;
use crate::error::RunError;
use crate::selector;
use crate::surface::Surface;
use crate::viewport::ViewportInfo;
use cadence_common::DisplayRectangle;
use cadence_parser::ActionSpec;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Timing knobs of the runner, derived from the `runner` settings section.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerSettings {
    pub scroll_step_interval: Duration,
    pub ready_state_poll: Duration,
    pub keystroke_overrun_warning: Duration,
    pub wait_for_element_grace: Duration,
    pub about_blank_duration: Duration,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        crate::config::RunnerConfig::default().settings()
    }
}

/// Position of the running action: block index and 1-based action number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionTag {
    pub block: usize,
    pub action: usize,
}

impl ActionTag {
    pub fn screenshot_name(&self, suffix: &str) -> String {
        format!("block_{}_action_{}_{}.png", self.block, self.action, suffix)
    }
}

/// State owned by one playback of one page. Nothing here is shared between
/// runs, so several runs may proceed concurrently on separate surfaces.
pub struct RunContext {
    runner: String,
    settings: RunnerSettings,
    sink: Arc<dyn DiagnosticsSink>,
    tag: Option<ActionTag>,
    window_bounds: Option<DisplayRectangle>,
}

impl RunContext {
    pub fn new(
        runner: impl Into<String>,
        settings: RunnerSettings,
        sink: Arc<dyn DiagnosticsSink>,
    ) -> Self {
        Self {
            runner: runner.into(),
            settings,
            sink,
            tag: None,
            window_bounds: None,
        }
    }

    pub fn runner_name(&self) -> &str {
        &self.runner
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    pub fn sink(&self) -> &Arc<dyn DiagnosticsSink> {
        &self.sink
    }

    /// The most recently started action.
    pub fn tag(&self) -> Option<ActionTag> {
        self.tag
    }

    pub(crate) fn set_tag(&mut self, tag: ActionTag) {
        self.tag = Some(tag);
    }

    /// Log a soft failure and hand it to the diagnostics sink.
    pub fn warn(&self, message: &str) {
        warn!("{}", message);
        self.sink.warning(message);
    }

    pub fn not_implemented(&self, action: &ActionSpec, context: impl Into<String>) -> RunError {
        RunError::not_implemented(action.kind(), action.input_source(), &self.runner, context)
    }

    /// Window bounds are looked up once per run; the window is assumed not to
    /// move or resize while a script plays.
    pub async fn window_bounds(
        &mut self,
        surface: &mut dyn Surface,
    ) -> Result<DisplayRectangle, RunError> {
        if let Some(bounds) = self.window_bounds {
            return Ok(bounds);
        }
        let bounds = surface.window_bounds().await?;
        self.window_bounds = Some(bounds);
        Ok(bounds)
    }

    /// Viewport geometry, optionally with the rect of the element matching
    /// `selector` (scrolled into view first when asked).
    pub async fn viewport(
        &mut self,
        surface: &mut dyn Surface,
        selector: Option<&str>,
        scroll_into_view: bool,
    ) -> Result<ViewportInfo, RunError> {
        let query = selector::viewport_script(selector);
        let target = match selector {
            Some(_) => json!(query.selector),
            None => Value::Null,
        };
        let reply = surface
            .evaluate(&query.script, vec![target, json!(scroll_into_view)])
            .await?;
        let bounds = self.window_bounds(surface).await?;
        ViewportInfo::from_reply(bounds, &reply)
    }

    /// Capture the surface and store it as `block_<i>_action_<j>_<suffix>.png`.
    pub async fn screenshot(
        &self,
        surface: &mut dyn Surface,
        suffix: &str,
    ) -> Result<PathBuf, RunError> {
        let png = surface.capture().await?;
        let file_name = match self.tag {
            Some(tag) => tag.screenshot_name(suffix),
            None => format!("{}.png", suffix),
        };
        Ok(self.sink.store_screenshot(&file_name, png).await?)
    }
}
