//! Action dispatch.
//!
//! An [`ActionRunner`] is a table of handlers keyed by action kind and, for
//! input-capable kinds, by input source. A missing entry is reported as
//! `RunError::NotImplemented` naming the kind, the source and the runner.

pub mod context;
pub mod input;
pub mod script;

pub use context::{ActionTag, RunContext, RunnerSettings};

use crate::config::RunnerBackend;
use crate::diagnostics::DiagnosticsSink;
use crate::error::RunError;
use crate::surface::{Surface, SurfaceError};
use async_trait::async_trait;
use cadence_common::{ActionKind, InputSource, Pointer};
use cadence_parser::{ActionBlock, ActionSpec};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{Instrument, debug, info_span};

/// Executes one kind of action (for one input source).
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn run(
        &self,
        ctx: &mut RunContext,
        surface: &mut dyn Surface,
        action: &ActionSpec,
    ) -> Result<(), RunError>;
}

type HandlerKey = (ActionKind, Option<InputSource>);

pub struct ActionRunner {
    name: String,
    handlers: HashMap<HandlerKey, Arc<dyn ActionHandler>>,
}

impl ActionRunner {
    /// A runner with no handlers; every action is reported as not implemented.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: HashMap::new(),
        }
    }

    /// Drives everything through page scripts. Pointer and keyboard sources
    /// and swipes are not available.
    pub fn basic() -> Self {
        let mut runner = Self::empty("BasicActionRunner");
        runner.register_script_handlers();
        runner
    }

    /// Script handlers plus synthesized touch, mouse and keyboard input.
    pub fn input() -> Self {
        let mut runner = Self::empty("InputActionRunner");
        runner.register_script_handlers();
        for pointer in [Pointer::Touch, Pointer::Mouse] {
            let source = match pointer {
                Pointer::Touch => InputSource::Touch,
                Pointer::Mouse => InputSource::Mouse,
            };
            runner.register(
                ActionKind::Click,
                Some(source),
                input::PointerClickHandler { pointer },
            );
            runner.register(
                ActionKind::Scroll,
                Some(source),
                input::PointerScrollHandler { pointer },
            );
        }
        runner.register(ActionKind::Swipe, None, input::SwipeHandler);
        runner.register(
            ActionKind::TextInput,
            Some(InputSource::Keyboard),
            script::TextInputHandler {
                typing: script::Typing::Keyboard,
            },
        );
        runner
    }

    pub fn for_backend(backend: RunnerBackend) -> Self {
        match backend {
            RunnerBackend::Basic => Self::basic(),
            RunnerBackend::Input => Self::input(),
        }
    }

    fn register_script_handlers(&mut self) {
        self.register(ActionKind::Get, None, script::GetHandler);
        self.register(ActionKind::Wait, None, script::WaitHandler);
        self.register(ActionKind::RunScript, None, script::RunScriptHandler);
        self.register(ActionKind::InjectDocumentScript, None, script::InjectScriptHandler);
        self.register(ActionKind::Screenshot, None, script::ScreenshotHandler);
        self.register(ActionKind::WaitForElement, None, script::WaitForElementHandler);
        self.register(ActionKind::Click, Some(InputSource::Script), script::ScriptClickHandler);
        self.register(ActionKind::Scroll, Some(InputSource::Script), script::ScriptScrollHandler);
        self.register(
            ActionKind::TextInput,
            Some(InputSource::Script),
            script::TextInputHandler {
                typing: script::Typing::Script,
            },
        );
    }

    /// Install or replace the handler for `kind` (and `source`).
    pub fn register(
        &mut self,
        kind: ActionKind,
        source: Option<InputSource>,
        handler: impl ActionHandler + 'static,
    ) {
        self.handlers.insert((kind, source), Arc::new(handler));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn supports(&self, kind: ActionKind, source: Option<InputSource>) -> bool {
        self.handlers.contains_key(&(kind, source))
    }

    /// A fresh per-run context bound to this runner.
    pub fn context(&self, settings: RunnerSettings, sink: Arc<dyn DiagnosticsSink>) -> RunContext {
        RunContext::new(self.name.clone(), settings, sink)
    }

    pub async fn run_action(
        &self,
        ctx: &mut RunContext,
        surface: &mut dyn Surface,
        action: &ActionSpec,
    ) -> Result<(), RunError> {
        let kind = action.kind();
        let source = action.input_source();
        let Some(handler) = self.handlers.get(&(kind, source)) else {
            let context = match source {
                Some(source) => format!("Source: '{}' not implemented", source),
                None => "not implemented".to_string(),
            };
            return Err(ctx.not_implemented(action, context));
        };

        let result = match action.timeout().as_duration() {
            Some(limit) if enforces_timeout(kind) => {
                match tokio::time::timeout(limit, handler.run(ctx, surface, action)).await {
                    Ok(result) => result,
                    Err(_) => Err(RunError::Timeout {
                        kind,
                        timeout: action.timeout(),
                    }),
                }
            }
            _ => handler.run(ctx, surface, action).await,
        };

        // A surface lacking a primitive is a configuration problem of the run,
        // reported like a missing handler.
        result.map_err(|err| match err {
            RunError::Surface(SurfaceError::NotSupported(capability)) => ctx.not_implemented(
                action,
                format!("Surface '{}' does not support {}", surface.name(), capability),
            ),
            other => other,
        })
    }

    /// Run every action of `block` in order, tagging each with its 1-based
    /// position for diagnostics.
    pub async fn run_block(
        &self,
        ctx: &mut RunContext,
        surface: &mut dyn Surface,
        block: &ActionBlock,
    ) -> Result<(), RunError> {
        let span = info_span!("block", index = block.index(), label = block.label());
        async {
            for (position, action) in block.actions().iter().enumerate() {
                let tag = ActionTag {
                    block: block.index(),
                    action: position + 1,
                };
                ctx.set_tag(tag);
                debug!("action {}: {}", tag.action, action.kind());
                self.run_action(ctx, surface, action).await?;
            }
            Ok(())
        }
        .instrument(span)
        .await
    }

    pub async fn run_blocks(
        &self,
        ctx: &mut RunContext,
        surface: &mut dyn Surface,
        blocks: &[ActionBlock],
    ) -> Result<(), RunError> {
        for block in blocks {
            self.run_block(ctx, surface, block).await?;
        }
        Ok(())
    }
}

/// Kinds without their own duration or soft timeout run under the action's
/// timeout as a whole.
fn enforces_timeout(kind: ActionKind) -> bool {
    matches!(
        kind,
        ActionKind::RunScript
            | ActionKind::InjectDocumentScript
            | ActionKind::Click
            | ActionKind::Screenshot
    )
}
