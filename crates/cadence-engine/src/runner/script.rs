//! Handlers that drive the page through evaluated scripts and the surface's
//! navigation, wait and capture primitives.

use super::{ActionHandler, RunContext};
use crate::error::RunError;
use crate::pacing::Pacer;
use crate::selector;
use crate::surface::Surface;
use async_trait::async_trait;
use cadence_parser::{ActionBody, ActionSpec, ClickAction, ScrollAction, TextInputAction};
use serde_json::{Value, json};
use tracing::{debug, info};

/// Handlers are looked up by kind, so a body of another kind means the
/// registry is wired wrong.
pub(crate) fn mismatched(action: &ActionSpec, expected: &str) -> RunError {
    RunError::UnexpectedValue(format!(
        "{} handler received a {} action",
        expected,
        action.kind()
    ))
}

pub struct GetHandler;

#[async_trait]
impl ActionHandler for GetHandler {
    async fn run(
        &self,
        ctx: &mut RunContext,
        surface: &mut dyn Surface,
        action: &ActionSpec,
    ) -> Result<(), RunError> {
        let ActionBody::Get(get) = action.body() else {
            return Err(mismatched(action, "get"));
        };
        let pacer = Pacer::start(get.duration());
        surface.navigate(get.url(), get.target()).await?;

        let state = get.ready_state();
        if state.is_blocking() {
            let predicate = selector::ready_state_predicate(state.as_str());
            let reached = surface
                .wait_until(&predicate, ctx.settings().ready_state_poll, action.timeout())
                .await?;
            if !reached {
                ctx.warn(&format!(
                    "Timed out after {} waiting for readyState '{}' of {}",
                    action.timeout(),
                    state,
                    get.url()
                ));
            }
            return Ok(());
        }

        let remaining = pacer.remaining();
        if !remaining.is_zero() {
            surface.wait(remaining).await?;
        } else if !get.duration().is_zero() {
            let message = format!(
                "get {} took longer ({:?}) than expected action duration ({:?})",
                get.url(),
                pacer.elapsed(),
                get.duration()
            );
            info!("{}", message);
            ctx.sink().warning(&message);
        }
        Ok(())
    }
}

pub struct WaitHandler;

#[async_trait]
impl ActionHandler for WaitHandler {
    async fn run(
        &self,
        _ctx: &mut RunContext,
        surface: &mut dyn Surface,
        action: &ActionSpec,
    ) -> Result<(), RunError> {
        let ActionBody::Wait(wait) = action.body() else {
            return Err(mismatched(action, "wait"));
        };
        surface.wait(wait.duration()).await?;
        Ok(())
    }
}

pub struct RunScriptHandler;

#[async_trait]
impl ActionHandler for RunScriptHandler {
    async fn run(
        &self,
        _ctx: &mut RunContext,
        surface: &mut dyn Surface,
        action: &ActionSpec,
    ) -> Result<(), RunError> {
        let ActionBody::RunScript(script) = action.body() else {
            return Err(mismatched(action, "js"));
        };
        let result = surface.evaluate(script.script(), Vec::new()).await?;
        debug!("script returned {}", result);
        Ok(())
    }
}

pub struct InjectScriptHandler;

#[async_trait]
impl ActionHandler for InjectScriptHandler {
    async fn run(
        &self,
        _ctx: &mut RunContext,
        surface: &mut dyn Surface,
        action: &ActionSpec,
    ) -> Result<(), RunError> {
        let ActionBody::InjectDocumentScript(script) = action.body() else {
            return Err(mismatched(action, "inject_new_document_script"));
        };
        surface.inject_new_document_script(script.script()).await?;
        Ok(())
    }
}

pub struct ScreenshotHandler;

#[async_trait]
impl ActionHandler for ScreenshotHandler {
    async fn run(
        &self,
        ctx: &mut RunContext,
        surface: &mut dyn Surface,
        _action: &ActionSpec,
    ) -> Result<(), RunError> {
        let path = ctx.screenshot(surface, "screenshot").await?;
        info!("Saved screenshot {}", path.display());
        Ok(())
    }
}

/// Never fails on a missing element: the page-side observer and a host-side
/// guard (timeout plus grace) both resolve to "not found" with a warning.
pub struct WaitForElementHandler;

#[async_trait]
impl ActionHandler for WaitForElementHandler {
    async fn run(
        &self,
        ctx: &mut RunContext,
        surface: &mut dyn Surface,
        action: &ActionSpec,
    ) -> Result<(), RunError> {
        let ActionBody::WaitForElement(wait) = action.body() else {
            return Err(mismatched(action, "wait_for_element"));
        };
        let query = selector::wait_for_element_script(wait.selector());
        let timeout = action.timeout().as_duration();
        let timeout_ms = match timeout {
            Some(limit) => json!(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX)),
            None => Value::Null,
        };
        let evaluation = surface.evaluate(&query.script, vec![json!(query.selector), timeout_ms]);

        let found = match timeout {
            Some(limit) => {
                let guard = limit.saturating_add(ctx.settings().wait_for_element_grace);
                match tokio::time::timeout(guard, evaluation).await {
                    Ok(reply) => reply? == Value::Bool(true),
                    Err(_) => false,
                }
            }
            None => evaluation.await? == Value::Bool(true),
        };
        if !found {
            ctx.warn(&format!("Timed out waiting for '{}'", wait.selector()));
        }
        Ok(())
    }
}

pub struct ScriptClickHandler;

#[async_trait]
impl ActionHandler for ScriptClickHandler {
    async fn run(
        &self,
        ctx: &mut RunContext,
        surface: &mut dyn Surface,
        action: &ActionSpec,
    ) -> Result<(), RunError> {
        let ActionBody::Click(click) = action.body() else {
            return Err(mismatched(action, "click"));
        };
        reject_click_duration(ctx, action, click)?;
        let selector = click
            .selector()
            .ok_or_else(|| RunError::UnexpectedValue("Missing selector".into()))?;

        let query = selector::click_script(selector, click.scroll_into_view());
        let clicked = surface
            .evaluate(&query.script, vec![json!(query.selector)])
            .await?
            == Value::Bool(true);
        if !clicked {
            if click.required() {
                return Err(RunError::ElementNotFound {
                    selector: selector.to_string(),
                });
            }
            debug!("Skipping click, no element matches '{}'", selector);
        }
        Ok(())
    }
}

pub(crate) fn reject_click_duration(
    ctx: &RunContext,
    action: &ActionSpec,
    click: &ClickAction,
) -> Result<(), RunError> {
    if click.duration().is_zero() {
        return Ok(());
    }
    Err(ctx.not_implemented(
        action,
        format!(
            "Source: '{}' does not support a non-zero click duration",
            click.source()
        ),
    ))
}

/// Interpolates the scroll offset over the action's duration, then snaps to
/// the exact target so timer drift never leaves the page short.
pub struct ScriptScrollHandler;

impl ScriptScrollHandler {
    async fn read_offset(
        surface: &mut dyn Surface,
        scroll: &ScrollAction,
        selector: &str,
    ) -> Result<Option<f64>, RunError> {
        let query = selector::scroll_position_script(scroll.selector());
        let field = selector::scroll_field(scroll.selector().is_some());
        let reply = surface
            .evaluate(&query.script, vec![json!(selector), json!(field)])
            .await?;
        match reply.as_array().map(Vec::as_slice) {
            Some([found, offset]) => {
                if found.as_bool() != Some(true) {
                    return Ok(None);
                }
                Ok(Some(offset.as_f64().unwrap_or(0.0)))
            }
            _ => Err(RunError::UnexpectedValue(format!(
                "scroll position reply {}",
                reply
            ))),
        }
    }
}

#[async_trait]
impl ActionHandler for ScriptScrollHandler {
    async fn run(
        &self,
        ctx: &mut RunContext,
        surface: &mut dyn Surface,
        action: &ActionSpec,
    ) -> Result<(), RunError> {
        let ActionBody::Scroll(scroll) = action.body() else {
            return Err(mismatched(action, "scroll"));
        };
        let scroll_to = selector::scroll_to_script(scroll.selector());
        let target = json!(scroll_to.selector);

        let Some(initial) = Self::read_offset(surface, scroll, &scroll_to.selector).await? else {
            if scroll.required() {
                return Err(RunError::ElementNotFound {
                    selector: scroll.selector().unwrap_or_default().to_string(),
                });
            }
            debug!("Skipping scroll, no element matches {:?}", scroll.selector());
            return Ok(());
        };

        let distance = scroll.distance();
        let pacer = Pacer::start(scroll.duration());
        while !pacer.is_done() {
            let offset = initial + pacer.progress() * distance;
            surface
                .evaluate(&scroll_to.script, vec![target.clone(), json!(offset)])
                .await?;
            surface.wait(ctx.settings().scroll_step_interval).await?;
        }
        surface
            .evaluate(&scroll_to.script, vec![target, json!(initial + distance)])
            .await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Typing {
    /// Append to `document.activeElement` from a page script.
    Script,
    /// Synthesized key events.
    Keyboard,
}

/// Emits text one character at a time so that the whole text takes the
/// action's duration. Deadlines come from a fixed start time; an overrun
/// beyond the configured threshold is a warning, not a failure.
pub struct TextInputHandler {
    pub typing: Typing,
}

impl TextInputHandler {
    async fn type_text(&self, surface: &mut dyn Surface, text: &str) -> Result<(), RunError> {
        match self.typing {
            Typing::Keyboard => surface.synthesize_keystrokes(text).await?,
            Typing::Script => {
                let typed = surface
                    .evaluate(selector::type_text_script(), vec![json!(text)])
                    .await?;
                if typed != Value::Bool(true) {
                    debug!("No focused editable element to type into");
                }
            }
        }
        Ok(())
    }

    async fn type_paced(
        &self,
        ctx: &RunContext,
        surface: &mut dyn Surface,
        input: &TextInputAction,
    ) -> Result<(), RunError> {
        let characters: Vec<char> = input.text().chars().collect();
        let pacer = Pacer::start(input.duration());
        let schedule = pacer.schedule(characters.len());
        let mut buffer = [0u8; 4];
        for (step, character) in characters.iter().enumerate() {
            self.type_text(surface, character.encode_utf8(&mut buffer))
                .await?;
            let wait = schedule.wait_after(step);
            if !wait.is_zero() {
                surface.wait(wait).await?;
            }
        }
        let overrun = pacer.overrun();
        if overrun > ctx.settings().keystroke_overrun_warning {
            ctx.warn(&format!(
                "text_input action is behind schedule by {:?}; consider extending its duration",
                overrun
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ActionHandler for TextInputHandler {
    async fn run(
        &self,
        ctx: &mut RunContext,
        surface: &mut dyn Surface,
        action: &ActionSpec,
    ) -> Result<(), RunError> {
        let ActionBody::TextInput(input) = action.body() else {
            return Err(mismatched(action, "text_input"));
        };
        if input.duration().is_zero() {
            return self.type_text(surface, input.text()).await;
        }
        self.type_paced(ctx, surface, input).await
    }
}
