//! Playback of whole pages: login, repetitions, failure screenshots.

use crate::diagnostics::DiagnosticsSink;
use crate::error::RunError;
use crate::runner::{ActionRunner, RunContext, RunnerSettings};
use crate::surface::Surface;
use cadence_common::WindowTarget;
use cadence_parser::{ActionBlock, PageScript};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info};

const FAILURE_SUFFIX: &str = "failure";
const LOGIN_FAILURE_SUFFIX: &str = "login-failure";

/// Lifecycle of one page playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "block")]
pub enum RunState {
    Idle,
    RunningLogin,
    RunningBlock(usize),
    Done,
    Failed,
}

impl RunState {
    pub fn is_running(&self) -> bool {
        matches!(self, RunState::RunningLogin | RunState::RunningBlock(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Failed)
    }

    /// Allowed transitions. Blocks run strictly in order and a playback may
    /// start over at block 0 for its next repetition.
    pub fn can_advance_to(&self, next: RunState) -> bool {
        match (*self, next) {
            (RunState::Idle, RunState::RunningLogin) => true,
            (RunState::Idle | RunState::RunningLogin, RunState::RunningBlock(0)) => true,
            (RunState::RunningBlock(current), RunState::RunningBlock(next)) => {
                next == current + 1 || next == 0
            }
            (RunState::RunningBlock(_), RunState::Done) => true,
            (state, RunState::Failed) => state.is_running(),
            _ => false,
        }
    }
}

/// Summary of a finished page playback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageReport {
    pub label: String,
    pub repetitions: u32,
    pub actions: usize,
    pub elapsed: Duration,
    pub state: RunState,
}

/// One playback of one page on one surface.
pub struct PageRun<'a> {
    runner: &'a ActionRunner,
    page: &'a PageScript,
    ctx: RunContext,
    state: RunState,
    actions: usize,
}

impl<'a> PageRun<'a> {
    pub fn new(runner: &'a ActionRunner, page: &'a PageScript, ctx: RunContext) -> Self {
        Self {
            runner,
            page,
            ctx,
            state: RunState::Idle,
            actions: 0,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    fn advance(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "invalid transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!("page {}: {:?} -> {:?}", self.page.label(), self.state, next);
        self.state = next;
    }

    /// Run the login block, if any. On failure a `login-failure` screenshot
    /// is attempted before the error is returned.
    pub async fn run_login(&mut self, surface: &mut dyn Surface) -> Result<(), RunError> {
        let Some(login) = self.page.login() else {
            return Ok(());
        };
        self.advance(RunState::RunningLogin);
        if let Err(err) = self.run_block(surface, login).await {
            self.fail(surface, LOGIN_FAILURE_SUFFIX).await;
            return Err(err);
        }
        Ok(())
    }

    /// Run every regular block once, then optionally rest on `about:blank`.
    pub async fn run_blocks(&mut self, surface: &mut dyn Surface) -> Result<(), RunError> {
        let page = self.page;
        for block in page.blocks() {
            self.advance(RunState::RunningBlock(block.index()));
            if let Err(err) = self.run_block(surface, block).await {
                self.fail(surface, FAILURE_SUFFIX).await;
                return Err(err);
            }
        }
        if let Err(err) = self.about_blank(surface).await {
            self.fail(surface, FAILURE_SUFFIX).await;
            return Err(err);
        }
        Ok(())
    }

    pub fn finish(&mut self) {
        if !self.state.is_terminal() {
            self.advance(RunState::Done);
        }
    }

    async fn run_block(
        &mut self,
        surface: &mut dyn Surface,
        block: &ActionBlock,
    ) -> Result<(), RunError> {
        self.runner.run_block(&mut self.ctx, surface, block).await?;
        self.actions += block.len();
        Ok(())
    }

    async fn about_blank(&mut self, surface: &mut dyn Surface) -> Result<(), RunError> {
        let duration = self.ctx.settings().about_blank_duration;
        if duration.is_zero() {
            return Ok(());
        }
        surface.navigate("about:blank", WindowTarget::SelfTarget).await?;
        surface.wait(duration).await?;
        Ok(())
    }

    async fn fail(&mut self, surface: &mut dyn Surface, suffix: &str) {
        self.advance(RunState::Failed);
        failure_screenshot(&self.ctx, surface, suffix).await;
    }
}

/// Best effort: a capture failure is logged and never replaces the error that
/// triggered it.
pub async fn failure_screenshot(ctx: &RunContext, surface: &mut dyn Surface, suffix: &str) {
    match ctx.screenshot(surface, suffix).await {
        Ok(path) => info!("Saved failure screenshot {}", path.display()),
        Err(err) if err.is_not_implemented() => {
            debug!("Skipping failure screenshot: {}", err)
        }
        Err(err) => error!("Failed to capture failure screenshot: {}", err),
    }
}

/// Plays pages: the login block once, then the blocks `playback` times.
pub struct StoryRunner {
    runner: ActionRunner,
    settings: RunnerSettings,
    sink: Arc<dyn DiagnosticsSink>,
}

impl StoryRunner {
    pub fn new(runner: ActionRunner, settings: RunnerSettings, sink: Arc<dyn DiagnosticsSink>) -> Self {
        Self {
            runner,
            settings,
            sink,
        }
    }

    pub fn runner(&self) -> &ActionRunner {
        &self.runner
    }

    pub async fn run_page(
        &self,
        surface: &mut dyn Surface,
        page: &PageScript,
    ) -> Result<PageReport, RunError> {
        let started = Instant::now();
        let ctx = self.runner.context(self.settings.clone(), self.sink.clone());
        let mut run = PageRun::new(&self.runner, page, ctx);
        info!(
            "Running page '{}' ({} blocks, {}x)",
            page.label(),
            page.blocks().len(),
            page.playback().count()
        );

        run.run_login(surface).await?;
        for repetition in 0..page.playback().count() {
            debug!("page {} repetition {}", page.label(), repetition + 1);
            run.run_blocks(surface).await?;
        }
        run.finish();

        Ok(PageReport {
            label: page.label().to_string(),
            repetitions: page.playback().count(),
            actions: run.actions,
            elapsed: started.elapsed(),
            state: run.state(),
        })
    }

    /// Run pages in order, stopping at the first failure.
    pub async fn run_pages(
        &self,
        surface: &mut dyn Surface,
        pages: &[PageScript],
    ) -> Result<Vec<PageReport>, RunError> {
        let mut reports = Vec::with_capacity(pages.len());
        for page in pages {
            reports.push(self.run_page(surface, page).await?);
        }
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        assert!(RunState::Idle.can_advance_to(RunState::RunningLogin));
        assert!(RunState::Idle.can_advance_to(RunState::RunningBlock(0)));
        assert!(!RunState::Idle.can_advance_to(RunState::RunningBlock(1)));
        assert!(RunState::RunningLogin.can_advance_to(RunState::RunningBlock(0)));
        assert!(RunState::RunningBlock(0).can_advance_to(RunState::RunningBlock(1)));
        assert!(!RunState::RunningBlock(0).can_advance_to(RunState::RunningBlock(2)));
        assert!(RunState::RunningBlock(3).can_advance_to(RunState::Done));
        assert!(!RunState::RunningLogin.can_advance_to(RunState::Done));
        assert!(RunState::RunningLogin.can_advance_to(RunState::Failed));
        assert!(!RunState::Idle.can_advance_to(RunState::Failed));
        assert!(!RunState::Done.can_advance_to(RunState::RunningBlock(0)));
    }
}
