use async_trait::async_trait;
pub use cadence_common::SurfaceError;
use cadence_common::{DisplayRectangle, Point, Pointer, Timeout, WindowTarget};
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;

/// The interaction surface a script is played against: one live browser tab.
///
/// Only `navigate` and `evaluate` are mandatory. Input synthesis, capture and
/// window geometry default to `NotSupported` so that a surface only has to
/// implement what its platform can do; the runner turns those into
/// configuration errors naming the missing capability.
#[async_trait]
pub trait Surface: Send {
    /// Name used in diagnostics ("headless", "mock", ...).
    fn name(&self) -> &str {
        "surface"
    }

    /// Load `url` into the given browsing context.
    async fn navigate(&mut self, url: &str, target: WindowTarget) -> Result<(), SurfaceError>;

    /// Run `script` as a function body with `arguments[i]` bound to `args[i]`.
    /// A returned promise is awaited.
    async fn evaluate(&mut self, script: &str, args: Vec<Value>) -> Result<Value, SurfaceError>;

    /// Block for `duration`.
    async fn wait(&mut self, duration: Duration) -> Result<(), SurfaceError> {
        tokio::time::sleep(duration).await;
        Ok(())
    }

    /// Evaluate `predicate` every `poll` until it returns `true` or `timeout`
    /// expires. Returns whether the predicate was satisfied.
    async fn wait_until(
        &mut self,
        predicate: &str,
        poll: Duration,
        timeout: Timeout,
    ) -> Result<bool, SurfaceError> {
        // A limit too large for the clock never expires.
        let deadline = timeout
            .as_duration()
            .and_then(|limit| Instant::now().checked_add(limit));
        loop {
            if self.evaluate(predicate, Vec::new()).await? == Value::Bool(true) {
                return Ok(true);
            }
            let pause = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(false);
                    }
                    poll.min(deadline - now)
                }
                None => poll,
            };
            self.wait(pause).await?;
        }
    }

    /// Tap or click at a point in window coordinates.
    async fn synthesize_tap(&mut self, _at: Point, _pointer: Pointer) -> Result<(), SurfaceError> {
        Err(SurfaceError::NotSupported("synthesize_tap".into()))
    }

    /// Drag from `from` to `to` over `duration`.
    async fn synthesize_swipe(
        &mut self,
        _from: Point,
        _to: Point,
        _duration: Duration,
        _pointer: Pointer,
    ) -> Result<(), SurfaceError> {
        Err(SurfaceError::NotSupported("synthesize_swipe".into()))
    }

    /// Type `text` into the focused element.
    async fn synthesize_keystrokes(&mut self, _text: &str) -> Result<(), SurfaceError> {
        Err(SurfaceError::NotSupported("synthesize_keystrokes".into()))
    }

    /// Bounds of the browser's content window in the coordinate space used by
    /// `synthesize_tap` and `synthesize_swipe`.
    async fn window_bounds(&mut self) -> Result<DisplayRectangle, SurfaceError> {
        Err(SurfaceError::NotSupported("window_bounds".into()))
    }

    /// Register a script that runs before any page script on every new document.
    async fn inject_new_document_script(&mut self, _script: &str) -> Result<(), SurfaceError> {
        Err(SurfaceError::NotSupported("inject_new_document_script".into()))
    }

    /// Capture the visible viewport as PNG bytes.
    async fn capture(&mut self) -> Result<Vec<u8>, SurfaceError> {
        Err(SurfaceError::NotSupported("capture".into()))
    }
}
