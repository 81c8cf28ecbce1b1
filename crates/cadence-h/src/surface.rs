use crate::cdp::{CdpClient, LaunchOptions};
use async_trait::async_trait;
use cadence_common::{DisplayRectangle, Point, Pointer, WindowTarget};
use cadence_engine::{Surface, SurfaceError};
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType, DispatchTouchEventParams,
    DispatchTouchEventType, InsertTextParams, MouseButton, TouchPoint,
};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::page::ScreenshotParams;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Interval between intermediate pointer moves of a swipe, one frame at 60Hz.
const SWIPE_FRAME: Duration = Duration::from_millis(16);
/// Longer swipes stretch the frame interval instead of adding frames.
const MAX_SWIPE_FRAMES: u128 = 1000;

/// A [`Surface`] backed by a headless (or visible) Chromium tab.
pub struct HeadlessSurface {
    client: Option<CdpClient>,
    options: LaunchOptions,
}

impl HeadlessSurface {
    pub fn new(options: LaunchOptions) -> Self {
        Self {
            client: None,
            options,
        }
    }

    pub async fn launch(&mut self) -> Result<(), SurfaceError> {
        info!("Launching headless surface (Chromium)...");
        let client = CdpClient::launch(&self.options)
            .await
            .map_err(|e| SurfaceError::Other(e.to_string()))?;
        self.client = Some(client);
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), SurfaceError> {
        if let Some(client) = self.client.take() {
            client
                .close()
                .await
                .map_err(|e| SurfaceError::Other(e.to_string()))?;
        }
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    fn page(&self) -> Result<&Page, SurfaceError> {
        self.client
            .as_ref()
            .map(|client| &client.page)
            .ok_or(SurfaceError::NotReady)
    }

    async fn touch(
        &self,
        kind: DispatchTouchEventType,
        at: Option<Point>,
    ) -> Result<(), SurfaceError> {
        let points = match at {
            Some(at) => vec![
                TouchPoint::builder()
                    .x(at.x)
                    .y(at.y)
                    .build()
                    .map_err(SurfaceError::Input)?,
            ],
            None => Vec::new(),
        };
        let params = DispatchTouchEventParams::builder()
            .r#type(kind)
            .touch_points(points)
            .build()
            .map_err(SurfaceError::Input)?;
        self.page()?
            .execute(params)
            .await
            .map_err(|e| SurfaceError::Input(e.to_string()))?;
        Ok(())
    }

    async fn mouse(&self, kind: DispatchMouseEventType, at: Point) -> Result<(), SurfaceError> {
        let mut builder = DispatchMouseEventParams::builder()
            .r#type(kind.clone())
            .x(at.x)
            .y(at.y);
        if kind != DispatchMouseEventType::MouseMoved {
            builder = builder.button(MouseButton::Left).click_count(1);
        }
        let params = builder.build().map_err(SurfaceError::Input)?;
        self.page()?
            .execute(params)
            .await
            .map_err(|e| SurfaceError::Input(e.to_string()))?;
        Ok(())
    }

    async fn press(&self, at: Point, pointer: Pointer) -> Result<(), SurfaceError> {
        match pointer {
            Pointer::Touch => self.touch(DispatchTouchEventType::TouchStart, Some(at)).await,
            Pointer::Mouse => self.mouse(DispatchMouseEventType::MousePressed, at).await,
        }
    }

    async fn move_to(&self, at: Point, pointer: Pointer) -> Result<(), SurfaceError> {
        match pointer {
            Pointer::Touch => self.touch(DispatchTouchEventType::TouchMove, Some(at)).await,
            Pointer::Mouse => self.mouse(DispatchMouseEventType::MouseMoved, at).await,
        }
    }

    async fn release(&self, at: Point, pointer: Pointer) -> Result<(), SurfaceError> {
        match pointer {
            Pointer::Touch => self.touch(DispatchTouchEventType::TouchEnd, None).await,
            Pointer::Mouse => self.mouse(DispatchMouseEventType::MouseReleased, at).await,
        }
    }
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new(LaunchOptions::default())
    }
}

/// Wrap a function body so that `arguments` is bound and a returned promise
/// resolves before the value is handed back.
pub fn function_call_expression(script: &str, args: &[Value]) -> Result<String, SurfaceError> {
    let args = serde_json::to_string(args)?;
    Ok(format!(
        "(async function() {{\n{}\n}}).apply(window, {})",
        script, args
    ))
}

/// Intermediate positions of a swipe, ending exactly at `to`.
pub fn swipe_path(from: Point, to: Point, duration: Duration) -> Vec<Point> {
    let frames = (duration.as_millis() / SWIPE_FRAME.as_millis()).clamp(1, MAX_SWIPE_FRAMES) as usize;
    (1..=frames)
        .map(|frame| {
            let t = frame as f64 / frames as f64;
            Point::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t)
        })
        .collect()
}

#[async_trait]
impl Surface for HeadlessSurface {
    fn name(&self) -> &str {
        "headless"
    }

    async fn navigate(&mut self, url: &str, target: WindowTarget) -> Result<(), SurfaceError> {
        info!("Navigating to: {} ({})", url, target);
        match target {
            WindowTarget::SelfTarget => {
                self.page()?
                    .goto(url)
                    .await
                    .map_err(|e| SurfaceError::Navigation(e.to_string()))?;
            }
            _ => {
                self.evaluate(
                    "window.open(arguments[0], arguments[1]);",
                    vec![Value::from(url), Value::from(target.as_str())],
                )
                .await
                .map_err(|e| SurfaceError::Navigation(e.to_string()))?;
            }
        }
        Ok(())
    }

    async fn evaluate(&mut self, script: &str, args: Vec<Value>) -> Result<Value, SurfaceError> {
        let expression = function_call_expression(script, &args)?;
        let params = EvaluateParams::builder()
            .expression(expression)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(SurfaceError::Script)?;
        let result = self
            .page()?
            .evaluate_expression(params)
            .await
            .map_err(|e| SurfaceError::Script(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn synthesize_tap(&mut self, at: Point, pointer: Pointer) -> Result<(), SurfaceError> {
        debug!("{} tap at ({}, {})", pointer, at.x, at.y);
        self.press(at, pointer).await?;
        self.release(at, pointer).await
    }

    async fn synthesize_swipe(
        &mut self,
        from: Point,
        to: Point,
        duration: Duration,
        pointer: Pointer,
    ) -> Result<(), SurfaceError> {
        debug!(
            "{} swipe ({}, {}) -> ({}, {}) over {:?}",
            pointer, from.x, from.y, to.x, to.y, duration
        );
        let path = swipe_path(from, to, duration);
        let frame = duration / path.len() as u32;
        self.press(from, pointer).await?;
        for point in path {
            tokio::time::sleep(frame).await;
            self.move_to(point, pointer).await?;
        }
        self.release(to, pointer).await
    }

    async fn synthesize_keystrokes(&mut self, text: &str) -> Result<(), SurfaceError> {
        self.page()?
            .execute(InsertTextParams::new(text))
            .await
            .map_err(|e| SurfaceError::Input(e.to_string()))?;
        Ok(())
    }

    /// Input events are dispatched in CSS pixels relative to the viewport, so
    /// the content window is the viewport itself.
    async fn window_bounds(&mut self) -> Result<DisplayRectangle, SurfaceError> {
        let size = self
            .evaluate("return [window.innerWidth, window.innerHeight];", Vec::new())
            .await?;
        let dimension = |i: usize| {
            size.get(i)
                .and_then(Value::as_f64)
                .ok_or_else(|| SurfaceError::Serialization(format!("bad viewport size: {}", size)))
        };
        Ok(DisplayRectangle::new(0.0, 0.0, dimension(0)?, dimension(1)?))
    }

    async fn inject_new_document_script(&mut self, script: &str) -> Result<(), SurfaceError> {
        self.page()?
            .execute(AddScriptToEvaluateOnNewDocumentParams::new(script))
            .await
            .map_err(|e| SurfaceError::Script(e.to_string()))?;
        Ok(())
    }

    async fn capture(&mut self) -> Result<Vec<u8>, SurfaceError> {
        self.page()?
            .screenshot(ScreenshotParams::builder().build())
            .await
            .map_err(|e| SurfaceError::Other(format!("screenshot failed: {}", e)))
    }
}
