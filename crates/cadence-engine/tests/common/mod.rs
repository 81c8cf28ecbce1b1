#![allow(dead_code)]

use async_trait::async_trait;
use cadence_common::{DisplayRectangle, Point, Pointer, WindowTarget};
use cadence_engine::{
    ActionRunner, RecordingSink, RunContext, RunnerSettings, Surface, SurfaceError,
};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Navigate(String),
    Evaluate(String),
    Wait(Duration),
    Tap(Point, Pointer),
    Swipe(Point, Point, Duration, Pointer),
    Keys(String),
    Inject(String),
    Capture,
}

/// In-memory page: records every primitive, simulates scrolling, element
/// presence, readyState and a fixed overhead per call.
#[derive(Debug)]
pub struct MockSurface {
    pub calls: Vec<Call>,
    pub overhead: Duration,
    pub scroll_offset: f64,
    pub elements: HashSet<String>,
    pub element_rect: DisplayRectangle,
    pub ready_state: &'static str,
    pub inner_size: (f64, f64),
    pub window: Option<DisplayRectangle>,
    pub capture: Result<Vec<u8>, SurfaceError>,
    pub typed: String,
    pub hang_wait_for_element: bool,
}

impl Default for MockSurface {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            overhead: Duration::ZERO,
            scroll_offset: 0.0,
            elements: HashSet::new(),
            element_rect: DisplayRectangle::new(0.0, 0.0, 10.0, 10.0),
            ready_state: "complete",
            inner_size: (400.0, 800.0),
            window: Some(DisplayRectangle::new(0.0, 0.0, 400.0, 800.0)),
            capture: Ok(vec![0x89, b'P', b'N', b'G']),
            typed: String::new(),
            hang_wait_for_element: false,
        }
    }
}

impl MockSurface {
    pub fn with_elements(selectors: &[&str]) -> Self {
        Self {
            elements: selectors.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn evaluations(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Evaluate(label) => Some(label.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn waits(&self) -> Vec<Duration> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Wait(duration) => Some(*duration),
                _ => None,
            })
            .collect()
    }

    pub fn swipes(&self) -> Vec<(Point, Point, Duration)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Swipe(from, to, duration, _) => Some((*from, *to, *duration)),
                _ => None,
            })
            .collect()
    }

    pub fn navigations(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Navigate(url) => Some(url.as_str()),
                _ => None,
            })
            .collect()
    }

    fn has(&self, selector: &Value) -> bool {
        selector
            .as_str()
            .is_some_and(|selector| self.elements.contains(selector))
    }

    async fn tick(&self) {
        if !self.overhead.is_zero() {
            tokio::time::sleep(self.overhead).await;
        }
    }
}

#[async_trait]
impl Surface for MockSurface {
    fn name(&self) -> &str {
        "mock"
    }

    async fn navigate(&mut self, url: &str, _target: WindowTarget) -> Result<(), SurfaceError> {
        self.tick().await;
        self.calls.push(Call::Navigate(url.to_string()));
        Ok(())
    }

    async fn evaluate(&mut self, script: &str, args: Vec<Value>) -> Result<Value, SurfaceError> {
        self.tick().await;
        let arg = |i: usize| args.get(i).cloned().unwrap_or(Value::Null);

        if script.contains("find(selector)") {
            self.calls.push(Call::Evaluate("wait_for_element".into()));
            if self.has(&arg(0)) {
                return Ok(json!(true));
            }
            if self.hang_wait_for_element {
                std::future::pending::<()>().await;
            }
            if let Some(ms) = arg(1).as_u64() {
                tokio::time::sleep(Duration::from_millis(ms)).await;
            }
            return Ok(json!(false));
        }
        if script.contains("document.readyState") {
            self.calls.push(Call::Evaluate("ready_state".into()));
            let satisfied = script.contains(&format!("'{}'", self.ready_state));
            return Ok(json!(satisfied));
        }
        if script.contains("element.click()") {
            self.calls.push(Call::Evaluate("click".into()));
            return Ok(json!(self.has(&arg(0))));
        }
        if script.contains("element[arguments[1]]") {
            self.calls.push(Call::Evaluate("read_scroll".into()));
            let found = script.contains("let element = window;") || self.has(&arg(0));
            return Ok(json!([found, self.scroll_offset]));
        }
        if script.contains("element.scrollTo") {
            let offset = arg(1).as_f64().unwrap_or_default();
            self.calls.push(Call::Evaluate(format!("scroll_to({})", offset)));
            self.scroll_offset = offset;
            return Ok(Value::Null);
        }
        if script.contains("window.innerHeight") {
            self.calls.push(Call::Evaluate("viewport".into()));
            let found = self.has(&arg(0));
            let rect = self.element_rect;
            let (width, height) = self.inner_size;
            return Ok(json!([
                found,
                height,
                width,
                rect.origin.x,
                rect.origin.y,
                rect.width,
                rect.height
            ]));
        }
        if script.contains("document.activeElement") {
            let text = arg(0).as_str().unwrap_or_default().to_string();
            self.calls.push(Call::Evaluate(format!("type({})", text)));
            self.typed.push_str(&text);
            return Ok(json!(true));
        }
        self.calls.push(Call::Evaluate(format!("js: {}", script)));
        if script.contains("throw") {
            return Err(SurfaceError::Script(script.to_string()));
        }
        Ok(Value::Null)
    }

    async fn wait(&mut self, duration: Duration) -> Result<(), SurfaceError> {
        self.calls.push(Call::Wait(duration));
        tokio::time::sleep(duration).await;
        Ok(())
    }

    async fn synthesize_tap(&mut self, at: Point, pointer: Pointer) -> Result<(), SurfaceError> {
        self.tick().await;
        self.calls.push(Call::Tap(at, pointer));
        Ok(())
    }

    async fn synthesize_swipe(
        &mut self,
        from: Point,
        to: Point,
        duration: Duration,
        pointer: Pointer,
    ) -> Result<(), SurfaceError> {
        self.calls.push(Call::Swipe(from, to, duration, pointer));
        tokio::time::sleep(duration).await;
        Ok(())
    }

    async fn synthesize_keystrokes(&mut self, text: &str) -> Result<(), SurfaceError> {
        self.tick().await;
        self.calls.push(Call::Keys(text.to_string()));
        self.typed.push_str(text);
        Ok(())
    }

    async fn window_bounds(&mut self) -> Result<DisplayRectangle, SurfaceError> {
        self.window
            .ok_or_else(|| SurfaceError::NotSupported("window_bounds".into()))
    }

    async fn inject_new_document_script(&mut self, script: &str) -> Result<(), SurfaceError> {
        self.calls.push(Call::Inject(script.to_string()));
        Ok(())
    }

    async fn capture(&mut self) -> Result<Vec<u8>, SurfaceError> {
        self.calls.push(Call::Capture);
        self.capture.clone()
    }
}

pub fn context(runner: &ActionRunner) -> (RunContext, Arc<RecordingSink>) {
    context_with(runner, RunnerSettings::default())
}

pub fn context_with(runner: &ActionRunner, settings: RunnerSettings) -> (RunContext, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    (runner.context(settings, sink.clone()), sink)
}
