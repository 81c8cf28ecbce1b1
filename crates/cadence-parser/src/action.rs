//! Immutable descriptions of single interactions.
//!
//! Every body type validates itself in its constructor, so a value that
//! exists is a valid action.

use crate::error::ValidationError;
use crate::source::ScriptResolver;
use cadence_common::{ActionKind, InputSource, Point, ReadyState, Timeout, WindowTarget};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

fn is_false(value: &bool) -> bool {
    !*value
}

// =============================================================================
// Action
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionSpec {
    index: usize,
    timeout: Timeout,
    #[serde(flatten)]
    body: ActionBody,
}

impl ActionSpec {
    pub fn new(index: usize, body: impl Into<ActionBody>) -> Self {
        Self {
            index,
            timeout: Timeout::DEFAULT,
            body: body.into(),
        }
    }

    pub fn with_timeout(mut self, timeout: Timeout) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn timeout(&self) -> Timeout {
        self.timeout
    }

    pub fn body(&self) -> &ActionBody {
        &self.body
    }

    pub fn kind(&self) -> ActionKind {
        self.body.kind()
    }

    pub fn input_source(&self) -> Option<InputSource> {
        self.body.input_source()
    }

    /// Nominal playback time, zero for actions without a duration.
    pub fn duration(&self) -> Duration {
        self.body.duration()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action")]
pub enum ActionBody {
    #[serde(rename = "get")]
    Get(GetAction),
    #[serde(rename = "wait")]
    Wait(WaitAction),
    #[serde(rename = "scroll")]
    Scroll(ScrollAction),
    #[serde(rename = "click")]
    Click(ClickAction),
    #[serde(rename = "swipe")]
    Swipe(SwipeAction),
    #[serde(rename = "text_input")]
    TextInput(TextInputAction),
    #[serde(rename = "wait_for_element")]
    WaitForElement(WaitForElementAction),
    #[serde(rename = "js")]
    RunScript(ScriptAction),
    #[serde(rename = "inject_new_document_script")]
    InjectDocumentScript(ScriptAction),
    #[serde(rename = "screenshot")]
    Screenshot,
}

impl ActionBody {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionBody::Get(_) => ActionKind::Get,
            ActionBody::Wait(_) => ActionKind::Wait,
            ActionBody::Scroll(_) => ActionKind::Scroll,
            ActionBody::Click(_) => ActionKind::Click,
            ActionBody::Swipe(_) => ActionKind::Swipe,
            ActionBody::TextInput(_) => ActionKind::TextInput,
            ActionBody::WaitForElement(_) => ActionKind::WaitForElement,
            ActionBody::RunScript(_) => ActionKind::RunScript,
            ActionBody::InjectDocumentScript(_) => ActionKind::InjectDocumentScript,
            ActionBody::Screenshot => ActionKind::Screenshot,
        }
    }

    pub fn input_source(&self) -> Option<InputSource> {
        match self {
            ActionBody::Scroll(scroll) => Some(scroll.source),
            ActionBody::Click(click) => Some(click.source),
            ActionBody::TextInput(input) => Some(input.source),
            _ => None,
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            ActionBody::Get(get) => get.duration,
            ActionBody::Wait(wait) => wait.duration,
            ActionBody::Scroll(scroll) => scroll.duration,
            ActionBody::Click(click) => click.duration,
            ActionBody::Swipe(swipe) => swipe.duration,
            ActionBody::TextInput(input) => input.duration,
            _ => Duration::ZERO,
        }
    }
}

macro_rules! into_body {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for ActionBody {
                fn from(action: $ty) -> Self {
                    ActionBody::$variant(action)
                }
            }
        )*
    };
}

into_body!(
    Get(GetAction),
    Wait(WaitAction),
    Scroll(ScrollAction),
    Click(ClickAction),
    Swipe(SwipeAction),
    TextInput(TextInputAction),
    WaitForElement(WaitForElementAction),
);

// =============================================================================
// Navigation and waiting
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GetAction {
    url: String,
    #[serde(serialize_with = "serialize_secs")]
    duration: Duration,
    ready_state: ReadyState,
    target: WindowTarget,
}

impl GetAction {
    /// A blocking `ready_state` replaces the fixed duration, so combining the
    /// two is rejected.
    pub fn new(
        url: impl Into<String>,
        duration: Duration,
        ready_state: ReadyState,
        target: WindowTarget,
    ) -> Result<Self, ValidationError> {
        let url = url.into();
        if url.is_empty() {
            return Err(ValidationError::field("url", "Expected a non-empty URL"));
        }
        if ready_state.is_blocking() && !duration.is_zero() {
            return Err(ValidationError::field(
                "duration",
                format!(
                    "Cannot combine a non-zero duration with ready_state={}",
                    ready_state
                ),
            ));
        }
        Ok(Self {
            url,
            duration,
            ready_state,
            target,
        })
    }

    pub fn url_with_duration(url: impl Into<String>, duration: Duration) -> Result<Self, ValidationError> {
        Self::new(url, duration, ReadyState::Any, WindowTarget::SelfTarget)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    pub fn target(&self) -> WindowTarget {
        self.target
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaitAction {
    #[serde(serialize_with = "serialize_secs")]
    duration: Duration,
}

impl WaitAction {
    pub fn new(duration: Duration) -> Result<Self, ValidationError> {
        if duration.is_zero() {
            return Err(ValidationError::field("duration", "Expected a non-zero duration"));
        }
        Ok(Self { duration })
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaitForElementAction {
    selector: String,
}

impl WaitForElementAction {
    pub fn new(selector: impl Into<String>) -> Result<Self, ValidationError> {
        let selector = selector.into();
        if selector.is_empty() {
            return Err(ValidationError::field("selector", "Expected a non-empty selector"));
        }
        Ok(Self { selector })
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }
}

// =============================================================================
// Pointer actions
// =============================================================================

fn check_pointer_source(source: InputSource) -> Result<(), ValidationError> {
    match source {
        InputSource::Script | InputSource::Touch | InputSource::Mouse => Ok(()),
        InputSource::Keyboard => Err(ValidationError::field(
            "source",
            "Expected one of js, touch, mouse, got keyboard",
        )),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrollAction {
    source: InputSource,
    distance: f64,
    #[serde(serialize_with = "serialize_secs")]
    duration: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    selector: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    required: bool,
}

impl ScrollAction {
    pub const DEFAULT_DISTANCE: f64 = 500.0;
    pub const DEFAULT_DURATION: Duration = Duration::from_secs(1);

    pub fn new(
        source: InputSource,
        distance: f64,
        duration: Duration,
        selector: Option<String>,
        required: bool,
    ) -> Result<Self, ValidationError> {
        check_pointer_source(source)?;
        if !distance.is_finite() || distance == 0.0 {
            return Err(ValidationError::field(
                "distance",
                format!("Expected a non-zero distance, got {}", distance),
            ));
        }
        if duration.is_zero() {
            return Err(ValidationError::field("duration", "Expected a non-zero duration"));
        }
        if matches!(selector.as_deref(), Some("")) {
            return Err(ValidationError::field("selector", "Expected a non-empty selector"));
        }
        if required && selector.is_none() {
            return Err(ValidationError::field(
                "required",
                "'required' is only valid together with a selector",
            ));
        }
        Ok(Self {
            source,
            distance,
            duration,
            selector,
            required,
        })
    }

    pub fn source(&self) -> InputSource {
        self.source
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn selector(&self) -> Option<&str> {
        self.selector.as_deref()
    }

    pub fn required(&self) -> bool {
        self.required
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ClickTarget {
    Selector { selector: String },
    Coordinates { x: u32, y: u32 },
}

impl ClickTarget {
    pub fn selector(&self) -> Option<&str> {
        match self {
            ClickTarget::Selector { selector } => Some(selector),
            ClickTarget::Coordinates { .. } => None,
        }
    }

    pub fn point(&self) -> Option<Point> {
        match self {
            ClickTarget::Selector { .. } => None,
            ClickTarget::Coordinates { x, y } => Some(Point::new(f64::from(*x), f64::from(*y))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClickAction {
    source: InputSource,
    #[serde(flatten)]
    target: ClickTarget,
    #[serde(skip_serializing_if = "is_false")]
    required: bool,
    #[serde(skip_serializing_if = "is_false")]
    scroll_into_view: bool,
    #[serde(serialize_with = "serialize_secs")]
    duration: Duration,
}

impl ClickAction {
    pub fn new(
        source: InputSource,
        selector: Option<String>,
        coordinates: Option<(u32, u32)>,
        required: bool,
        scroll_into_view: bool,
        duration: Duration,
    ) -> Result<Self, ValidationError> {
        check_pointer_source(source)?;
        let target = match (selector, coordinates) {
            (Some(_), Some(_)) => {
                return Err(ValidationError::new(
                    "Only one of 'selector' or coordinates (x, y) may be specified",
                ));
            }
            (None, None) => {
                return Err(ValidationError::new(
                    "Either 'selector' or coordinates (x, y) are required",
                ));
            }
            (Some(selector), None) => {
                if selector.is_empty() {
                    return Err(ValidationError::field("selector", "Expected a non-empty selector"));
                }
                ClickTarget::Selector { selector }
            }
            (None, Some((x, y))) => {
                if source == InputSource::Script {
                    return Err(ValidationError::field(
                        "source",
                        "Coordinates are not supported with the js source",
                    ));
                }
                if required {
                    return Err(ValidationError::field(
                        "required",
                        "'required' is only valid together with a selector",
                    ));
                }
                if scroll_into_view {
                    return Err(ValidationError::field(
                        "scroll_into_view",
                        "'scroll_into_view' is only valid together with a selector",
                    ));
                }
                ClickTarget::Coordinates { x, y }
            }
        };
        Ok(Self {
            source,
            target,
            required,
            scroll_into_view,
            duration,
        })
    }

    pub fn source(&self) -> InputSource {
        self.source
    }

    pub fn target(&self) -> &ClickTarget {
        &self.target
    }

    pub fn selector(&self) -> Option<&str> {
        self.target.selector()
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn scroll_into_view(&self) -> bool {
        self.scroll_into_view
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwipeAction {
    start_x: i64,
    start_y: i64,
    end_x: i64,
    end_y: i64,
    #[serde(serialize_with = "serialize_secs")]
    duration: Duration,
}

impl SwipeAction {
    pub const DEFAULT_DURATION: Duration = Duration::from_secs(1);

    pub fn new(
        start: (i64, i64),
        end: (i64, i64),
        duration: Duration,
    ) -> Result<Self, ValidationError> {
        if duration.is_zero() {
            return Err(ValidationError::field("duration", "Expected a non-zero duration"));
        }
        Ok(Self {
            start_x: start.0,
            start_y: start.1,
            end_x: end.0,
            end_y: end.1,
            duration,
        })
    }

    pub fn start(&self) -> Point {
        Point::new(self.start_x as f64, self.start_y as f64)
    }

    pub fn end(&self) -> Point {
        Point::new(self.end_x as f64, self.end_y as f64)
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextInputAction {
    source: InputSource,
    text: String,
    #[serde(serialize_with = "serialize_secs")]
    duration: Duration,
}

impl TextInputAction {
    pub fn new(
        source: InputSource,
        text: impl Into<String>,
        duration: Duration,
    ) -> Result<Self, ValidationError> {
        if !matches!(source, InputSource::Script | InputSource::Keyboard) {
            return Err(ValidationError::field(
                "source",
                format!("Expected one of js, keyboard, got {}", source),
            ));
        }
        let text = text.into();
        if text.is_empty() {
            return Err(ValidationError::field("text", "Expected non-empty text"));
        }
        Ok(Self {
            source,
            text,
            duration,
        })
    }

    pub fn source(&self) -> InputSource {
        self.source
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

// =============================================================================
// Scripts
// =============================================================================

/// Script body for `js` and `inject_new_document_script` actions.
///
/// Replacements are applied once, at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptAction {
    script: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    script_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    replacements: BTreeMap<String, String>,
}

impl ScriptAction {
    pub fn new(
        script: Option<String>,
        script_path: Option<PathBuf>,
        replacements: BTreeMap<String, String>,
        resolver: &dyn ScriptResolver,
    ) -> Result<Self, ValidationError> {
        let raw = match (script, &script_path) {
            (Some(_), Some(_)) => {
                return Err(ValidationError::new(
                    "Only one of 'script' or 'script_path' may be specified",
                ));
            }
            (None, None) => {
                return Err(ValidationError::new(
                    "Either 'script' or 'script_path' is required",
                ));
            }
            (Some(script), None) => script,
            (None, Some(path)) => resolver.read_script(path).map_err(|e| {
                ValidationError::field(
                    "script_path",
                    format!("Could not read script '{}': {}", path.display(), e),
                )
            })?,
        };
        if replacements.keys().any(String::is_empty) {
            return Err(ValidationError::field(
                "replacements",
                "Replacement keys must be non-empty",
            ));
        }
        let mut script = raw;
        for (key, value) in &replacements {
            script = script.replace(key.as_str(), value);
        }
        if script.trim().is_empty() {
            return Err(ValidationError::field("script", "Expected a non-empty script"));
        }
        Ok(Self {
            script,
            script_path,
            replacements,
        })
    }

    pub fn inline(script: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(
            Some(script.into()),
            None,
            BTreeMap::new(),
            &crate::source::FsScriptResolver::default(),
        )
    }

    /// Script text with all replacements applied.
    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn script_path(&self) -> Option<&std::path::Path> {
        self.script_path.as_deref()
    }

    pub fn replacements(&self) -> &BTreeMap<String, String> {
        &self.replacements
    }
}
