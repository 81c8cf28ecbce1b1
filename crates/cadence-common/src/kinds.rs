//! Closed vocabularies shared by the parser and the runner.
//!
//! Every enum parses from its configuration spelling (plus a few aliases)
//! through `FromStr`, and prints its canonical spelling through `Display`.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Error returned when a string does not name any variant of a vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {what} '{value}', expected one of: {}", .choices.join(", "))]
pub struct UnknownVariant {
    pub what: &'static str,
    pub value: String,
    pub choices: Vec<&'static str>,
}

impl UnknownVariant {
    fn new(what: &'static str, value: &str, choices: &[&'static str]) -> Self {
        Self {
            what,
            value: value.to_string(),
            choices: choices.to_vec(),
        }
    }
}

// =============================================================================
// Action kinds
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Get,
    #[serde(rename = "js")]
    RunScript,
    Wait,
    Scroll,
    Click,
    Swipe,
    TextInput,
    WaitForElement,
    #[serde(rename = "inject_new_document_script")]
    InjectDocumentScript,
    Screenshot,
}

impl ActionKind {
    pub const ALL: [ActionKind; 10] = [
        ActionKind::Get,
        ActionKind::RunScript,
        ActionKind::Wait,
        ActionKind::Scroll,
        ActionKind::Click,
        ActionKind::Swipe,
        ActionKind::TextInput,
        ActionKind::WaitForElement,
        ActionKind::InjectDocumentScript,
        ActionKind::Screenshot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Get => "get",
            ActionKind::RunScript => "js",
            ActionKind::Wait => "wait",
            ActionKind::Scroll => "scroll",
            ActionKind::Click => "click",
            ActionKind::Swipe => "swipe",
            ActionKind::TextInput => "text_input",
            ActionKind::WaitForElement => "wait_for_element",
            ActionKind::InjectDocumentScript => "inject_new_document_script",
            ActionKind::Screenshot => "screenshot",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ActionKind::Get => "Open a URL",
            ActionKind::RunScript => "Run a custom script",
            ActionKind::Wait => "Wait for a given time",
            ActionKind::Scroll => "Scroll on page",
            ActionKind::Click => "Click on element or at specified coordinates",
            ActionKind::Swipe => "Swipe on screen",
            ActionKind::TextInput => "Type printable characters at a specified speed",
            ActionKind::WaitForElement => "Wait until element appears on the page",
            ActionKind::InjectDocumentScript => {
                "Evaluate a script in every frame upon creation, before the frame's own scripts"
            }
            ActionKind::Screenshot => "Take a screenshot",
        }
    }

    /// Kinds whose execution strategy depends on an input source.
    pub fn takes_input_source(&self) -> bool {
        matches!(
            self,
            ActionKind::Click | ActionKind::Scroll | ActionKind::TextInput
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "run_script" => return Ok(ActionKind::RunScript),
            "inject_document_script" => return Ok(ActionKind::InjectDocumentScript),
            _ => {}
        }
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                let choices: Vec<&'static str> =
                    ActionKind::ALL.iter().map(|kind| kind.as_str()).collect();
                UnknownVariant::new("action", s, &choices)
            })
    }
}

// =============================================================================
// Input sources
// =============================================================================

/// The simulated mechanism used to perform an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum InputSource {
    /// Inject a script into the page to simulate the action.
    #[serde(rename = "js")]
    Script,
    #[serde(rename = "touch")]
    Touch,
    #[serde(rename = "mouse")]
    Mouse,
    #[serde(rename = "keyboard")]
    Keyboard,
}

impl InputSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputSource::Script => "js",
            InputSource::Touch => "touch",
            InputSource::Mouse => "mouse",
            InputSource::Keyboard => "keyboard",
        }
    }

    /// The pointer device backing this source, if it is a pointer at all.
    pub fn pointer(&self) -> Option<Pointer> {
        match self {
            InputSource::Touch => Some(Pointer::Touch),
            InputSource::Mouse => Some(Pointer::Mouse),
            InputSource::Script | InputSource::Keyboard => None,
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputSource {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "js" | "script" => Ok(InputSource::Script),
            "touch" => Ok(InputSource::Touch),
            "mouse" => Ok(InputSource::Mouse),
            "keyboard" => Ok(InputSource::Keyboard),
            _ => Err(UnknownVariant::new(
                "input source",
                s,
                &["js", "touch", "mouse", "keyboard"],
            )),
        }
    }
}

/// Pointer device used for synthesized taps and swipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pointer {
    Touch,
    Mouse,
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pointer::Touch => f.write_str("touch"),
            Pointer::Mouse => f.write_str("mouse"),
        }
    }
}

// =============================================================================
// Page load parameters
// =============================================================================

/// See <https://developer.mozilla.org/en-US/docs/Web/API/Document/readyState>.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadyState {
    /// Do not block on the document state.
    #[default]
    Any,
    Loading,
    Interactive,
    Complete,
}

impl ReadyState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadyState::Any => "any",
            ReadyState::Loading => "loading",
            ReadyState::Interactive => "interactive",
            ReadyState::Complete => "complete",
        }
    }

    pub fn is_blocking(&self) -> bool {
        !matches!(self, ReadyState::Any)
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadyState {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(ReadyState::Any),
            "loading" => Ok(ReadyState::Loading),
            "interactive" => Ok(ReadyState::Interactive),
            "complete" => Ok(ReadyState::Complete),
            _ => Err(UnknownVariant::new(
                "ready state",
                s,
                &["any", "loading", "interactive", "complete"],
            )),
        }
    }
}

/// Browsing context a `Get` navigates, see `window.open()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum WindowTarget {
    #[default]
    #[serde(rename = "_self")]
    SelfTarget,
    #[serde(rename = "_blank")]
    Blank,
    #[serde(rename = "_parent")]
    Parent,
    #[serde(rename = "_top")]
    Top,
}

impl WindowTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowTarget::SelfTarget => "_self",
            WindowTarget::Blank => "_blank",
            WindowTarget::Parent => "_parent",
            WindowTarget::Top => "_top",
        }
    }
}

impl fmt::Display for WindowTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WindowTarget {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix('_').unwrap_or(s) {
            "self" => Ok(WindowTarget::SelfTarget),
            "blank" => Ok(WindowTarget::Blank),
            "parent" => Ok(WindowTarget::Parent),
            "top" => Ok(WindowTarget::Top),
            _ => Err(UnknownVariant::new(
                "window target",
                s,
                &["_self", "_blank", "_parent", "_top"],
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_kind_round_trips_through_its_name() {
        for kind in ActionKind::ALL {
            assert_eq!(kind.as_str().parse::<ActionKind>().unwrap(), kind);
        }
        assert_eq!(
            "run_script".parse::<ActionKind>().unwrap(),
            ActionKind::RunScript
        );
    }

    #[test]
    fn test_unknown_action_lists_choices() {
        let err = "teleport".parse::<ActionKind>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("teleport"));
        assert!(message.contains("wait_for_element"));
    }

    #[test]
    fn test_input_source_aliases() {
        assert_eq!("script".parse::<InputSource>().unwrap(), InputSource::Script);
        assert_eq!("js".parse::<InputSource>().unwrap(), InputSource::Script);
        assert_eq!(InputSource::Touch.pointer(), Some(Pointer::Touch));
        assert_eq!(InputSource::Keyboard.pointer(), None);
    }

    #[test]
    fn test_window_target_accepts_bare_names() {
        assert_eq!("blank".parse::<WindowTarget>().unwrap(), WindowTarget::Blank);
        assert_eq!("_top".parse::<WindowTarget>().unwrap(), WindowTarget::Top);
        assert!("_window".parse::<WindowTarget>().is_err());
    }
}
