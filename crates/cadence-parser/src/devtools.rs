//! Import of Chrome DevTools recorder exports (`{title, steps: [...]}`).

use crate::action::{ActionSpec, ClickAction, GetAction, WaitAction};
use crate::block::{ActionBlock, PageScript, Playback, DEFAULT_BLOCK_LABEL};
use crate::coerce;
use crate::error::{ConfigError, ConfigResultExt};
use crate::pages::PagesConfig;
use crate::parser::ScriptParser;
use cadence_common::{InputSource, ReadyState, Timeout, WindowTarget};
use serde_json::{Map, Value};
use std::time::Duration;

const STEP_WAIT: Duration = Duration::from_secs(1);
const CLICK_TIMEOUT: Duration = Duration::from_secs(10);

enum Step {
    Navigate(String),
    Click(String),
    Ignored,
}

impl ScriptParser {
    /// Every imported step is followed by a one second wait.
    pub fn parse_devtools_recording(&self, value: &Value) -> Result<PagesConfig, ConfigError> {
        let Value::Object(map) = value else {
            return Err(ConfigError::new("Expected a DevTools recording dict"));
        };
        let title = map
            .get("title")
            .ok_or_else(|| ConfigError::new("Missing required field"))
            .and_then(coerce::non_empty_string)
            .at_key("title")?;
        let steps = match map.get("steps") {
            Some(Value::Array(steps)) => steps,
            _ => return Err(ConfigError::new("Expected a list of steps").prepend_key("steps")),
        };

        let mut actions = Vec::new();
        for (index, step) in steps.iter().enumerate() {
            let step = parse_step(step).at_index(index).at_key("steps")?;
            let action = match step {
                Step::Navigate(url) => ActionSpec::new(
                    actions.len(),
                    GetAction::new(url, Duration::ZERO, ReadyState::Complete, WindowTarget::SelfTarget)?,
                ),
                Step::Click(xpath) => ActionSpec::new(
                    actions.len(),
                    ClickAction::new(
                        InputSource::Script,
                        Some(xpath),
                        None,
                        false,
                        true,
                        Duration::ZERO,
                    )?,
                )
                .with_timeout(Timeout::Limited(CLICK_TIMEOUT)),
                Step::Ignored => continue,
            };
            actions.push(action);
            actions.push(ActionSpec::new(actions.len(), WaitAction::new(STEP_WAIT)?));
        }
        let block = ActionBlock::new(0, DEFAULT_BLOCK_LABEL, actions)?;
        let page = PageScript::new(Some(title), vec![block], None, Playback::ONCE)?;
        Ok(PagesConfig::new(vec![page])?)
    }
}

fn parse_step(step: &Value) -> Result<Step, ConfigError> {
    let Value::Object(step) = step else {
        return Err(ConfigError::new("Expected a step dict"));
    };
    let step_type = required_str(step, "type")?;
    match step_type.as_str() {
        "navigate" => {
            let url = required_str(step, "url")?;
            Ok(Step::Navigate(crate::urls::parse_fuzzy_url(&url).at_key("url")?))
        }
        "click" => {
            let xpath = step
                .get("selectors")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(Value::as_array)
                .flatten()
                .filter_map(Value::as_str)
                .find(|selector| selector.starts_with("xpath//"))
                .ok_or_else(|| {
                    ConfigError::new("Need xpath selector for click action").prepend_key("selectors")
                })?;
            Ok(Step::Click(xpath.to_string()))
        }
        "setViewport" => Ok(Step::Ignored),
        other => Err(ConfigError::new(format!("Unsupported step: {}", other)).prepend_key("type")),
    }
}

fn required_str(step: &Map<String, Value>, key: &str) -> Result<String, ConfigError> {
    step.get(key)
        .ok_or_else(|| ConfigError::new("Missing required field"))
        .and_then(coerce::non_empty_string)
        .at_key(key)
}
