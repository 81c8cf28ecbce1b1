//! Turns heterogeneous configuration values into validated page scripts.
//!
//! Input is a `serde_json::Value` (YAML documents are converted first).
//! Errors carry the path of the innermost failing field, e.g.
//! `blocks[1].actions[2].duration`.

use crate::action::{
    ActionBody, ActionSpec, ClickAction, GetAction, ScriptAction, ScrollAction, SwipeAction, TextInputAction,
    WaitAction, WaitForElementAction,
};
use crate::block::{ActionBlock, PageScript, Playback, DEFAULT_BLOCK_LABEL};
use crate::coerce;
use crate::error::{ConfigError, ConfigResultExt};
use crate::presets;
use crate::schema::Fields;
use crate::source::{FsScriptResolver, ScriptResolver};
use crate::urls::parse_fuzzy_url;
use cadence_common::{parse_duration, ActionKind, InputSource, ReadyState, Timeout, WindowTarget};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

lazy_static! {
    static ref PLAYBACK_RE: Regex = Regex::new(r"^\s*(\d+)\s*x?\s*$").expect("valid regex");
}

pub struct ScriptParser {
    resolver: Arc<dyn ScriptResolver>,
}

impl Default for ScriptParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptParser {
    /// Script files are read relative to the working directory.
    pub fn new() -> Self {
        Self {
            resolver: Arc::new(FsScriptResolver::default()),
        }
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            resolver: Arc::new(FsScriptResolver::new(base_dir)),
        }
    }

    pub fn with_resolver(resolver: Arc<dyn ScriptResolver>) -> Self {
        Self { resolver }
    }

    // =========================================================================
    // Pages
    // =========================================================================

    /// Parses one page from any of its accepted shapes.
    ///
    /// * `"URL[,DURATION]"` or a preset name
    /// * a list of bare actions, or a list of blocks
    /// * a page dict with `blocks` (or `actions`, `url`, `urls`), `label`,
    ///   `login` and `playback`
    pub fn parse_page(&self, value: &Value) -> Result<PageScript, ConfigError> {
        self.parse_page_with_label(value, None)
    }

    pub fn parse_page_with_label(
        &self,
        value: &Value,
        label: Option<&str>,
    ) -> Result<PageScript, ConfigError> {
        match value {
            Value::String(s) => self.parse_page_str(s, label),
            Value::Array(_) => {
                let blocks = self.parse_blocks(value)?;
                Ok(PageScript::new(
                    label.map(str::to_string),
                    blocks,
                    None,
                    Playback::ONCE,
                )?)
            }
            Value::Object(map) if map.contains_key("pages") => Err(ConfigError::new(
                "Expected a single page, got a multi-page config with 'pages'",
            )),
            Value::Object(_) => self.parse_page_dict(value, label),
            other => Err(ConfigError::new(format!(
                "Expected a page as string, list or dict, got {}",
                other
            ))),
        }
    }

    /// Simple comma-separated page: `URL[,DURATION]`.
    pub fn parse_page_str(&self, value: &str, label: Option<&str>) -> Result<PageScript, ConfigError> {
        let (raw_url, raw_duration) = match value.rsplit_once(',') {
            Some((url, duration)) => (url.trim(), Some(duration.trim())),
            None => (value.trim(), None),
        };
        let mut duration = Duration::ZERO;
        let mut label = label.map(str::to_string);
        let url = match presets::lookup(raw_url) {
            Some(preset) => {
                duration = preset.duration;
                if label.is_none() {
                    label = Some(preset.name.to_string());
                }
                preset.url.to_string()
            }
            None => parse_fuzzy_url(raw_url).at_key("url")?,
        };
        if let Some(raw_duration) = raw_duration {
            duration = parse_duration(raw_duration)
                .map_err(|e| ConfigError::new(e.to_string()))
                .at_key("duration")?;
            if duration.is_zero() {
                return Err(ConfigError::new("Expected a non-zero duration").prepend_key("duration"));
            }
        }
        let get = GetAction::url_with_duration(url, duration)?;
        let block = ActionBlock::new(0, DEFAULT_BLOCK_LABEL, vec![ActionSpec::new(0, get)])?;
        Ok(PageScript::new(label, vec![block], None, Playback::ONCE)?)
    }

    fn parse_page_dict(&self, value: &Value, label: Option<&str>) -> Result<PageScript, ConfigError> {
        let mut fields = Fields::new(value, "page")?;
        let inner_label = fields.optional("label", &[], coerce::non_empty_string)?;
        let label = match (label, inner_label) {
            (Some(outer), Some(inner)) if outer != inner => {
                return Err(ConfigError::new(format!(
                    "Page label '{}' conflicts with its key '{}'",
                    inner, outer
                ))
                .prepend_key("label"));
            }
            (Some(outer), _) => Some(outer.to_string()),
            (None, inner) => inner,
        };
        let playback = fields.with_default("playback", &[], parse_playback, Playback::ONCE)?;
        let login = fields.optional("login", &[], |v| self.parse_login(v))?;
        let blocks = match fields.lookup("blocks", &["actions", "url", "urls"])? {
            Some((_, blocks)) => self.parse_blocks(blocks)?,
            None => {
                return Err(ConfigError::new("Missing required field").prepend_key("blocks"));
            }
        };
        fields.finish()?;
        Ok(PageScript::new(label, blocks, login, playback)?)
    }

    /// Login block from an action list or `{actions: [...]}`.
    pub fn parse_login(&self, value: &Value) -> Result<ActionBlock, ConfigError> {
        let actions = match value {
            Value::Object(_) => {
                let mut fields = Fields::new(value, "login")?;
                if let Some(label) = fields.optional("label", &[], coerce::non_empty_string)? {
                    if label != crate::block::LOGIN_LABEL {
                        return Err(ConfigError::new(format!(
                            "Login blocks are always labeled 'login', got '{}'",
                            label
                        ))
                        .prepend_key("label"));
                    }
                }
                let actions = match fields.lookup("actions", &[])? {
                    Some((key, actions)) => self.parse_actions(actions).at_key(key)?,
                    None => {
                        return Err(ConfigError::new("Missing required field").prepend_key("actions"));
                    }
                };
                fields.finish()?;
                actions
            }
            _ => self.parse_actions(value)?,
        };
        Ok(ActionBlock::login(actions)?)
    }

    // =========================================================================
    // Blocks
    // =========================================================================

    /// Parses the block list of a page.
    ///
    /// A list is read as bare actions of one default block if its first
    /// element is a string or has an `action` (or `type`) key, and as a list
    /// of blocks if the first element has a `label` or `actions` key. Only
    /// the first element decides. A dict maps block labels to blocks.
    pub fn parse_blocks(&self, value: &Value) -> Result<Vec<ActionBlock>, ConfigError> {
        match value {
            Value::Array(items) => {
                let Some(first) = items.first() else {
                    return Err(ConfigError::new("Expected a non-empty list of actions or blocks"));
                };
                if looks_like_action(first) {
                    debug!("Parsing {} bare actions as default block", items.len());
                    let actions = self.parse_actions(value).at_key("actions")?;
                    return Ok(vec![ActionBlock::new(0, DEFAULT_BLOCK_LABEL, actions)?]);
                }
                if !looks_like_block(first) {
                    return Err(ConfigError::new(
                        "Invalid data: Expected a list of either blocks or actions.",
                    ));
                }
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        self.parse_block(item, index, None)
                            .at_index(index)
                            .at_key("blocks")
                    })
                    .collect()
            }
            Value::Object(map) => {
                if map.is_empty() {
                    return Err(ConfigError::new("Expected a non-empty dict of blocks"));
                }
                map.iter()
                    .enumerate()
                    .map(|(index, (label, block))| {
                        self.parse_block(block, index, Some(label))
                            .at_key(label)
                            .at_key("blocks")
                    })
                    .collect()
            }
            Value::String(s) => {
                let page = self.parse_page_str(s, None)?;
                Ok(page.blocks().to_vec())
            }
            other => Err(ConfigError::new(format!(
                "Expected a list or dict of blocks, got {}",
                other
            ))),
        }
    }

    /// One block from an action list or a block dict.
    ///
    /// `label` is the key the block was found under, if any; an inner
    /// `label` field must agree with it.
    pub fn parse_block(
        &self,
        value: &Value,
        index: usize,
        label: Option<&str>,
    ) -> Result<ActionBlock, ConfigError> {
        match value {
            Value::Array(_) => {
                let actions = self.parse_actions(value).at_key("actions")?;
                Ok(ActionBlock::new(
                    index,
                    label.unwrap_or(DEFAULT_BLOCK_LABEL),
                    actions,
                )?)
            }
            Value::Object(_) => {
                let mut fields = Fields::new(value, "block")?;
                let inner_label = fields.optional("label", &[], coerce::string)?;
                let label = match (label, inner_label) {
                    (Some(outer), Some(inner)) if !inner.is_empty() && inner != outer => {
                        return Err(ConfigError::new(format!(
                            "ActionBlock inside a dict cannot have a 'label' property, but got label='{}'",
                            inner
                        ))
                        .prepend_key("label"));
                    }
                    (Some(outer), _) => outer.to_string(),
                    (None, Some(inner)) if !inner.is_empty() => inner,
                    (None, _) => DEFAULT_BLOCK_LABEL.to_string(),
                };
                if let Some(explicit) = fields.optional("index", &[], coerce::non_negative_int)? {
                    if explicit as usize != index {
                        return Err(ConfigError::new(format!(
                            "Block index should be {}, but got {}",
                            index, explicit
                        ))
                        .prepend_key("index"));
                    }
                }
                let actions = match fields.lookup("actions", &[])? {
                    Some((key, actions)) => self.parse_actions(actions).at_key(key)?,
                    None => {
                        return Err(ConfigError::new("Missing required field").prepend_key("actions"));
                    }
                };
                fields.finish()?;
                Ok(ActionBlock::new(index, label, actions)?)
            }
            other => Err(ConfigError::new(format!(
                "Expected a block as list or dict, got {}",
                other
            ))),
        }
    }

    // =========================================================================
    // Actions
    // =========================================================================

    pub fn parse_actions(&self, value: &Value) -> Result<Vec<ActionSpec>, ConfigError> {
        let Value::Array(items) = value else {
            return Err(ConfigError::new("Expected a list of actions"));
        };
        if items.is_empty() {
            return Err(ConfigError::new("Expected a non-empty list of actions"));
        }
        items
            .iter()
            .enumerate()
            .map(|(index, item)| self.parse_action(item, index).at_index(index))
            .collect()
    }

    /// Parses one action at position `index` of its block.
    ///
    /// A string is a `get` action, `URL` or `URL,DURATION`.
    pub fn parse_action(&self, value: &Value, index: usize) -> Result<ActionSpec, ConfigError> {
        match value {
            Value::String(s) => self.parse_action_str(s, index),
            Value::Object(_) => self.parse_action_dict(value, index),
            other => Err(ConfigError::new(format!(
                "Expected an action as string or dict, got {}",
                other
            ))),
        }
    }

    fn parse_action_str(&self, value: &str, index: usize) -> Result<ActionSpec, ConfigError> {
        let (url, duration) = match value.rsplit_once(',') {
            Some((url, tail)) => match parse_duration(tail) {
                Ok(duration) => (url, duration),
                Err(_) => (value, Duration::ZERO),
            },
            None => (value, Duration::ZERO),
        };
        let url = parse_fuzzy_url(url).at_key("url")?;
        Ok(ActionSpec::new(index, GetAction::url_with_duration(url, duration)?))
    }

    fn parse_action_dict(&self, value: &Value, index: usize) -> Result<ActionSpec, ConfigError> {
        let mut fields = Fields::new(value, "action")?;
        let kind: ActionKind = fields.required("action", &["type"], coerce::variant)?;
        let parsed = self
            .parse_action_fields(kind, &mut fields, index)
            .and_then(|action| {
                fields.finish()?;
                Ok(action)
            });
        parsed.with_note(|| format!("parsing {{action: \"{}\", ...}}", kind))
    }

    fn parse_action_fields(
        &self,
        kind: ActionKind,
        fields: &mut Fields<'_>,
        index: usize,
    ) -> Result<ActionSpec, ConfigError> {
        if let Some(explicit) = fields.optional("index", &[], coerce::non_negative_int)? {
            if explicit as usize != index {
                return Err(ConfigError::new(format!(
                    "Action index should be {}, but got {}",
                    index, explicit
                ))
                .prepend_key("index"));
            }
        }
        let timeout = fields.nullable_with_default("timeout", &[], coerce::timeout, Timeout::DEFAULT)?;
        let action = match kind {
            ActionKind::Get => {
                let url = fields.required("url", &[], coerce::fuzzy_url)?;
                let duration = fields.with_default("duration", &[], coerce::duration, Duration::ZERO)?;
                let ready_state =
                    fields.with_default("ready_state", &["readyState"], coerce::variant, ReadyState::Any)?;
                let target =
                    fields.with_default("target", &[], coerce::variant, WindowTarget::SelfTarget)?;
                ActionSpec::new(index, GetAction::new(url, duration, ready_state, target)?)
            }
            ActionKind::Wait => {
                let duration = fields.required("duration", &[], coerce::non_zero_duration)?;
                ActionSpec::new(index, WaitAction::new(duration)?)
            }
            ActionKind::Scroll => {
                let source = fields.with_default("source", &[], coerce::variant, InputSource::Script)?;
                let distance =
                    fields.with_default("distance", &[], coerce::float, ScrollAction::DEFAULT_DISTANCE)?;
                let duration = fields.with_default(
                    "duration",
                    &[],
                    coerce::non_zero_duration,
                    ScrollAction::DEFAULT_DURATION,
                )?;
                let selector = fields.optional("selector", &[], coerce::non_empty_string)?;
                let required = fields.with_default("required", &[], coerce::boolean, false)?;
                ActionSpec::new(
                    index,
                    ScrollAction::new(source, distance, duration, selector, required)?,
                )
            }
            ActionKind::Click => {
                let source = fields.with_default("source", &[], coerce::variant, InputSource::Script)?;
                let selector = fields.optional("selector", &[], coerce::non_empty_string)?;
                let x = fields.optional("x", &[], coerce::non_negative_int)?;
                let y = fields.optional("y", &[], coerce::non_negative_int)?;
                let coordinates = match (x, y) {
                    (Some(x), Some(y)) => Some((x, y)),
                    (None, None) => None,
                    (Some(_), None) => {
                        return Err(ConfigError::new("Missing 'y' coordinate").prepend_key("y"));
                    }
                    (None, Some(_)) => {
                        return Err(ConfigError::new("Missing 'x' coordinate").prepend_key("x"));
                    }
                };
                let required = fields.with_default("required", &[], coerce::boolean, false)?;
                let scroll_into_view = fields.with_default(
                    "scroll_into_view",
                    &["scrollIntoView"],
                    coerce::boolean,
                    false,
                )?;
                let duration = fields.with_default("duration", &[], coerce::duration, Duration::ZERO)?;
                ActionSpec::new(
                    index,
                    ClickAction::new(
                        source,
                        selector,
                        coordinates,
                        required,
                        scroll_into_view,
                        duration,
                    )?,
                )
            }
            ActionKind::Swipe => {
                let start_x = fields.required("start_x", &["startx"], coerce::int)?;
                let start_y = fields.required("start_y", &["starty"], coerce::int)?;
                let end_x = fields.required("end_x", &["endx"], coerce::int)?;
                let end_y = fields.required("end_y", &["endy"], coerce::int)?;
                let duration = fields.with_default(
                    "duration",
                    &[],
                    coerce::non_zero_duration,
                    SwipeAction::DEFAULT_DURATION,
                )?;
                ActionSpec::new(
                    index,
                    SwipeAction::new((start_x, start_y), (end_x, end_y), duration)?,
                )
            }
            ActionKind::TextInput => {
                let source = fields.with_default("source", &[], coerce::variant, InputSource::Script)?;
                let text = fields.required("text", &[], coerce::non_empty_string)?;
                let duration = fields.with_default("duration", &[], coerce::duration, Duration::ZERO)?;
                ActionSpec::new(index, TextInputAction::new(source, text, duration)?)
            }
            ActionKind::WaitForElement => {
                let selector = fields.required("selector", &[], coerce::non_empty_string)?;
                ActionSpec::new(index, WaitForElementAction::new(selector)?)
            }
            ActionKind::RunScript => {
                ActionSpec::new(index, ActionBody::RunScript(self.parse_script(fields)?))
            }
            ActionKind::InjectDocumentScript => ActionSpec::new(
                index,
                ActionBody::InjectDocumentScript(self.parse_script(fields)?),
            ),
            ActionKind::Screenshot => ActionSpec::new(index, ActionBody::Screenshot),
        };
        Ok(action.with_timeout(timeout))
    }

    fn parse_script(&self, fields: &mut Fields<'_>) -> Result<ScriptAction, ConfigError> {
        let script = fields.optional("script", &[], coerce::string)?;
        let script_path = fields
            .optional("script_path", &["path"], coerce::non_empty_string)?
            .map(PathBuf::from);
        let replacements = fields
            .optional("replacements", &["replace"], coerce::replacements)?
            .unwrap_or_default();
        Ok(ScriptAction::new(
            script,
            script_path,
            replacements,
            self.resolver.as_ref(),
        )?)
    }
}

fn looks_like_action(value: &Value) -> bool {
    match value {
        Value::String(_) => true,
        Value::Object(map) => map.contains_key("action") || map.contains_key("type"),
        _ => false,
    }
}

fn looks_like_block(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.contains_key("label") || map.contains_key("actions"),
        _ => false,
    }
}

/// Repetition count: `3`, `"3"` or `"3x"`.
pub fn parse_playback(value: &Value) -> Result<Playback, ConfigError> {
    let count = match value {
        Value::Number(_) => coerce::positive_int(value)?,
        Value::String(s) => {
            let captures = PLAYBACK_RE
                .captures(s)
                .ok_or_else(|| ConfigError::new(format!("Invalid playback '{}', expected N or Nx", s)))?;
            captures[1]
                .parse::<u32>()
                .map_err(|e| ConfigError::new(format!("Invalid playback '{}': {}", s, e)))?
        }
        other => {
            return Err(ConfigError::new(format!(
                "Invalid playback {}, expected N or Nx",
                other
            )));
        }
    };
    Ok(Playback::repeat(count)?)
}
