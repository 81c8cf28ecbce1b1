use crate::action::{ActionBody, ActionSpec};
use crate::error::ValidationError;
use crate::urls::url_label;
use cadence_common::ActionKind;
use serde::{Serialize, Serializer};
use std::time::Duration;

pub const DEFAULT_BLOCK_LABEL: &str = "default";
pub const LOGIN_LABEL: &str = "login";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Regular,
    /// Always index 0, labeled `login`, run once before repetitions.
    Login,
}

/// Ordered, labeled group of actions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionBlock {
    #[serde(skip)]
    kind: BlockKind,
    label: String,
    index: usize,
    actions: Vec<ActionSpec>,
}

fn check_actions(actions: &[ActionSpec]) -> Result<(), ValidationError> {
    if actions.is_empty() {
        return Err(ValidationError::field("actions", "Invalid block without actions"));
    }
    for (position, action) in actions.iter().enumerate() {
        if action.index() != position {
            return Err(ValidationError::field(
                "actions",
                format!(
                    "actions[{}].index should be {}, but got {}",
                    position,
                    position,
                    action.index()
                ),
            ));
        }
    }
    Ok(())
}

impl ActionBlock {
    pub fn new(
        index: usize,
        label: impl Into<String>,
        actions: Vec<ActionSpec>,
    ) -> Result<Self, ValidationError> {
        let label = label.into();
        if label.is_empty() {
            return Err(ValidationError::field("label", "Expected a non-empty label"));
        }
        if label == LOGIN_LABEL {
            return Err(ValidationError::field(
                "label",
                format!("Block label '{}' is reserved for login blocks", LOGIN_LABEL),
            ));
        }
        check_actions(&actions)?;
        Ok(Self {
            kind: BlockKind::Regular,
            label,
            index,
            actions,
        })
    }

    pub fn login(actions: Vec<ActionSpec>) -> Result<Self, ValidationError> {
        check_actions(&actions)?;
        Ok(Self {
            kind: BlockKind::Login,
            label: LOGIN_LABEL.to_string(),
            index: 0,
            actions,
        })
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn is_login(&self) -> bool {
        self.kind == BlockKind::Login
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn actions(&self) -> &[ActionSpec] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn duration(&self) -> Duration {
        self.actions.iter().map(ActionSpec::duration).sum()
    }

    pub fn has_get(&self) -> bool {
        self.actions.iter().any(|a| a.kind() == ActionKind::Get)
    }
}

/// Number of times a page script is played back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Playback(u32);

impl Playback {
    pub const ONCE: Playback = Playback(1);

    pub fn repeat(count: u32) -> Result<Self, ValidationError> {
        if count == 0 {
            return Err(ValidationError::field("playback", "Expected at least one repetition"));
        }
        Ok(Self(count))
    }

    pub fn count(&self) -> u32 {
        self.0
    }
}

impl Default for Playback {
    fn default() -> Self {
        Playback::ONCE
    }
}

impl Serialize for Playback {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{}x", self.0))
    }
}

/// The validated program for one page: optional login plus ordinary blocks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageScript {
    label: String,
    playback: Playback,
    #[serde(skip_serializing_if = "Option::is_none")]
    login: Option<ActionBlock>,
    blocks: Vec<ActionBlock>,
}

impl PageScript {
    /// `label` falls back to [`url_label`] of the first URL when absent.
    pub fn new(
        label: Option<String>,
        blocks: Vec<ActionBlock>,
        login: Option<ActionBlock>,
        playback: Playback,
    ) -> Result<Self, ValidationError> {
        if blocks.is_empty() {
            return Err(ValidationError::field("blocks", "Missing action blocks"));
        }
        let mut found_get = false;
        for (position, block) in blocks.iter().enumerate() {
            if block.is_login() {
                return Err(ValidationError::field(
                    "blocks",
                    "No login blocks allowed as normal action block",
                ));
            }
            if block.index() != position {
                return Err(ValidationError::field(
                    "blocks",
                    format!(
                        "blocks[{}].index should be {}, but got {}",
                        position,
                        position,
                        block.index()
                    ),
                ));
            }
            found_get |= block.has_get();
        }
        if !found_get {
            return Err(ValidationError::field(
                "blocks",
                "Expected at least one get action in one of the blocks",
            ));
        }
        if let Some(login) = &login {
            if !login.is_login() {
                return Err(ValidationError::field("login", "Expected a login block"));
            }
        }
        let mut script = Self {
            label: String::new(),
            playback,
            login,
            blocks,
        };
        script.label = match label {
            Some(label) if !label.is_empty() => label,
            Some(_) => {
                return Err(ValidationError::field("label", "Expected a non-empty label"));
            }
            None => script.first_url().map(url_label).unwrap_or_default(),
        };
        Ok(script)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn playback(&self) -> Playback {
        self.playback
    }

    pub fn login(&self) -> Option<&ActionBlock> {
        self.login.as_ref()
    }

    pub fn blocks(&self) -> &[ActionBlock] {
        &self.blocks
    }

    pub fn actions(&self) -> impl Iterator<Item = &ActionSpec> {
        self.blocks.iter().flat_map(|block| block.actions().iter())
    }

    /// Total nominal duration of the ordinary blocks.
    pub fn duration(&self) -> Duration {
        self.blocks.iter().map(ActionBlock::duration).sum()
    }

    pub fn first_url(&self) -> Option<&str> {
        self.actions().find_map(|action| match action.body() {
            ActionBody::Get(get) => Some(get.url()),
            _ => None,
        })
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        if !label.is_empty() {
            self.label = label;
        }
        self
    }

    pub fn with_playback(mut self, playback: Playback) -> Self {
        self.playback = playback;
        self
    }
}
