pub mod action;
pub mod block;
pub mod coerce;
pub mod devtools;
pub mod error;
pub mod pages;
pub mod parser;
pub mod presets;
pub mod schema;
pub mod source;
pub mod urls;

pub use action::{
    ActionBody, ActionSpec, ClickAction, ClickTarget, GetAction, ScriptAction, ScrollAction,
    SwipeAction, TextInputAction, WaitAction, WaitForElementAction,
};
pub use block::{ActionBlock, BlockKind, PageScript, Playback, DEFAULT_BLOCK_LABEL, LOGIN_LABEL};
pub use error::{ConfigError, ConfigResultExt, LoadError, PathSegment, ValidationError};
pub use pages::{load_pages_file, PagesConfig};
pub use parser::{parse_playback, ScriptParser};
pub use source::{FsScriptResolver, ScriptResolver};
pub use urls::{parse_fuzzy_url, url_label};

use serde_json::Value;

/// Parses a single page with the default script resolver.
pub fn parse_page(value: &Value) -> Result<PageScript, ConfigError> {
    ScriptParser::new().parse_page(value)
}

/// Parses a YAML or JSON document holding one or more pages.
pub fn parse_config_str(text: &str) -> Result<PagesConfig, LoadError> {
    let value: Value = serde_yaml::from_str(text)?;
    Ok(ScriptParser::new().parse_config(&value)?)
}
