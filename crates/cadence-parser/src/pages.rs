use crate::block::PageScript;
use crate::coerce;
use crate::error::{ConfigError, ConfigResultExt, LoadError, ValidationError};
use crate::parser::ScriptParser;
use crate::schema::Fields;
use cadence_common::parse_duration;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

/// All pages of one configuration, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagesConfig {
    pages: Vec<PageScript>,
}

impl PagesConfig {
    pub fn new(pages: Vec<PageScript>) -> Result<Self, ValidationError> {
        if pages.is_empty() {
            return Err(ValidationError::field("pages", "Got empty page list"));
        }
        Ok(Self { pages })
    }

    pub fn pages(&self) -> &[PageScript] {
        &self.pages
    }

    pub fn into_pages(self) -> Vec<PageScript> {
        self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

const LIST_EXTENSIONS: [&str; 2] = ["txt", "list"];

/// Reads a pages file.
///
/// `.txt` and `.list` files hold one `URL[,DURATION]` page per line. Every
/// other file is parsed as YAML, which includes JSON. Script paths inside the
/// file resolve against its directory.
pub fn load_pages_file(path: &Path) -> Result<PagesConfig, LoadError> {
    let text = std::fs::read_to_string(path)?;
    let parser = match path.parent() {
        Some(dir) => ScriptParser::with_base_dir(dir),
        None => ScriptParser::new(),
    };
    let is_list = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| LIST_EXTENSIONS.contains(&ext));
    let pages = if is_list {
        parser.parse_page_lines(&text)?
    } else {
        let value: Value = serde_yaml::from_str(&text)?;
        parser.parse_config(&value)?
    };
    info!("Loaded {} page(s) from {}", pages.len(), path.display());
    Ok(pages)
}

impl ScriptParser {
    /// Parses a complete configuration document.
    ///
    /// * `"URL[,DURATION],URL,..."`
    /// * a list of `"URL[,DURATION]"` strings
    /// * `{pages: {LABEL: PAGE, ...}}` or `{pages: [STRING, ...]}`
    /// * a DevTools recording `{title, steps}`
    /// * anything [`ScriptParser::parse_page`] accepts, as a single page
    pub fn parse_config(&self, value: &Value) -> Result<PagesConfig, ConfigError> {
        match value {
            Value::String(s) => self.parse_pages_str(s),
            Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_string) => {
                self.parse_page_strings(items)
            }
            Value::Object(map) if map.contains_key("pages") => self.parse_pages_dict(value),
            Value::Object(map) if map.contains_key("steps") && map.contains_key("title") => {
                self.parse_devtools_recording(value)
            }
            _ => Ok(PagesConfig::new(vec![self.parse_page(value)?])?),
        }
    }

    /// Comma-separated pages; a duration may only follow a URL.
    pub fn parse_pages_str(&self, value: &str) -> Result<PagesConfig, ConfigError> {
        let mut entries: Vec<String> = Vec::new();
        let mut previous_is_url = false;
        for part in value.trim().split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(ConfigError::new(format!(
                    "Expected a url or duration, got an empty entry in '{}'",
                    value
                )));
            }
            match parse_duration(part) {
                Ok(_) => {
                    let Some(last) = entries.last_mut().filter(|_| previous_is_url) else {
                        return Err(ConfigError::new(format!(
                            "Duration can only follow after url. Current value: '{}'",
                            part
                        )));
                    };
                    last.push(',');
                    last.push_str(part);
                    previous_is_url = false;
                }
                Err(_) => {
                    entries.push(part.to_string());
                    previous_is_url = true;
                }
            }
        }
        let items: Vec<Value> = entries.into_iter().map(Value::String).collect();
        self.parse_page_strings(&items)
    }

    fn parse_page_strings(&self, items: &[Value]) -> Result<PagesConfig, ConfigError> {
        if items.is_empty() {
            return Err(ConfigError::new("Got empty page list"));
        }
        let pages = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                coerce::non_empty_string(item)
                    .and_then(|s| self.parse_page_str(&s, None))
                    .at_index(index)
                    .at_key("pages")
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PagesConfig::new(pages)?)
    }

    fn parse_pages_dict(&self, value: &Value) -> Result<PagesConfig, ConfigError> {
        let mut fields = Fields::new(value, "pages config")?;
        let pages = match fields.lookup("pages", &[])? {
            Some((_, Value::Object(map))) => {
                if map.is_empty() {
                    return Err(ConfigError::new("Expected a non-empty dict of pages").prepend_key("pages"));
                }
                let pages = map
                    .iter()
                    .map(|(label, page)| {
                        self.parse_page_with_label(page, Some(label))
                            .with_note(|| format!("parsing story '{}'", label))
                            .at_key(label)
                            .at_key("pages")
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                PagesConfig::new(pages)?
            }
            Some((_, Value::Array(items))) => self.parse_page_strings(items)?,
            Some((_, Value::String(s))) => self.parse_page_strings(&[Value::String(s.clone())])?,
            Some((key, other)) => {
                return Err(ConfigError::new(format!(
                    "Expected a dict or list of pages, got {}",
                    other
                ))
                .prepend_key(key));
            }
            None => return Err(ConfigError::new("Config does not provide a 'pages' dict.")),
        };
        fields.finish()?;
        Ok(pages)
    }

    /// One `URL[,DURATION]` page per non-empty line.
    pub fn parse_page_lines(&self, text: &str) -> Result<PagesConfig, ConfigError> {
        let mut pages = Vec::new();
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                warn!("Skipping empty line {}", number + 1);
                continue;
            }
            let page = self
                .parse_page_str(line, None)
                .with_note(|| format!("parsing line {}", number + 1))?;
            pages.push(page);
        }
        Ok(PagesConfig::new(pages)?)
    }
}
