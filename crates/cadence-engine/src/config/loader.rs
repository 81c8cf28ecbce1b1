use super::schema::CadenceConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Names a settings file that replaces the search below.
pub const CONFIG_ENV: &str = "CADENCE_CONFIG";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from `$CADENCE_CONFIG` if set, otherwise the first existing file
    /// of [`ConfigLoader::search_paths`], otherwise defaults.
    ///
    /// A path named by the environment must exist.
    pub async fn load_default() -> Result<CadenceConfig, ConfigLoadError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::load_from(Path::new(&path)).await;
        }
        for path in Self::search_paths(dirs::home_dir()) {
            if path.exists() {
                return Self::load_from(&path).await;
            }
        }
        Ok(CadenceConfig::default())
    }

    /// `./cadence.yaml`, then `<home>/.cadence/config.yaml`.
    pub fn search_paths(home: Option<PathBuf>) -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./cadence.yaml")];
        if let Some(home) = home {
            paths.push(home.join(".cadence").join("config.yaml"));
        }
        paths
    }

    pub async fn load_from(path: &Path) -> Result<CadenceConfig, ConfigLoadError> {
        let content = tokio::fs::read_to_string(path).await?;
        if content.trim().is_empty() {
            return Ok(CadenceConfig::default());
        }
        let config: CadenceConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}
