use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Receives soft warnings and screenshots produced while a script runs.
#[async_trait]
pub trait DiagnosticsSink: Send + Sync {
    fn warning(&self, message: &str);

    /// Persist a PNG under `file_name` and return where it went.
    async fn store_screenshot(&self, file_name: &str, png: Vec<u8>) -> std::io::Result<PathBuf>;
}

/// Writes screenshots to `<root>/screenshot/` and keeps warnings in memory.
#[derive(Debug)]
pub struct OutputDir {
    root: PathBuf,
    warnings: Mutex<Vec<String>>,
}

impl OutputDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            warnings: Mutex::new(Vec::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn screenshot_dir(&self) -> PathBuf {
        self.root.join("screenshot")
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl DiagnosticsSink for OutputDir {
    fn warning(&self, message: &str) {
        self.warnings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message.to_string());
    }

    async fn store_screenshot(&self, file_name: &str, png: Vec<u8>) -> std::io::Result<PathBuf> {
        let dir = self.screenshot_dir();
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(file_name);
        tokio::fs::write(&path, png).await?;
        debug!("Stored screenshot {}", path.display());
        Ok(path)
    }
}

/// Keeps everything in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    warnings: Mutex<Vec<String>>,
    screenshots: Mutex<Vec<(String, usize)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// File names and byte sizes of the stored screenshots, in order.
    pub fn screenshots(&self) -> Vec<(String, usize)> {
        self.screenshots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl DiagnosticsSink for RecordingSink {
    fn warning(&self, message: &str) {
        self.warnings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message.to_string());
    }

    async fn store_screenshot(&self, file_name: &str, png: Vec<u8>) -> std::io::Result<PathBuf> {
        self.screenshots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((file_name.to_string(), png.len()));
        Ok(PathBuf::from(file_name))
    }
}
