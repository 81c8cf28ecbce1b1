use std::path::{Path, PathBuf};

/// Loads script bodies referenced by `script_path`.
pub trait ScriptResolver: Send + Sync {
    fn read_script(&self, path: &Path) -> std::io::Result<String>;
}

/// Reads scripts from disk, relative paths resolved against `base_dir`.
#[derive(Debug, Clone, Default)]
pub struct FsScriptResolver {
    base_dir: Option<PathBuf>,
}

impl FsScriptResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ScriptResolver for FsScriptResolver {
    fn read_script(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(self.resolve(path))
    }
}
