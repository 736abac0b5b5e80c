use crate::error::KabuError;
use std::fs;
use std::path::{Path, PathBuf};

/// Well-known filename of the single script slot.
pub const DEFAULT_SCRIPT_FILE: &str = "stock_analysis.py";

/// Single-slot persistence for the current analysis script.
///
/// Saving replaces the whole slot. There is no history, no locking and no
/// content validation; syntactically broken code fails at execution time.
#[derive(Debug, Clone)]
pub struct ScriptStore {
    path: PathBuf,
}

impl ScriptStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store rooted in `dir` with the default slot filename.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(DEFAULT_SCRIPT_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn save(&self, content: &str) -> Result<(), KabuError> {
        fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn load(&self) -> Result<String, KabuError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(KabuError::ScriptNotFound(self.path.display().to_string()))
            }
            Err(e) => Err(KabuError::IoError(e)),
        }
    }
}
