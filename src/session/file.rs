use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{Session, SessionStore};

/// Stores the session as a JSON file.
///
/// ```json
/// {
///   "user_id": "S001",
///   "user_name": "Asha Rao",
///   "role": "student",
///   "logged_in_at": "2024-07-01T09:00:00Z"
/// }
/// ```
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read session file '{}'", self.path.display()))?;
        let session = serde_json::from_str(&content)
            .with_context(|| format!("corrupt session file '{}'", self.path.display()))?;
        Ok(Some(session))
    }

    fn save(&self, session: &Session) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(session)?)
            .with_context(|| format!("failed to write session file '{}'", self.path.display()))?;
        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
