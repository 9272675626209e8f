use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::Session;

/// Keeps the session token in a single file between runs.
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the stored session, if any. A token that no longer decodes is
    /// deleted and treated as logged out.
    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let token = fs::read_to_string(&self.path)
            .with_context(|| format!("reading token from {}", self.path.display()))?;

        match Session::from_token(&token) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Discarding unreadable session token");
                self.clear()?;
                Ok(None)
            }
        }
    }

    /// Validates and writes `token`, returning the session it opens.
    pub fn save(&self, token: &str) -> Result<Session> {
        let session = Session::from_token(token)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, &session.token)
            .with_context(|| format!("writing token to {}", self.path.display()))?;
        debug!(path = %self.path.display(), "Session token stored");
        Ok(session)
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
