//! Persistent session-token storage.
//!
//! The backend hands out an opaque bearer token at login; it lives in a
//! single token file in the user data directory, is read on every
//! authenticated request and cleared on logout or on any unauthorized
//! response.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::debug;

/// File name the token is stored under, fixed across versions.
pub const TOKEN_FILE: &str = "token";

const APP_DIR: &str = "arradm";

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("no user data directory available on this system")]
    NoDataDir,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store rooted at the platform's user data directory.
    pub fn new() -> Result<Self, SessionStoreError> {
        let dir = dirs::data_dir()
            .ok_or(SessionStoreError::NoDataDir)?
            .join(APP_DIR);
        Ok(Self::at(dir))
    }

    /// Store rooted at an explicit directory.
    pub fn at(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(TOKEN_FILE),
        }
    }

    pub fn save(&self, token: &str) -> Result<(), SessionStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)?;
        debug!(path = %self.path.display(), "session token saved");
        Ok(())
    }

    /// Returns the stored token, if a non-empty one exists.
    pub fn load(&self) -> Option<String> {
        let token = fs::read_to_string(&self.path).ok()?;
        let token = token.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }

    pub fn clear(&self) -> Result<(), SessionStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "session token cleared");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_load_clear_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path());

        assert_eq!(store.load(), None);
        store.save("tok-123").unwrap();
        assert_eq!(store.load().as_deref(), Some("tok-123"));
        store.clear().unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path());
        store.clear().unwrap();
        store.clear().unwrap();
    }

    #[test]
    fn whitespace_only_token_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path());
        store.save("  \n").unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn token_is_trimmed_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path());
        store.save("tok-456\n").unwrap();
        assert_eq!(store.load().as_deref(), Some("tok-456"));
    }
}
