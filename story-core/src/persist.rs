//! Session persistence for save/load functionality.
//!
//! A save file is the player's [`SessionState`] wrapped with a format
//! version and the story title, written as pretty JSON.

use crate::session::SessionState;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::fs;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current save file version.
const SAVE_VERSION: u32 = 1;

/// A saved session with everything needed to resume reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSession {
    /// Save format version for compatibility checking.
    pub version: u32,

    /// Title of the story at save time, for display only.
    #[serde(default)]
    pub story_title: Option<String>,

    pub session: SessionState,
}

impl SavedSession {
    pub fn new(session: SessionState, story_title: Option<String>) -> Self {
        Self {
            version: SAVE_VERSION,
            story_title,
            session,
        }
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path).await?;
        let saved: Self = serde_json::from_str(&content)?;
        if saved.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: saved.version,
            });
        }
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StoryId;
    use crate::session::Choice;
    use tempfile::tempdir;

    fn session() -> SessionState {
        SessionState {
            story: Some(StoryId(2)),
            chapter: 4,
            last_text: "The lantern gutters.\nA - Relight it\nB - Let it die".into(),
            last_choice: Some(Choice::B),
        }
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("save.json");

        let saved = SavedSession::new(session(), Some("The Lantern Keeper".into()));
        saved.save(&path).await.unwrap();

        let loaded = SavedSession::load(&path).await.unwrap();
        assert_eq!(loaded, saved);
    }

    #[tokio::test]
    async fn test_version_mismatch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("old.json");

        let mut saved = SavedSession::new(session(), None);
        saved.version = 99;
        saved.save(&path).await.unwrap();

        let err = SavedSession::load(&path).await.unwrap_err();
        assert!(matches!(
            err,
            PersistError::VersionMismatch { expected: 1, found: 99 }
        ));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = SavedSession::load("/no/such/save.json").await.unwrap_err();
        assert!(matches!(err, PersistError::Io(_)));
    }
}
