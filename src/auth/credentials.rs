//! Persistent storage for the access/refresh token pair.
//!
//! The pair is written as a single JSON document so both fields land
//! together; there is no observable state where only one field has been
//! updated. A document missing either field invalidates the whole pair.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::session::TokenPair;

/// Credentials file name in the storage directory
const CREDENTIALS_FILE: &str = "credentials.json";

/// Application name used for the default storage directory
const APP_NAME: &str = "wheeldrop";

/// On-disk shape. Fields are optional so a truncated or hand-edited file
/// degrades to "logged out" instead of failing the load.
#[derive(Debug, Serialize, Deserialize)]
struct StoredCredentials {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

/// File-backed store for the current token pair.
///
/// Pure storage: no network access and no session logic. `SessionManager`
/// is the only writer.
#[derive(Debug)]
pub struct CredentialStore {
    storage_dir: PathBuf,
}

impl CredentialStore {
    pub fn new(storage_dir: PathBuf) -> Self {
        Self { storage_dir }
    }

    /// Store under the platform data directory, e.g.
    /// `~/.local/share/wheeldrop` on Linux.
    pub fn at_default_location() -> Result<Self> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find user data directory"))?;
        Ok(Self::new(data_dir.join(APP_NAME)))
    }

    /// Read the persisted pair. Returns `None` when the file is absent,
    /// unparseable, or either token is missing or empty - never a
    /// half-filled pair.
    pub fn load(&self) -> Result<Option<TokenPair>> {
        let path = self.credentials_path();
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .context("Failed to read credentials file")?;
        let stored: StoredCredentials = match serde_json::from_str(&contents) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Credentials file is not valid JSON, treating as logged out");
                return Ok(None);
            }
        };

        match (stored.access_token, stored.refresh_token) {
            (Some(access), Some(refresh)) if !access.is_empty() && !refresh.is_empty() => {
                Ok(Some(TokenPair {
                    access_token: access,
                    refresh_token: refresh,
                }))
            }
            _ => {
                warn!("Credentials file is missing a token, treating as logged out");
                Ok(None)
            }
        }
    }

    /// Persist both tokens in one write.
    pub fn save(&self, pair: &TokenPair) -> Result<()> {
        let path = self.credentials_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create credentials directory")?;
        }
        let stored = StoredCredentials {
            access_token: Some(pair.access_token.clone()),
            refresh_token: Some(pair.refresh_token.clone()),
        };
        let contents = serde_json::to_string_pretty(&stored)?;
        std::fs::write(path, contents).context("Failed to write credentials file")?;
        Ok(())
    }

    /// Remove the persisted pair.
    pub fn clear(&self) -> Result<()> {
        let path = self.credentials_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove credentials file")?;
        }
        Ok(())
    }

    fn credentials_path(&self) -> PathBuf {
        self.storage_dir.join(CREDENTIALS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> TokenPair {
        TokenPair {
            access_token: "access-A".to_string(),
            refresh_token: "refresh-B".to_string(),
        }
    }

    #[test]
    fn test_round_trip_preserves_pair() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CredentialStore::new(dir.path().to_path_buf());

        store.save(&pair()).expect("save should succeed");

        // A fresh store over the same directory simulates a restart.
        let reopened = CredentialStore::new(dir.path().to_path_buf());
        let loaded = reopened.load().expect("load should succeed");
        assert_eq!(loaded, Some(pair()));
    }

    #[test]
    fn test_load_missing_file_returns_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CredentialStore::new(dir.path().to_path_buf());
        assert_eq!(store.load().expect("load should succeed"), None);
    }

    #[test]
    fn test_partial_pair_is_invalid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CredentialStore::new(dir.path().to_path_buf());

        std::fs::write(
            dir.path().join(CREDENTIALS_FILE),
            r#"{"access_token": "only-half"}"#,
        )
        .expect("write");

        assert_eq!(store.load().expect("load should succeed"), None);
    }

    #[test]
    fn test_empty_token_is_invalid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CredentialStore::new(dir.path().to_path_buf());

        std::fs::write(
            dir.path().join(CREDENTIALS_FILE),
            r#"{"access_token": "", "refresh_token": "refresh-B"}"#,
        )
        .expect("write");

        assert_eq!(store.load().expect("load should succeed"), None);
    }

    #[test]
    fn test_garbage_file_is_invalid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CredentialStore::new(dir.path().to_path_buf());

        std::fs::write(dir.path().join(CREDENTIALS_FILE), "not json").expect("write");

        assert_eq!(store.load().expect("load should succeed"), None);
    }

    #[test]
    fn test_clear_removes_both_tokens() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CredentialStore::new(dir.path().to_path_buf());

        store.save(&pair()).expect("save");
        store.clear().expect("clear");

        assert_eq!(store.load().expect("load should succeed"), None);
        // Clearing an already-empty store is fine.
        store.clear().expect("second clear");
    }

    #[test]
    fn test_save_replaces_previous_pair() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CredentialStore::new(dir.path().to_path_buf());

        store.save(&pair()).expect("save");
        let rotated = TokenPair {
            access_token: "access-C".to_string(),
            refresh_token: "refresh-D".to_string(),
        };
        store.save(&rotated).expect("save rotated");

        assert_eq!(store.load().expect("load"), Some(rotated));
    }
}
