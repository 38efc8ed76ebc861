//! Token stores.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// Key the token is stored under.
const TOKEN_KEY: &str = "token";

/// Errors reading or writing persisted session state.
#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("token store I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("token store is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable key-value slot for the session token.
pub trait TokenStore: Send + Sync {
    /// The persisted token, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn load(&self) -> Result<Option<SecretString>, TokenStoreError>;

    /// Persist `token`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn save(&self, token: &SecretString) -> Result<(), TokenStoreError>;

    /// Remove the persisted token. Clearing an empty store is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn clear(&self) -> Result<(), TokenStoreError>;
}

// =============================================================================
// FileTokenStore
// =============================================================================

/// Token kept under the `"token"` key of a small JSON file.
///
/// Other keys in the file are preserved. The file is removed once it no
/// longer holds anything.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Map<String, Value>, TokenStoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    /// Entries to rewrite, and whether the file was unreadable JSON.
    ///
    /// A corrupt file is replaced on the next write rather than blocking
    /// every later save and clear.
    fn entries_for_write(&self) -> Result<(Map<String, Value>, bool), TokenStoreError> {
        match self.read_entries() {
            Ok(entries) => Ok((entries, false)),
            Err(TokenStoreError::Json(e)) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Session file is not valid JSON, replacing it"
                );
                Ok((Map::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> Result<(), TokenStoreError> {
        if entries.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            };
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<SecretString>, TokenStoreError> {
        let entries = self.read_entries()?;
        Ok(entries
            .get(TOKEN_KEY)
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(SecretString::from))
    }

    fn save(&self, token: &SecretString) -> Result<(), TokenStoreError> {
        let (mut entries, _) = self.entries_for_write()?;
        entries.insert(
            TOKEN_KEY.to_string(),
            Value::String(token.expose_secret().to_string()),
        );
        self.write_entries(&entries)?;
        debug!(path = %self.path.display(), "Session token saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        let (mut entries, corrupt) = self.entries_for_write()?;
        if entries.remove(TOKEN_KEY).is_some() || corrupt {
            self.write_entries(&entries)?;
            debug!(path = %self.path.display(), "Session token cleared");
        }
        Ok(())
    }
}

// =============================================================================
// MemoryTokenStore
// =============================================================================

/// Process-local token store. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    slot: Arc<Mutex<Option<SecretString>>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `token`, as if saved by an earlier run.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(SecretString::from(token.into())))),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<SecretString>, TokenStoreError> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, token: &SecretString) -> Result<(), TokenStoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
