//! Session store with pluggable persistence
//!
//! Holds the session token and username. Storage options:
//! - JSON file in the user config directory (survives restarts)
//! - OS keyring for the token, file for the username
//! - in-memory, for tests and throw-away sessions
//!
//! There is no client-side expiry: a token stays valid until `clear()`.

use crate::config::{ClientConfig, StorageKind};
use keyring::Entry;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

const KEYRING_SERVICE: &str = "healthguard";
const KEYRING_TOKEN_USER: &str = "session-token";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt session file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: Option<String>,
    pub username: Option<String>,
}

impl Session {
    pub fn new(token: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            username: Some(username.into()),
        }
    }

    /// Only the token counts; a lone username is still logged out.
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Persistent key/value backing of the session
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Session, SessionError>;
    fn store(&self, session: &Session) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    inner: Mutex<Session>,
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> Result<Session, SessionError> {
        Ok(self.inner.lock().clone())
    }

    fn store(&self, session: &Session) -> Result<(), SessionError> {
        *self.inner.lock() = session.clone();
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.inner.lock() = Session::default();
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> Result<Session, SessionError> {
        if !self.path.exists() {
            return Ok(Session::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Session::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn store(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(session)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// Token in the OS keyring, username in a plain file
#[derive(Debug, Clone)]
pub struct KeyringSessionStorage {
    file: FileSessionStorage,
}

impl KeyringSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: FileSessionStorage::new(path),
        }
    }

    fn entry() -> Result<Entry, SessionError> {
        Ok(Entry::new(KEYRING_SERVICE, KEYRING_TOKEN_USER)?)
    }

    fn delete_token() -> Result<(), SessionError> {
        match Self::entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl SessionStorage for KeyringSessionStorage {
    fn load(&self) -> Result<Session, SessionError> {
        let mut session = self.file.load()?;
        session.token = match Self::entry()?.get_password() {
            Ok(token) => Some(token),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => return Err(e.into()),
        };
        Ok(session)
    }

    fn store(&self, session: &Session) -> Result<(), SessionError> {
        match &session.token {
            Some(token) => Self::entry()?.set_password(token)?,
            None => Self::delete_token()?,
        }
        self.file.store(&Session {
            token: None,
            username: session.username.clone(),
        })
    }

    fn clear(&self) -> Result<(), SessionError> {
        Self::delete_token()?;
        self.file.clear()
    }
}

/// Injectable session context shared by all views.
///
/// Reads always go to the storage, so a write is visible to every holder of
/// a clone on its next `get()`.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    pub fn new(storage: impl SessionStorage + 'static) -> Self {
        Self {
            storage: Arc::new(storage),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemorySessionStorage::default())
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, crate::config::ConfigError> {
        let store = match config.session.storage {
            StorageKind::Memory => Self::in_memory(),
            StorageKind::File => Self::new(FileSessionStorage::new(config.session_file_path()?)),
            StorageKind::Keyring => Self::new(KeyringSessionStorage::new(config.session_file_path()?)),
        };
        Ok(store)
    }

    /// Unreadable storage is treated as logged out.
    pub fn get(&self) -> Session {
        match self.storage.load() {
            Ok(session) => session,
            Err(e) => {
                warn!("session storage unreadable, treating as logged out: {}", e);
                Session::default()
            }
        }
    }

    pub fn set_session(
        &self,
        token: impl Into<String>,
        username: impl Into<String>,
    ) -> Result<(), SessionError> {
        let session = Session::new(token, username);
        debug!("storing session for {:?}", session.username);
        self.storage.store(&session)
    }

    pub fn clear(&self) -> Result<(), SessionError> {
        debug!("clearing session");
        self.storage.clear()
    }

    pub fn username(&self) -> Option<String> {
        self.get().username
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_set_get_clear() {
        let store = SessionStore::in_memory();
        assert!(!store.get().is_authenticated());

        store.set_session("ok", "alice").unwrap();
        let session = store.get();
        assert!(session.is_authenticated());
        assert_eq!(session.username.as_deref(), Some("alice"));

        store.clear().unwrap();
        assert_eq!(store.get(), Session::default());
    }

    #[test]
    fn test_username_without_token_is_not_authenticated() {
        let session = Session {
            token: None,
            username: Some("alice".to_string()),
        };
        assert!(!session.is_authenticated());

        let empty = Session {
            token: Some(String::new()),
            username: Some("alice".to_string()),
        };
        assert!(!empty.is_authenticated());
    }

    #[test]
    fn test_clones_see_writes() {
        let store = SessionStore::in_memory();
        let view = store.clone();
        store.set_session("ok", "bob").unwrap();
        assert_eq!(view.username().as_deref(), Some("bob"));
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hg").join("session.json");

        SessionStore::new(FileSessionStorage::new(&path))
            .set_session("ok", "alice")
            .unwrap();

        let reopened = SessionStore::new(FileSessionStorage::new(&path));
        assert_eq!(reopened.get(), Session::new("ok", "alice"));

        reopened.clear().unwrap();
        assert!(!path.exists());
        assert!(!reopened.get().is_authenticated());
    }

    #[test]
    fn test_corrupt_file_reads_as_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = SessionStore::new(FileSessionStorage::new(&path));
        assert_eq!(store.get(), Session::default());
    }
}
