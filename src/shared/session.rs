use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{info, warn};

use crate::error::error_codes;
use crate::validators::validate_avatar_color;

/// Well-known key the signed-in user is stored under
pub const SESSION_KEY: &str = "plantpulse_user";
pub const DEFAULT_AVATAR_COLOR: &str = "#10B981";
pub const PLACEHOLDER_NAME: &str = "User";

/// Signed-in user as persisted locally
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSession {
    pub full_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_color: Option<String>,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session record is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl SessionError {
    pub fn code(&self) -> &'static str {
        error_codes::SESSION_ERROR
    }
}

/// Local key-value persistence for the session record
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<UserSession>, SessionError>;
    fn save(&self, user: &UserSession) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

/// JSON file named after [`SESSION_KEY`] inside a directory
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", SESSION_KEY)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<UserSession>, SessionError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, user: &UserSession) -> Result<(), SessionError> {
        let raw = serde_json::to_string(user)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory session storage
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    user: Mutex<Option<UserSession>>,
}

impl MemorySessionStore {
    pub fn with_user(user: UserSession) -> Self {
        Self {
            user: Mutex::new(Some(user)),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<UserSession>> {
        self.user.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<UserSession>, SessionError> {
        Ok(self.slot().clone())
    }

    fn save(&self, user: &UserSession) -> Result<(), SessionError> {
        *self.slot() = Some(user.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.slot() = None;
        Ok(())
    }
}

/// Application-wide user context.
///
/// Built once at startup through [`Session::initialize`] and handed to the
/// views; nothing else reads the session store.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn SessionStore>,
    user: Option<UserSession>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("user", &self.user).finish()
    }
}

impl Session {
    /// Single read point. An unreadable record means nobody is signed in.
    pub fn initialize(store: Arc<dyn SessionStore>) -> Self {
        let user = match store.load() {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, code = e.code(), "Ignoring unreadable session record");
                None
            }
        };

        if let Some(ref u) = user {
            info!(email = %u.email, "Session restored");
        }

        Self { store, user }
    }

    pub fn sign_in(&mut self, user: UserSession) -> Result<(), SessionError> {
        self.store.save(&user)?;
        info!(email = %user.email, "User signed in");
        self.user = Some(user);
        Ok(())
    }

    /// Explicit teardown: forget the user and remove the stored record
    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.store.clear()?;
        if let Some(user) = self.user.take() {
            info!(email = %user.email, "User logged out");
        }
        Ok(())
    }

    pub fn user(&self) -> Option<&UserSession> {
        self.user.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn email(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.email.as_str())
    }

    fn full_name(&self) -> Option<&str> {
        self.user
            .as_ref()
            .map(|u| u.full_name.trim())
            .filter(|n| !n.is_empty())
    }

    pub fn display_name(&self) -> &str {
        self.full_name().unwrap_or(PLACEHOLDER_NAME)
    }

    /// First word of the full name, for the dashboard greeting
    pub fn first_name(&self) -> &str {
        self.full_name()
            .and_then(|n| n.split_whitespace().next())
            .unwrap_or(PLACEHOLDER_NAME)
    }

    pub fn initial(&self) -> char {
        self.full_name()
            .and_then(|n| n.chars().next())
            .and_then(|c| c.to_uppercase().next())
            .unwrap_or('U')
    }

    pub fn avatar_color(&self) -> &str {
        self.user
            .as_ref()
            .and_then(|u| u.avatar_color.as_deref())
            .filter(|c| validate_avatar_color(c).is_ok())
            .unwrap_or(DEFAULT_AVATAR_COLOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ana() -> UserSession {
        UserSession {
            full_name: "ana maria lopez".to_string(),
            email: "ana@example.com".to_string(),
            avatar_color: Some("#3B82F6".to_string()),
        }
    }

    #[test]
    fn test_placeholders_without_user() {
        let session = Session::initialize(Arc::new(MemorySessionStore::default()));
        assert!(!session.is_signed_in());
        assert_eq!(session.display_name(), "User");
        assert_eq!(session.first_name(), "User");
        assert_eq!(session.initial(), 'U');
        assert_eq!(session.email(), None);
        assert_eq!(session.avatar_color(), DEFAULT_AVATAR_COLOR);
    }

    #[test]
    fn test_accessors_with_user() {
        let session = Session::initialize(Arc::new(MemorySessionStore::with_user(ana())));
        assert_eq!(session.display_name(), "ana maria lopez");
        assert_eq!(session.first_name(), "ana");
        assert_eq!(session.initial(), 'A');
        assert_eq!(session.email(), Some("ana@example.com"));
        assert_eq!(session.avatar_color(), "#3B82F6");
    }

    #[test]
    fn test_invalid_avatar_color_falls_back() {
        let mut user = ana();
        user.avatar_color = Some("blue".to_string());
        let session = Session::initialize(Arc::new(MemorySessionStore::with_user(user)));
        assert_eq!(session.avatar_color(), DEFAULT_AVATAR_COLOR);
    }

    #[test]
    fn test_logout_clears_store() {
        let store = Arc::new(MemorySessionStore::with_user(ana()));
        let mut session = Session::initialize(store.clone());
        session.logout().unwrap();

        assert!(!session.is_signed_in());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileSessionStore::new(dir.path()));
        assert!(store.path().ends_with("plantpulse_user.json"));

        let mut session = Session::initialize(store.clone());
        assert!(!session.is_signed_in());

        session.sign_in(ana()).unwrap();
        let restored = Session::initialize(store.clone());
        assert_eq!(restored.user(), Some(&ana()));

        session.logout().unwrap();
        assert!(!store.path().exists());
        // Clearing twice is harmless
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_record_means_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        std::fs::write(store.path(), "{not json").unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, SessionError::Malformed(_)));
        assert_eq!(err.code(), error_codes::SESSION_ERROR);
        let session = Session::initialize(Arc::new(store));
        assert!(!session.is_signed_in());
    }
}
