/*
 * Copyright 2025 PenTutor Contributors
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

//! Credentials and the auth context passed down to every page.
//!
//! The bearer token, refresh token and user record live in a
//! [`CredentialStore`] under fixed keys. Nothing reads the store directly:
//! pages hold an [`AuthContext`], ask it for the current [`Credentials`] and
//! subscribe to it to learn about logout.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use pentutor_meeting_types::user::{AuthTokens, User};
use thiserror::Error;
use tokio::sync::watch;

use crate::error::SessionError;

pub const ACCESS_KEY: &str = "access";
pub const REFRESH_KEY: &str = "refresh";
pub const USER_KEY: &str = "user";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("credential store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Persistent string key/value storage for credentials.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store; credentials are gone when the process exits.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries().remove(key);
        Ok(())
    }
}

/// JSON-object file store, rewritten on every change.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn read(&self) -> Result<HashMap<String, String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(HashMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.read()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.read()?;
        entries.insert(key.to_string(), value.to_string());
        self.write(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.read()?;
        if entries.remove(key).is_some() {
            self.write(&entries)?;
        }
        Ok(())
    }
}

/// The signed-in user and their tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: User,
    pub tokens: AuthTokens,
}

impl Credentials {
    pub fn access_token(&self) -> &str {
        &self.tokens.access
    }
}

/// Explicit replacement for ambient token lookups.
///
/// Cloning is cheap; all clones share the store and the logout signal.
#[derive(Clone)]
pub struct AuthContext {
    store: Arc<dyn CredentialStore>,
    state: Arc<watch::Sender<Option<Credentials>>>,
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("signed_in", &self.state.borrow().is_some())
            .finish()
    }
}

impl AuthContext {
    /// A signed-out context over `store`. Call [`restore`](Self::restore)
    /// to pick up credentials persisted by an earlier run.
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            store,
            state: Arc::new(state),
        }
    }

    /// Load credentials from the store. A missing token or user record
    /// leaves the context signed out; a corrupt user record is cleared.
    pub fn restore(&self) -> Result<Option<Credentials>, StoreError> {
        let access = self.store.get(ACCESS_KEY)?.filter(|t| !t.is_empty());
        let user_json = self.store.get(USER_KEY)?;
        let credentials = match (access, user_json) {
            (Some(access), Some(user_json)) => match serde_json::from_str::<User>(&user_json) {
                Ok(user) => Some(Credentials {
                    user,
                    tokens: AuthTokens {
                        access,
                        refresh: self.store.get(REFRESH_KEY)?,
                    },
                }),
                Err(e) => {
                    log::warn!("discarding unreadable stored user: {e}");
                    self.clear_store()?;
                    None
                }
            },
            _ => None,
        };
        self.state.send_replace(credentials.clone());
        Ok(credentials)
    }

    /// Persist credentials after a successful sign-in.
    pub fn login(&self, user: User, tokens: AuthTokens) -> Result<Credentials, StoreError> {
        self.store.set(ACCESS_KEY, &tokens.access)?;
        match &tokens.refresh {
            Some(refresh) => self.store.set(REFRESH_KEY, refresh)?,
            None => self.store.remove(REFRESH_KEY)?,
        }
        self.store.set(USER_KEY, &serde_json::to_string(&user)?)?;

        log::info!("signed in as {} ({})", user.username, user.role());
        let credentials = Credentials { user, tokens };
        self.state.send_replace(Some(credentials.clone()));
        Ok(credentials)
    }

    /// Forget the credentials and notify subscribers.
    pub fn logout(&self) -> Result<(), StoreError> {
        let cleared = self.clear_store();
        log::info!("signed out");
        self.state.send_replace(None);
        cleared
    }

    pub fn current(&self) -> Option<Credentials> {
        self.state.borrow().clone()
    }

    pub fn require(&self) -> Result<Credentials, SessionError> {
        self.current().ok_or(SessionError::AuthenticationRequired)
    }

    /// Receiver that changes on login and logout; `None` means signed out.
    pub fn subscribe(&self) -> watch::Receiver<Option<Credentials>> {
        self.state.subscribe()
    }

    fn clear_store(&self) -> Result<(), StoreError> {
        self.store.remove(ACCESS_KEY)?;
        self.store.remove(REFRESH_KEY)?;
        self.store.remove(USER_KEY)
    }
}
