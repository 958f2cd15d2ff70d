//! In-memory session store.
//!
//! Single process-wide source of truth for the authentication token and the
//! signed-in identity, read by the navigation guards and the HTTP gateway.
//! Persistence across restarts is the embedder's job; on startup it may seed
//! the store with a previously saved session.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};

/// Account privilege level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Self::User
    }
}

/// The signed-in user as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub role: Role,
}

/// An authenticated session. Token and identity always travel together, so
/// they can never be set or cleared independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub identity: UserIdentity,
}

/// Process-wide session holder. All operations are total.
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: RwLock<Option<Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a session after a successful login or signup.
    pub fn set_session(&self, token: impl Into<String>, identity: UserIdentity) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Session {
            token: token.into(),
            identity,
        });
    }

    /// Drop the current session (logout).
    pub fn clear_session(&self) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }

    /// Snapshot of the current session, if any.
    pub fn session(&self) -> Option<Session> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The bearer token, if signed in.
    pub fn token(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|s| s.token.clone())
    }

    /// The signed-in identity, if any.
    pub fn identity(&self) -> Option<UserIdentity> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|s| s.identity.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|s| s.identity.role == Role::Admin)
    }
}
