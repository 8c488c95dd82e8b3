//! Session credentials
//!
//! The [`Session`] is the single source of truth for the current access and
//! refresh tokens. Every mutation is written through to a
//! [`CredentialStore`] so the session survives restarts; [`Session::restore`]
//! reads it back at startup. No network calls originate here.

use crate::error::Result;
use crate::store::{CredentialStore, MemoryStore};
use parking_lot::RwLock;
use qr_common::UserProfile;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Persisted key of the access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Persisted key of the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
/// Persisted key of the cached user profile
pub const USER_KEY: &str = "user";

/// Opaque bearer credential
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(****)")
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Snapshot of the current credentials
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: Option<Token>,
    pub refresh_token: Option<Token>,
}

#[derive(Debug, Default)]
struct SessionState {
    credentials: Credentials,
    profile: Option<UserProfile>,
}

/// Current credentials plus the cached user profile
#[derive(Debug)]
pub struct Session {
    store: Arc<dyn CredentialStore>,
    state: RwLock<SessionState>,
}

impl Session {
    /// Empty session writing through to `store`; nothing is read from it
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            state: RwLock::new(SessionState::default()),
        }
    }

    /// Ephemeral session backed by a [`MemoryStore`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Load the persisted session from `store`
    ///
    /// A cached profile that no longer parses is dropped rather than failing
    /// the restore.
    pub fn restore(store: Arc<dyn CredentialStore>) -> Result<Self> {
        let access_token = store.get(ACCESS_TOKEN_KEY)?.map(Token::from);
        let refresh_token = store.get(REFRESH_TOKEN_KEY)?.map(Token::from);
        let profile = match store.get(USER_KEY)? {
            Some(raw) => match serde_json::from_str::<UserProfile>(&raw) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable cached user profile");
                    None
                }
            },
            None => None,
        };
        debug!(
            has_access = access_token.is_some(),
            has_refresh = refresh_token.is_some(),
            "Restored session"
        );

        Ok(Self {
            store,
            state: RwLock::new(SessionState {
                credentials: Credentials {
                    access_token,
                    refresh_token,
                },
                profile,
            }),
        })
    }

    /// Snapshot of the current credentials
    pub fn current(&self) -> Credentials {
        self.state.read().credentials.clone()
    }

    pub fn access_token(&self) -> Option<Token> {
        self.state.read().credentials.access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<Token> {
        self.state.read().credentials.refresh_token.clone()
    }

    pub fn user_profile(&self) -> Option<UserProfile> {
        self.state.read().profile.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().credentials.access_token.is_some()
    }

    /// Memory is updated before the store is written, so a failed write
    /// still leaves the new token in effect for this process; the store
    /// error is returned to the caller.
    pub fn set_access_token(&self, token: Token) -> Result<()> {
        let mut state = self.state.write();
        state.credentials.access_token = Some(token.clone());
        self.store.set(ACCESS_TOKEN_KEY, token.as_str())
    }

    pub fn set_refresh_token(&self, token: Token) -> Result<()> {
        let mut state = self.state.write();
        state.credentials.refresh_token = Some(token.clone());
        self.store.set(REFRESH_TOKEN_KEY, token.as_str())
    }

    /// Replace both tokens, as after a login
    pub fn set_tokens(&self, access: Token, refresh: Token) -> Result<()> {
        let mut state = self.state.write();
        state.credentials = Credentials {
            access_token: Some(access.clone()),
            refresh_token: Some(refresh.clone()),
        };
        self.store.set(ACCESS_TOKEN_KEY, access.as_str())?;
        self.store.set(REFRESH_TOKEN_KEY, refresh.as_str())
    }

    pub fn set_user_profile(&self, profile: &UserProfile) -> Result<()> {
        let raw = serde_json::to_string(profile)?;
        let mut state = self.state.write();
        state.profile = Some(profile.clone());
        self.store.set(USER_KEY, &raw)
    }

    /// Forget the tokens and the cached profile, in memory and in the store
    pub fn clear(&self) -> Result<()> {
        let mut state = self.state.write();
        *state = SessionState::default();
        self.store.remove(ACCESS_TOKEN_KEY)?;
        self.store.remove(REFRESH_TOKEN_KEY)?;
        self.store.remove(USER_KEY)?;
        info!("Session cleared");
        Ok(())
    }
}
