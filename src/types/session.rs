use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The authenticated user as seen by the record store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// An authenticated session and the credential the record store accepts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub user: Identity,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    /// Whether the user asked to stay signed in across browser restarts.
    #[serde(default = "default_remember")]
    pub remember: bool,
}

fn default_remember() -> bool {
    true
}

impl Session {
    pub fn owner_id(&self) -> &str {
        &self.user.id
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Email/password pair. Wiped from memory on drop.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Authentication transitions reported by the record store.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthChange {
    SignedIn(Session),
    TokenRefreshed(Session),
    SignedOut,
    /// The remote credential expired or was revoked outside this client.
    Expired,
}

impl AuthChange {
    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthChange::SignedIn(s) | AuthChange::TokenRefreshed(s) => Some(s),
            AuthChange::SignedOut | AuthChange::Expired => None,
        }
    }
}

/// State change published by the session manager to its listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SignedIn(Session),
    SignedOut,
}

impl SessionEvent {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionEvent::SignedIn(s) => Some(s),
            SessionEvent::SignedOut => None,
        }
    }
}
