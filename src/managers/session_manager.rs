//! Session Manager for LinkVault.
//!
//! Owns authentication state on the client: signs in and out through the
//! record store, applies the "remember me" policy on cold start, and
//! notifies subscribers whenever the signed-in identity changes.
//!
//! Two markers drive the policy:
//! - a durable flag (`linkvault_remember`) holding the choice made at login;
//! - a volatile marker (`linkvault_session_active`) set once this browser
//!   process has validated its session. It survives reloads but not restarts.
//!
//! A remote session found on a fresh launch (marker absent) while the flag
//! reads `"false"` is signed out even though the credential is still valid.

use std::sync::{Arc, RwLock, Weak};

use async_trait::async_trait;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::database::local_state::KeyValueStore;
use crate::managers::listeners::{Listeners, Subscription};
use crate::services::record_store::RemoteRecordStore;
use crate::types::errors::AuthError;
use crate::types::session::{AuthChange, Credentials, Session, SessionEvent};

/// Durable key recording the remember-me choice (`"true"` / `"false"`).
pub const REMEMBER_KEY: &str = "linkvault_remember";

/// Volatile key marking that this process already validated its session.
pub const SESSION_ACTIVE_KEY: &str = "linkvault_session_active";

/// Trait defining session management operations.
#[async_trait]
pub trait SessionManagerTrait {
    /// Runs the cold-start check and returns the resulting session.
    async fn initialize(&self) -> Option<Session>;
    fn current_session(&self) -> Option<Session>;
    async fn sign_in(&self, credentials: &Credentials, remember: bool) -> Result<Session, AuthError>;
    async fn sign_up(&self, credentials: &Credentials, remember: bool) -> Result<Session, AuthError>;
    /// Clears local markers and revokes the remote session. Never fails locally.
    async fn sign_out(&self);
    fn on_session_change(&self, listener: Box<dyn Fn(&SessionEvent) + Send + Sync>) -> Subscription;
}

/// Session manager backed by a record store and two injected key/value scopes.
pub struct SessionManager {
    remote: Arc<dyn RemoteRecordStore>,
    durable: Arc<dyn KeyValueStore>,
    volatile: Arc<dyn KeyValueStore>,
    current: RwLock<Option<Session>>,
    listeners: Listeners<SessionEvent>,
}

impl SessionManager {
    pub fn new(
        remote: Arc<dyn RemoteRecordStore>,
        durable: Arc<dyn KeyValueStore>,
        volatile: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            remote,
            durable,
            volatile,
            current: RwLock::new(None),
            listeners: Listeners::new(),
        }
    }

    fn read(store: &dyn KeyValueStore, key: &str) -> Option<String> {
        match store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "failed to read local marker");
                None
            }
        }
    }

    fn write(store: &dyn KeyValueStore, key: &str, value: &str) {
        if let Err(e) = store.set(key, value) {
            warn!(key, error = %e, "failed to write local marker");
        }
    }

    fn clear(store: &dyn KeyValueStore, key: &str) {
        if let Err(e) = store.remove(key) {
            warn!(key, error = %e, "failed to clear local marker");
        }
    }

    /// `false` only when the user explicitly opted out of staying signed in.
    fn remember_preference(&self) -> bool {
        Self::read(self.durable.as_ref(), REMEMBER_KEY).as_deref() != Some("false")
    }

    fn mark_session_active(&self) {
        Self::write(self.volatile.as_ref(), SESSION_ACTIVE_KEY, "true");
    }

    fn same_session(a: &Option<Session>, b: &Option<Session>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => a.access_token == b.access_token && a.user.id == b.user.id,
            _ => false,
        }
    }

    /// Replaces the current session and notifies listeners if it changed.
    fn transition(&self, next: Option<Session>) {
        {
            let mut current = self.current.write().unwrap_or_else(|p| p.into_inner());
            if Self::same_session(&current, &next) {
                *current = next;
                return;
            }
            *current = next.clone();
        }

        let event = match next {
            Some(session) => SessionEvent::SignedIn(session),
            None => SessionEvent::SignedOut,
        };
        debug!(signed_in = event.session().is_some(), "session changed");
        self.listeners.emit(&event);
    }

    /// Applies an auth transition reported by the record store.
    pub fn apply_auth_change(&self, change: AuthChange) {
        match change {
            AuthChange::SignedIn(mut session) | AuthChange::TokenRefreshed(mut session) => {
                session.remember = self.remember_preference();
                self.mark_session_active();
                self.transition(Some(session));
            }
            AuthChange::SignedOut => self.transition(None),
            AuthChange::Expired => {
                info!("remote session expired");
                self.transition(None);
            }
        }
    }

    /// Forwards record store auth changes into this manager until it is dropped.
    pub fn spawn_remote_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut rx = self.remote.auth_changes();
        let manager: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(change) => {
                        let Some(manager) = manager.upgrade() else {
                            break;
                        };
                        manager.apply_auth_change(change);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "auth change listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// Registers a listener from a closure.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    fn establish(&self, mut session: Session, remember: bool) -> Session {
        Self::write(
            self.durable.as_ref(),
            REMEMBER_KEY,
            if remember { "true" } else { "false" },
        );
        self.mark_session_active();
        session.remember = remember;
        self.transition(Some(session.clone()));
        session
    }
}

#[async_trait]
impl SessionManagerTrait for SessionManager {
    async fn initialize(&self) -> Option<Session> {
        let session = match self.remote.get_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "session check failed, continuing signed out");
                None
            }
        };

        let Some(mut session) = session else {
            self.transition(None);
            return None;
        };

        let remember = self.remember_preference();
        let fresh_launch = Self::read(self.volatile.as_ref(), SESSION_ACTIVE_KEY).is_none();

        if !remember && fresh_launch {
            info!(user_id = %session.user.id, "remember-me disabled on fresh launch, signing out");
            if let Err(e) = self.remote.sign_out().await {
                warn!(error = %e, "remote sign-out failed");
            }
            self.transition(None);
            return None;
        }

        self.mark_session_active();
        session.remember = remember;
        self.transition(Some(session.clone()));
        Some(session)
    }

    fn current_session(&self) -> Option<Session> {
        self.current.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    async fn sign_in(&self, credentials: &Credentials, remember: bool) -> Result<Session, AuthError> {
        let session = self.remote.sign_in(credentials).await.map_err(AuthError::from)?;
        info!(user_id = %session.user.id, remember, "signed in");
        Ok(self.establish(session, remember))
    }

    async fn sign_up(&self, credentials: &Credentials, remember: bool) -> Result<Session, AuthError> {
        let session = self.remote.sign_up(credentials).await.map_err(AuthError::from)?;
        info!(user_id = %session.user.id, remember, "signed up");
        Ok(self.establish(session, remember))
    }

    async fn sign_out(&self) {
        Self::clear(self.durable.as_ref(), REMEMBER_KEY);
        Self::clear(self.volatile.as_ref(), SESSION_ACTIVE_KEY);
        if let Err(e) = self.remote.sign_out().await {
            warn!(error = %e, "remote sign-out failed, local state cleared anyway");
        }
        self.transition(None);
    }

    fn on_session_change(&self, listener: Box<dyn Fn(&SessionEvent) + Send + Sync>) -> Subscription {
        self.listeners.subscribe(listener)
    }
}
