//! Link Store for LinkVault.
//!
//! Client-side cache of the signed-in user's links and the category set
//! derived from them. Every successful mutation is followed by a full
//! re-fetch from the record store, so the published list always mirrors the
//! server and never a locally patched copy.
//!
//! Category derivation is an ordered union: the previous set first, then any
//! label newly observed on a fetched link, in first-seen order. It only
//! shrinks through [`LinkStore::delete_category`] or a session reset.

use std::sync::{Arc, RwLock};

use tracing::{debug, error, info, warn};

use crate::managers::listeners::{Listeners, Subscription};
use crate::services::record_store::RemoteRecordStore;
use crate::types::errors::{FetchError, LinkError};
use crate::types::link::{default_categories, Category, Link, LinkPatch, LinkSnapshot, NewLink, UNCATEGORIZED};
use crate::types::session::Session;

/// How the store reconciles local state after a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    /// Re-fetch the owner's whole collection.
    RefetchAll,
}

/// Policy applied after every successful mutation.
pub const WRITE_POLICY: WritePolicy = WritePolicy::RefetchAll;

/// Destination for user-visible mutation failures.
pub trait AlertSink: Send + Sync {
    fn alert(&self, message: &str);
}

/// Alert sink that writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn alert(&self, message: &str) {
        error!(alert = message, "link operation failed");
    }
}

/// Merges categories observed on `links` into `known`, preserving order.
pub fn derive_categories(known: &[Category], links: &[Link]) -> Vec<Category> {
    let mut merged: Vec<Category> = Vec::with_capacity(known.len());
    for label in known {
        if !merged.contains(label) {
            merged.push(label.clone());
        }
    }
    for link in links {
        if !merged.contains(&link.category) {
            merged.push(link.category.clone());
        }
    }
    merged
}

struct LinkState {
    session: Option<Session>,
    links: Vec<Link>,
    categories: Vec<Category>,
}

impl LinkState {
    fn reset(session: Option<Session>) -> Self {
        Self {
            session,
            links: Vec::new(),
            categories: default_categories(),
        }
    }

    fn snapshot(&self) -> LinkSnapshot {
        LinkSnapshot {
            links: self.links.clone(),
            categories: self.categories.clone(),
        }
    }
}

/// Cached link collection bound to at most one session.
pub struct LinkStore {
    remote: Arc<dyn RemoteRecordStore>,
    alerts: Arc<dyn AlertSink>,
    state: RwLock<LinkState>,
    listeners: Listeners<LinkSnapshot>,
}

impl LinkStore {
    pub fn new(remote: Arc<dyn RemoteRecordStore>, alerts: Arc<dyn AlertSink>) -> Self {
        Self {
            remote,
            alerts,
            state: RwLock::new(LinkState::reset(None)),
            listeners: Listeners::new(),
        }
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, LinkState> {
        self.state.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, LinkState> {
        self.state.write().unwrap_or_else(|p| p.into_inner())
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        self.listeners.emit(&snapshot);
    }

    /// Links as of the last fetch, newest first.
    pub fn list(&self) -> Vec<Link> {
        self.read_state().links.clone()
    }

    pub fn categories(&self) -> Vec<Category> {
        self.read_state().categories.clone()
    }

    pub fn snapshot(&self) -> LinkSnapshot {
        self.read_state().snapshot()
    }

    pub fn session(&self) -> Option<Session> {
        self.read_state().session.clone()
    }

    /// Notifies `listener` with a fresh snapshot after every state change.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&LinkSnapshot) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    /// Binds the store to `session`, clearing everything cached for the previous one.
    pub async fn set_session(&self, session: Option<Session>) {
        let signed_in = session.is_some();
        *self.write_state() = LinkState::reset(session);
        debug!(signed_in, "link store session reset");
        self.publish();
        if signed_in {
            self.refresh().await;
        }
    }

    /// Swaps in a refreshed credential for the identity already bound.
    ///
    /// Links and categories are kept. Returns `false`, changing nothing, when
    /// the store is unbound or bound to a different user.
    pub fn renew_session(&self, session: Session) -> bool {
        let mut state = self.write_state();
        match &state.session {
            Some(bound) if bound.user.id == session.user.id => {
                state.session = Some(session);
                debug!("link store credential renewed");
                true
            }
            _ => false,
        }
    }

    /// Re-fetches the owner's links. A failed fetch leaves an empty list.
    pub async fn refresh(&self) {
        let Some(session) = self.session() else {
            self.write_state().links.clear();
            self.publish();
            return;
        };

        let fetched = match self.remote.select_links(&session).await {
            Ok(links) => links,
            Err(e) => {
                let e = FetchError::from(e);
                warn!(error = %e, "treating link list as empty");
                Vec::new()
            }
        };

        {
            let mut state = self.write_state();
            let still_bound = state
                .session
                .as_ref()
                .is_some_and(|s| s.user.id == session.user.id);
            if !still_bound {
                debug!("discarding fetch for another identity");
                return;
            }
            state.categories = derive_categories(&state.categories, &fetched);
            state.links = fetched;
        }
        self.publish();
    }

    fn require_session(&self) -> Result<Session, LinkError> {
        self.session().ok_or(LinkError::NotAuthenticated)
    }

    async fn after_write(&self) {
        match WRITE_POLICY {
            WritePolicy::RefetchAll => self.refresh().await,
        }
    }

    async fn finish_write(&self, action: &str, result: Result<(), LinkError>) -> Result<(), LinkError> {
        match result {
            Ok(()) => {
                self.after_write().await;
                Ok(())
            }
            Err(e) => {
                warn!(action, error = %e, "link mutation failed");
                self.alerts.alert(&format!("Failed to {}: {}", action, e));
                Err(e)
            }
        }
    }

    pub async fn create(&self, link: NewLink) -> Result<(), LinkError> {
        let result = match self.require_session() {
            Ok(session) => self
                .remote
                .insert_link(&session, &link)
                .await
                .map(|created| info!(id = %created.id, "link created"))
                .map_err(LinkError::from),
            Err(e) => Err(e),
        };
        self.finish_write("add link", result).await
    }

    pub async fn update(&self, id: &str, patch: LinkPatch) -> Result<(), LinkError> {
        let result = match self.require_session() {
            Ok(session) => self
                .remote
                .update_link(&session, id, &patch)
                .await
                .map_err(LinkError::from),
            Err(e) => Err(e),
        };
        self.finish_write("update link", result).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), LinkError> {
        let result = match self.require_session() {
            Ok(session) => self
                .remote
                .delete_link(&session, id)
                .await
                .map_err(LinkError::from),
            Err(e) => Err(e),
        };
        self.finish_write("delete link", result).await
    }

    /// Adds a label to the local category set. Blank or known labels are ignored.
    pub fn add_category(&self, label: &str) {
        let label = label.trim();
        if label.is_empty() {
            return;
        }
        {
            let mut state = self.write_state();
            if state.categories.iter().any(|c| c == label) {
                return;
            }
            state.categories.push(label.to_string());
        }
        self.publish();
    }

    /// Moves every link in `label` to Uncategorized, then drops the label.
    pub async fn delete_category(&self, label: &str) -> Result<(), LinkError> {
        let session = match self.require_session() {
            Ok(session) => session,
            Err(e) => return self.finish_write("delete category", Err(e)).await,
        };

        match self.remote.reassign_category(&session, label, UNCATEGORIZED).await {
            Ok(moved) => {
                info!(category = label, moved, "category deleted");
                self.write_state().categories.retain(|c| c != label);
                self.finish_write("delete category", Ok(())).await
            }
            Err(e) => self.finish_write("delete category", Err(LinkError::from(e))).await,
        }
    }
}
