//! Contract of the remote record store.
//!
//! The store holds identities and their links and enforces row ownership.
//! Every link operation takes the caller's [`Session`]; implementations
//! authorize the session's credential and scope the query to its owner.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::types::errors::RemoteError;
use crate::types::link::{Link, LinkPatch, NewLink};
use crate::types::session::{AuthChange, Credentials, Session};

/// Capacity of the auth-change broadcast channel.
pub const AUTH_CHANNEL_CAPACITY: usize = 16;

/// Authenticated CRUD over the `links` collection plus auth primitives.
#[async_trait]
pub trait RemoteRecordStore: Send + Sync {
    /// Registers a new account and returns its first session.
    async fn sign_up(&self, credentials: &Credentials) -> Result<Session, RemoteError>;

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, RemoteError>;

    /// Revokes the active session. Succeeds when nobody is signed in.
    async fn sign_out(&self) -> Result<(), RemoteError>;

    /// Returns the session the store currently considers active, if any.
    async fn get_session(&self) -> Result<Option<Session>, RemoteError>;

    /// Subscribes to auth transitions. Dropping the receiver unsubscribes.
    fn auth_changes(&self) -> broadcast::Receiver<AuthChange>;

    /// All links owned by the session's identity, newest first.
    async fn select_links(&self, session: &Session) -> Result<Vec<Link>, RemoteError>;

    async fn insert_link(&self, session: &Session, link: &NewLink) -> Result<Link, RemoteError>;

    /// Fails with [`RemoteError::NotFound`] when no owned row has this id.
    async fn update_link(&self, session: &Session, id: &str, patch: &LinkPatch) -> Result<(), RemoteError>;

    /// Deleting an unknown id is not an error.
    async fn delete_link(&self, session: &Session, id: &str) -> Result<(), RemoteError>;

    /// Moves every owned link in category `from` to `to`. Returns the number moved.
    async fn reassign_category(&self, session: &Session, from: &str, to: &str) -> Result<u64, RemoteError>;
}
