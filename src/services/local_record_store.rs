//! Record store backed by the local SQLite database.
//!
//! Implements [`RemoteRecordStore`] with the same ownership rules the hosted
//! service enforces: every link query is scoped to the user behind the
//! presented access token, never to the user id the caller claims.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::connection::Database;
use crate::services::crypto_service::{CryptoService, CryptoServiceTrait};
use crate::services::record_store::{RemoteRecordStore, AUTH_CHANNEL_CAPACITY};
use crate::types::errors::RemoteError;
use crate::types::link::{Link, LinkPatch, NewLink};
use crate::types::session::{AuthChange, Credentials, Identity, Session};

/// Lifetime of an issued access token.
const DEFAULT_SESSION_TTL_SECS: i64 = 3600;

/// SQLite implementation of the record store contract.
pub struct LocalRecordStore {
    db: Arc<Database>,
    crypto: CryptoService,
    session_ttl: Duration,
    auth_tx: broadcast::Sender<AuthChange>,
}

impl LocalRecordStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self::with_crypto(db, CryptoService::new())
    }

    /// Uses a caller-supplied crypto service (e.g. a cheaper work factor in tests).
    pub fn with_crypto(db: Arc<Database>, crypto: CryptoService) -> Self {
        let (auth_tx, _) = broadcast::channel(AUTH_CHANNEL_CAPACITY);
        Self {
            db,
            crypto,
            session_ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
            auth_tx,
        }
    }

    /// Overrides the access token lifetime.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    fn emit(&self, change: AuthChange) {
        // No receivers is fine.
        let _ = self.auth_tx.send(change);
    }

    /// Reads a single `Link` row into a struct.
    fn row_to_link(row: &rusqlite::Row) -> rusqlite::Result<Link> {
        let created_ms: i64 = row.get(5)?;
        Ok(Link {
            id: row.get(0)?,
            url: row.get(1)?,
            title: row.get(2)?,
            icon: row.get(3)?,
            category: row.get(4)?,
            created_at: DateTime::from_timestamp_millis(created_ms).unwrap_or_default(),
            owner_id: row.get(6)?,
        })
    }

    /// Creates a session row for `user`, marks it as the only active one and returns it.
    fn issue_session(&self, conn: &Connection, user: Identity) -> Result<Session, RemoteError> {
        let access_token = self.crypto.generate_token()?;
        let refresh_token = self.crypto.generate_token()?;
        let expires_at = Utc::now() + self.session_ttl;

        conn.execute("UPDATE auth_sessions SET active = 0 WHERE active = 1", [])?;
        conn.execute(
            "INSERT INTO auth_sessions (access_token, refresh_token, user_id, expires_at, active) VALUES (?1, ?2, ?3, ?4, 1)",
            params![access_token, refresh_token, user.id, expires_at.timestamp_millis()],
        )?;

        Ok(Session {
            user,
            access_token,
            refresh_token: Some(refresh_token),
            expires_at,
            remember: true,
        })
    }

    /// Resolves the owner behind an access token.
    fn authorize(conn: &Connection, session: &Session) -> Result<String, RemoteError> {
        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT user_id, expires_at FROM auth_sessions WHERE access_token = ?1",
                params![session.access_token],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((user_id, expires_ms)) if expires_ms > Utc::now().timestamp_millis() => Ok(user_id),
            Some(_) => Err(RemoteError::Unauthorized("JWT expired".to_string())),
            None => Err(RemoteError::Unauthorized("Invalid access token".to_string())),
        }
    }

    /// Counts the links visible to `owner`.
    pub fn count_links(&self, owner: &str) -> Result<i64, RemoteError> {
        let count = self.db.connection().query_row(
            "SELECT COUNT(*) FROM links WHERE user_id = ?1",
            params![owner],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[async_trait]
impl RemoteRecordStore for LocalRecordStore {
    async fn sign_up(&self, credentials: &Credentials) -> Result<Session, RemoteError> {
        let email = Self::normalize_email(&credentials.email);
        if email.is_empty() || credentials.password.is_empty() {
            return Err(RemoteError::Rejected("Email and password are required".to_string()));
        }

        let salt = self.crypto.generate_salt()?;
        let hash = self.crypto.hash_password(&credentials.password, &salt)?;
        let user = Identity {
            id: Uuid::new_v4().to_string(),
            email: Some(email.clone()),
        };

        let session = {
            let conn = self.db.connection();
            let exists: i64 = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )?;
            if exists > 0 {
                return Err(RemoteError::Rejected("User already registered".to_string()));
            }
            conn.execute(
                "INSERT INTO users (id, email, password_hash, salt, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![user.id, email, hash, salt, Utc::now().timestamp()],
            )?;
            self.issue_session(&conn, user)?
        };

        info!(user_id = %session.user.id, "account registered");
        self.emit(AuthChange::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, RemoteError> {
        let email = Self::normalize_email(&credentials.email);

        let session = {
            let conn = self.db.connection();
            let row: Option<(String, Vec<u8>, Vec<u8>)> = conn
                .query_row(
                    "SELECT id, password_hash, salt FROM users WHERE email = ?1",
                    params![email],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?;

            let Some((user_id, hash, salt)) = row else {
                return Err(RemoteError::Rejected("Invalid login credentials".to_string()));
            };
            if !self.crypto.verify_password(&credentials.password, &salt, &hash) {
                return Err(RemoteError::Rejected("Invalid login credentials".to_string()));
            }

            let user = Identity {
                id: user_id,
                email: Some(email),
            };
            self.issue_session(&conn, user)?
        };

        debug!(user_id = %session.user.id, "signed in");
        self.emit(AuthChange::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        let revoked = self
            .db
            .connection()
            .execute("DELETE FROM auth_sessions WHERE active = 1", [])?;
        if revoked > 0 {
            self.emit(AuthChange::SignedOut);
        }
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<Session>, RemoteError> {
        let row = {
            let conn = self.db.connection();
            conn.query_row(
                "SELECT s.access_token, s.refresh_token, s.expires_at, u.id, u.email \
                 FROM auth_sessions s JOIN users u ON u.id = s.user_id \
                 WHERE s.active = 1 LIMIT 1",
                [],
                |row| {
                    let expires_ms: i64 = row.get(2)?;
                    Ok(Session {
                        access_token: row.get(0)?,
                        refresh_token: row.get(1)?,
                        expires_at: DateTime::from_timestamp_millis(expires_ms).unwrap_or_default(),
                        user: Identity {
                            id: row.get(3)?,
                            email: row.get(4)?,
                        },
                        remember: true,
                    })
                },
            )
            .optional()?
        };

        match row {
            Some(session) if session.is_expired() => {
                self.db.connection().execute(
                    "DELETE FROM auth_sessions WHERE access_token = ?1",
                    params![session.access_token],
                )?;
                debug!(user_id = %session.user.id, "active session expired");
                self.emit(AuthChange::Expired);
                Ok(None)
            }
            other => Ok(other),
        }
    }

    fn auth_changes(&self) -> broadcast::Receiver<AuthChange> {
        self.auth_tx.subscribe()
    }

    async fn select_links(&self, session: &Session) -> Result<Vec<Link>, RemoteError> {
        let conn = self.db.connection();
        let owner = Self::authorize(&conn, session)?;

        let mut stmt = conn.prepare(
            "SELECT id, url, title, icon, category, created_at, user_id \
             FROM links WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt.query_map(params![owner], Self::row_to_link)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    async fn insert_link(&self, session: &Session, link: &NewLink) -> Result<Link, RemoteError> {
        let conn = self.db.connection();
        let owner = Self::authorize(&conn, session)?;

        let created = Link {
            id: Uuid::new_v4().to_string(),
            url: link.url.clone(),
            title: link.title.clone(),
            icon: link.icon.clone(),
            category: link.category.clone(),
            created_at: Utc::now(),
            owner_id: owner,
        };

        conn.execute(
            "INSERT INTO links (id, user_id, url, title, icon, category, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                created.id,
                created.owner_id,
                created.url,
                created.title,
                created.icon,
                created.category,
                created.created_at.timestamp_millis()
            ],
        )?;

        Ok(created)
    }

    async fn update_link(&self, session: &Session, id: &str, patch: &LinkPatch) -> Result<(), RemoteError> {
        let conn = self.db.connection();
        let owner = Self::authorize(&conn, session)?;

        // Build the SET clause from whichever fields the patch carries
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<String> = Vec::new();
        let fields = [
            ("url", &patch.url),
            ("title", &patch.title),
            ("icon", &patch.icon),
            ("category", &patch.category),
        ];
        for (column, value) in fields {
            if let Some(v) = value {
                values.push(v.clone());
                clauses.push(format!("{} = ?{}", column, values.len()));
            }
        }

        let affected = if clauses.is_empty() {
            // Nothing to change, still report unknown ids
            conn.query_row(
                "SELECT COUNT(*) FROM links WHERE id = ?1 AND user_id = ?2",
                params![id, owner],
                |row| row.get::<_, i64>(0),
            )? as usize
        } else {
            values.push(id.to_string());
            let id_idx = values.len();
            values.push(owner);
            let owner_idx = values.len();
            let sql = format!(
                "UPDATE links SET {} WHERE id = ?{} AND user_id = ?{}",
                clauses.join(", "),
                id_idx,
                owner_idx
            );
            conn.execute(&sql, params_from_iter(values.iter()))?
        };

        if affected == 0 {
            return Err(RemoteError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete_link(&self, session: &Session, id: &str) -> Result<(), RemoteError> {
        let conn = self.db.connection();
        let owner = Self::authorize(&conn, session)?;
        conn.execute(
            "DELETE FROM links WHERE id = ?1 AND user_id = ?2",
            params![id, owner],
        )?;
        Ok(())
    }

    async fn reassign_category(&self, session: &Session, from: &str, to: &str) -> Result<u64, RemoteError> {
        let conn = self.db.connection();
        let owner = Self::authorize(&conn, session)?;
        let affected = conn.execute(
            "UPDATE links SET category = ?1 WHERE user_id = ?2 AND category = ?3",
            params![to, owner, from],
        )?;
        Ok(affected as u64)
    }
}
