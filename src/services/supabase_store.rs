//! HTTP record store for a Supabase-style backend.
//!
//! Links go through PostgREST (`/rest/v1/links`) and auth through GoTrue
//! (`/auth/v1/*`). The current auth session is persisted as JSON in an
//! injected durable [`KeyValueStore`], so `get_session` survives restarts the
//! way the hosted JS client does.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::database::local_state::KeyValueStore;
use crate::services::record_store::{RemoteRecordStore, AUTH_CHANNEL_CAPACITY};
use crate::types::errors::RemoteError;
use crate::types::link::{Link, LinkPatch, NewLink};
use crate::types::session::{AuthChange, Credentials, Identity, Session};

/// Storage key of the persisted auth session.
pub const AUTH_SESSION_KEY: &str = "linkvault_auth_session";

/// GoTrue token grant response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: Option<Identity>,
}

/// Record store client for a hosted Supabase project.
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    anon_key: String,
    storage: Arc<dyn KeyValueStore>,
    auth_tx: broadcast::Sender<AuthChange>,
}

impl SupabaseStore {
    /// Creates a client for the project at `base_url`.
    pub fn new(
        base_url: &str,
        anon_key: &str,
        storage: Arc<dyn KeyValueStore>,
    ) -> Result<Self, RemoteError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(anon_key)
            .map_err(|e| RemoteError::Rejected(format!("Invalid API key: {}", e)))?;
        headers.insert("apikey", key);

        let client = Client::builder().default_headers(headers).build()?;
        let (auth_tx, _) = broadcast::channel(AUTH_CHANNEL_CAPACITY);

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            storage,
            auth_tx,
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn links_url(&self) -> String {
        format!("{}/rest/v1/links", self.base_url)
    }

    /// Attaches the bearer credential. Anonymous calls use the anon key.
    fn bearer(&self, builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        let token = token.unwrap_or(&self.anon_key);
        builder.header(AUTHORIZATION, format!("Bearer {}", token))
    }

    fn emit(&self, change: AuthChange) {
        let _ = self.auth_tx.send(change);
    }

    /// Picks the human-readable message out of a GoTrue or PostgREST error body.
    fn error_message(body: &str) -> String {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        parsed
            .as_ref()
            .and_then(|v| {
                ["error_description", "msg", "message", "error"]
                    .iter()
                    .find_map(|k| v.get(*k).and_then(Value::as_str))
            })
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string())
    }

    /// Maps non-success statuses onto [`RemoteError`].
    async fn check(response: Response) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = Self::error_message(&body);
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RemoteError::Unauthorized(message),
            StatusCode::NOT_FOUND => RemoteError::NotFound(message),
            s if s.is_client_error() => RemoteError::Rejected(message),
            _ => RemoteError::Service(format!("{}: {}", status, message)),
        })
    }

    fn session_from_token(token: TokenResponse) -> Result<Session, RemoteError> {
        let access_token = token
            .access_token
            .ok_or_else(|| RemoteError::Rejected("Email confirmation required".to_string()))?;
        let user = token
            .user
            .ok_or_else(|| RemoteError::Decode("Token response without user".to_string()))?;
        let expires_at = match (token.expires_at, token.expires_in) {
            (Some(at), _) => DateTime::from_timestamp(at, 0).unwrap_or_default(),
            (None, Some(secs)) => Utc::now() + Duration::seconds(secs),
            (None, None) => Utc::now() + Duration::hours(1),
        };
        Ok(Session {
            user,
            access_token,
            refresh_token: token.refresh_token,
            expires_at,
            remember: true,
        })
    }

    fn load_session(&self) -> Result<Option<Session>, RemoteError> {
        let Some(raw) = self.storage.get(AUTH_SESSION_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!(error = %e, "discarding unreadable persisted session");
                self.storage.remove(AUTH_SESSION_KEY)?;
                Ok(None)
            }
        }
    }

    fn save_session(&self, session: &Session) -> Result<(), RemoteError> {
        let raw = serde_json::to_string(session).map_err(|e| RemoteError::Decode(e.to_string()))?;
        self.storage.set(AUTH_SESSION_KEY, &raw)?;
        Ok(())
    }

    async fn grant(&self, grant_type: &str, body: Value) -> Result<Session, RemoteError> {
        let request = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", grant_type)])
            .json(&body);
        let response = Self::check(self.bearer(request, None).send().await?).await?;
        let token: TokenResponse = response.json().await?;
        Self::session_from_token(token)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, RemoteError> {
        let session = self
            .grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await?;
        self.save_session(&session)?;
        self.emit(AuthChange::TokenRefreshed(session.clone()));
        Ok(session)
    }

    fn owner_filter(session: &Session) -> String {
        format!("eq.{}", session.owner_id())
    }
}

#[async_trait]
impl RemoteRecordStore for SupabaseStore {
    async fn sign_up(&self, credentials: &Credentials) -> Result<Session, RemoteError> {
        let request = self.client.post(self.auth_url("signup")).json(&json!({
            "email": credentials.email,
            "password": credentials.password,
        }));
        let response = Self::check(self.bearer(request, None).send().await?).await?;
        let token: TokenResponse = response.json().await?;
        let session = Self::session_from_token(token)?;
        self.save_session(&session)?;
        self.emit(AuthChange::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, RemoteError> {
        let session = self
            .grant(
                "password",
                json!({ "email": credentials.email, "password": credentials.password }),
            )
            .await?;
        self.save_session(&session)?;
        self.emit(AuthChange::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        let Some(session) = self.load_session()? else {
            return Ok(());
        };
        self.storage.remove(AUTH_SESSION_KEY)?;
        self.emit(AuthChange::SignedOut);

        let request = self.client.post(self.auth_url("logout"));
        let response = self.bearer(request, Some(session.access_token.as_str())).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<Session>, RemoteError> {
        let Some(session) = self.load_session()? else {
            return Ok(None);
        };
        if !session.is_expired() {
            return Ok(Some(session));
        }

        let Some(refresh_token) = session.refresh_token.as_deref() else {
            self.storage.remove(AUTH_SESSION_KEY)?;
            self.emit(AuthChange::Expired);
            return Ok(None);
        };

        match self.refresh(refresh_token).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(RemoteError::Rejected(msg)) | Err(RemoteError::Unauthorized(msg)) => {
                debug!(reason = %msg, "refresh token rejected");
                self.storage.remove(AUTH_SESSION_KEY)?;
                self.emit(AuthChange::Expired);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn auth_changes(&self) -> broadcast::Receiver<AuthChange> {
        self.auth_tx.subscribe()
    }

    async fn select_links(&self, session: &Session) -> Result<Vec<Link>, RemoteError> {
        let request = self.client.get(self.links_url()).query(&[
            ("select", "*".to_string()),
            ("user_id", Self::owner_filter(session)),
            ("order", "created_at.desc".to_string()),
        ]);
        let response = Self::check(self.bearer(request, Some(session.access_token.as_str())).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn insert_link(&self, session: &Session, link: &NewLink) -> Result<Link, RemoteError> {
        let request = self
            .client
            .post(self.links_url())
            .header("Prefer", "return=representation")
            .json(&json!({
                "url": link.url,
                "title": link.title,
                "icon": link.icon,
                "category": link.category,
                "user_id": session.owner_id(),
            }));
        let response = Self::check(self.bearer(request, Some(session.access_token.as_str())).send().await?).await?;
        let mut rows: Vec<Link> = response.json().await?;
        if rows.is_empty() {
            return Err(RemoteError::Decode("Insert returned no row".to_string()));
        }
        Ok(rows.swap_remove(0))
    }

    async fn update_link(&self, session: &Session, id: &str, patch: &LinkPatch) -> Result<(), RemoteError> {
        let filters = [
            ("id", format!("eq.{}", id)),
            ("user_id", Self::owner_filter(session)),
        ];

        let request = if patch.is_empty() {
            self.client
                .get(self.links_url())
                .query(&[("select", "id".to_string())])
                .query(&filters)
        } else {
            self.client
                .patch(self.links_url())
                .query(&filters)
                .header("Prefer", "return=representation")
                .json(patch)
        };
        let response = Self::check(self.bearer(request, Some(session.access_token.as_str())).send().await?).await?;
        let rows: Vec<Value> = response.json().await?;
        if rows.is_empty() {
            return Err(RemoteError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete_link(&self, session: &Session, id: &str) -> Result<(), RemoteError> {
        let request = self.client.delete(self.links_url()).query(&[
            ("id", format!("eq.{}", id)),
            ("user_id", Self::owner_filter(session)),
        ]);
        Self::check(self.bearer(request, Some(session.access_token.as_str())).send().await?).await?;
        Ok(())
    }

    async fn reassign_category(&self, session: &Session, from: &str, to: &str) -> Result<u64, RemoteError> {
        let request = self
            .client
            .patch(self.links_url())
            .query(&[
                ("user_id", Self::owner_filter(session)),
                ("category", format!("eq.{}", from)),
            ])
            .header("Prefer", "return=representation")
            .json(&json!({ "category": to }));
        let response = Self::check(self.bearer(request, Some(session.access_token.as_str())).send().await?).await?;
        let rows: Vec<Value> = response.json().await?;
        Ok(rows.len() as u64)
    }
}
