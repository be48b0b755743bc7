//! App Core for LinkVault.
//!
//! Wires the record store, local state, session manager and link store
//! together and keeps the link store bound to whichever session is current.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::database::connection::Database;
use crate::database::local_state::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
use crate::managers::link_store::{AlertSink, LinkStore, LogAlertSink};
use crate::managers::listeners::Subscription;
use crate::managers::session_manager::{SessionManager, SessionManagerTrait};
use crate::platform;
use crate::services::local_record_store::LocalRecordStore;
use crate::services::record_store::RemoteRecordStore;
use crate::services::supabase_store::SupabaseStore;
use crate::types::session::{Session, SessionEvent};
use crate::types::settings::{Backend, ClientSettings};

/// Central application struct holding the stores and managers.
pub struct App {
    pub db: Arc<Database>,
    pub remote: Arc<dyn RemoteRecordStore>,
    pub session_manager: Arc<SessionManager>,
    pub link_store: Arc<LinkStore>,
    session_events: Option<mpsc::UnboundedReceiver<SessionEvent>>,
    _session_link: Subscription,
    tasks: Vec<JoinHandle<()>>,
}

impl App {
    /// Opens the database named in `settings` and builds the configured backend.
    pub fn new(settings: &ClientSettings) -> Result<Self, Box<dyn std::error::Error>> {
        let db_path = settings
            .storage
            .database_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(platform::default_database_path);
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Arc::new(Database::open(&db_path)?);
        debug!(path = %db_path.display(), "database opened");
        Self::with_database(settings, db)
    }

    /// Builds the app on an already opened database.
    pub fn with_database(settings: &ClientSettings, db: Arc<Database>) -> Result<Self, Box<dyn std::error::Error>> {
        let durable: Arc<dyn KeyValueStore> = Arc::new(SqliteKeyValueStore::new(db.clone()));

        let remote: Arc<dyn RemoteRecordStore> = match settings.remote.backend {
            Backend::Local => Arc::new(LocalRecordStore::new(db.clone())),
            Backend::Supabase => {
                if settings.remote.url.is_empty() {
                    return Err("remote.url must be set for the Supabase backend".into());
                }
                Arc::new(SupabaseStore::new(
                    &settings.remote.url,
                    &settings.remote.anon_key,
                    durable.clone(),
                )?)
            }
        };
        info!(backend = ?settings.remote.backend, "record store ready");

        Ok(Self::with_components(
            db,
            remote,
            durable,
            Arc::new(MemoryKeyValueStore::new()),
            Arc::new(LogAlertSink),
        ))
    }

    /// Assembles the app from explicit parts.
    pub fn with_components(
        db: Arc<Database>,
        remote: Arc<dyn RemoteRecordStore>,
        durable: Arc<dyn KeyValueStore>,
        volatile: Arc<dyn KeyValueStore>,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        let session_manager = Arc::new(SessionManager::new(remote.clone(), durable, volatile));
        let link_store = Arc::new(LinkStore::new(remote.clone(), alerts));

        let (tx, rx) = mpsc::unbounded_channel();
        let session_link = session_manager.subscribe(move |event: &SessionEvent| {
            // Receiver gone means the app is shutting down
            let _ = tx.send(event.clone());
        });

        Self {
            db,
            remote,
            session_manager,
            link_store,
            session_events: Some(rx),
            _session_link: session_link,
            tasks: Vec::new(),
        }
    }

    /// Starts the background listeners and runs the cold-start session check.
    ///
    /// Must be called from within a tokio runtime. Returns the restored session.
    pub async fn startup(&mut self) -> Option<Session> {
        if let Some(mut events) = self.session_events.take() {
            let store = self.link_store.clone();
            self.tasks.push(tokio::spawn(async move {
                while let Some(event) = events.recv().await {
                    bind_link_store(&store, event.session().cloned()).await;
                }
            }));
        }
        self.tasks.push(self.session_manager.spawn_remote_listener());

        let session = self.session_manager.initialize().await;
        self.sync_links().await;
        session
    }

    /// Binds the link store to the current session now instead of waiting
    /// for the background forwarder.
    pub async fn sync_links(&self) {
        bind_link_store(&self.link_store, self.session_manager.current_session()).await;
    }

    /// Stops the background listeners.
    pub fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        debug!("app shut down");
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Points `store` at `session`.
///
/// The same credential is a no-op and a refreshed token for the bound user is
/// swapped in place. Anything else resets the store.
async fn bind_link_store(store: &LinkStore, session: Option<Session>) {
    let unchanged = match (store.session(), session.as_ref()) {
        (Some(bound), Some(next)) => bound.access_token == next.access_token,
        (None, None) => true,
        _ => false,
    };
    if unchanged {
        return;
    }
    if let Some(next) = &session {
        if store.renew_session(next.clone()) {
            return;
        }
    }
    store.set_session(session).await;
}
