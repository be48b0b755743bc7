//! SQLite database connection management for LinkVault.
//!
//! Provides the [`Database`] struct that wraps a `rusqlite::Connection`
//! behind a mutex and runs schema migrations on open.

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::migrations;

/// Shared handle to the local SQLite database.
///
/// The connection sits behind a `Mutex` so the database can be shared through
/// `Arc` by async components. Guards must not be held across an `.await`.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens (or creates) a SQLite database at the given file path and runs migrations.
    ///
    /// # Errors
    /// Returns `rusqlite::Error` if the connection cannot be established or migrations fail.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        migrations::run_all(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens an in-memory SQLite database and runs migrations.
    ///
    /// The database is discarded when the `Database` is dropped.
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        migrations::run_all(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Locks and returns the underlying connection.
    ///
    /// A poisoned lock is recovered.
    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
