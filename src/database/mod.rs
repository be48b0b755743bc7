//! LinkVault database layer.
//!
//! Provides SQLite connection management and schema migrations.
//!
//! # Usage
//!
//! ```no_run
//! use linkvault::database::Database;
//!
//! // Open a persistent database
//! let db = Database::open("linkvault.db").expect("failed to open database");
//!
//! // Or use an in-memory database for testing
//! let db = Database::open_in_memory().expect("failed to open in-memory database");
//!
//! // Lock the connection for queries
//! let conn = db.connection();
//! ```

pub mod connection;
pub mod local_state;
pub mod migrations;

pub use connection::Database;
pub use local_state::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
