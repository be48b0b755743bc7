use thiserror::Error;

// === RemoteError ===

/// Failures reported by a record store implementation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RemoteError {
    /// No row matched the request (or it belongs to another owner).
    #[error("Record not found: {0}")]
    NotFound(String),
    /// The credential was missing, expired or rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// The service refused the request (bad credentials, duplicate account, ...).
    #[error("Request rejected: {0}")]
    Rejected(String),
    /// The transport failed before a response arrived.
    #[error("Network error: {0}")]
    Network(String),
    /// The service answered with a server-side failure.
    #[error("Service error: {0}")]
    Service(String),
    /// The response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
    /// The backing database failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for RemoteError {
    fn from(e: rusqlite::Error) -> Self {
        RemoteError::Storage(e.to_string())
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RemoteError::Decode(e.to_string())
        } else {
            RemoteError::Network(e.to_string())
        }
    }
}

// === AuthError ===

/// Errors surfaced by sign-in and sign-up, shown inline on the login form.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthError {
    /// The email/password pair was rejected.
    #[error("Invalid login credentials: {0}")]
    InvalidCredentials(String),
    /// The auth service could not be reached.
    #[error("Auth network error: {0}")]
    Network(String),
    /// The auth service failed.
    #[error("Auth service error: {0}")]
    Service(String),
}

impl From<RemoteError> for AuthError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::Unauthorized(msg) | RemoteError::Rejected(msg) | RemoteError::NotFound(msg) => {
                AuthError::InvalidCredentials(msg)
            }
            RemoteError::Network(msg) => AuthError::Network(msg),
            other => AuthError::Service(other.to_string()),
        }
    }
}

// === FetchError ===

/// Failure while listing links. Logged and treated as an empty result.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Link fetch failed: {0}")]
pub struct FetchError(#[from] pub RemoteError);

// === LinkError ===

/// Errors from link and category mutations. Surfaced to the user as an alert.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LinkError {
    /// No session is active.
    #[error("Not signed in")]
    NotAuthenticated,
    /// The link does not exist or is not owned by the current user.
    #[error("Link not found: {0}")]
    NotFound(String),
    /// The record store rejected or failed the mutation.
    #[error("Link update failed: {0}")]
    Remote(String),
}

impl From<RemoteError> for LinkError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::NotFound(id) => LinkError::NotFound(id),
            RemoteError::Unauthorized(_) => LinkError::NotAuthenticated,
            other => LinkError::Remote(other.to_string()),
        }
    }
}

// === ValidationError ===

/// Required form fields missing before any remote call is attempted.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("URL is required")]
    MissingUrl,
    #[error("Title is required")]
    MissingTitle,
}

// === StorageError ===

/// Errors from local key/value persistence.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StorageError {
    /// Database operation failed.
    #[error("Local storage database error: {0}")]
    DatabaseError(String),
    /// Stored value could not be (de)serialized.
    #[error("Local storage serialization error: {0}")]
    SerializationError(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::DatabaseError(e.to_string())
    }
}

impl From<StorageError> for RemoteError {
    fn from(e: StorageError) -> Self {
        RemoteError::Storage(e.to_string())
    }
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// The provided settings key is invalid.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The provided settings value is invalid.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}
