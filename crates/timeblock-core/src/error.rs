//! Error types for timeblock-core.
//!
//! One thiserror enum per concern. Nothing in this crate treats an error
//! as fatal: persistence and broadcast failures are logged and swallowed
//! at the session layer, validation failures are reported back to the
//! caller.

use std::path::PathBuf;
use thiserror::Error;

/// Durable state store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("could not open state store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// The platform data directory could not be created.
    #[error("data directory unavailable: {0}")]
    DataDir(#[from] std::io::Error),

    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Another process holds the database.
    #[error("state store is locked")]
    Locked,
}

/// Configuration file errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config at {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    #[error("could not write config at {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("unknown configuration key: {0}")]
    UnknownKey(String),

    #[error("malformed configuration: {0}")]
    ParseFailed(String),
}

/// Identity and record store errors.
#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Not signed in")]
    NotSignedIn,

    /// The records directory could not be read or written.
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    /// A stored document does not match the expected shape.
    #[error("malformed record in {collection}: {message}")]
    Malformed { collection: String, message: String },
}

/// Boundary validation errors for user-supplied input.
///
/// Display strings double as the user-visible messages, matching the
/// wording shown next to the custom-duration form field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Custom duration field left empty.
    #[error("Enter a duration")]
    MissingDuration,

    /// Below the 1-minute floor (or not a number at all).
    #[error("Minimum 1 minute")]
    DurationTooShort,

    /// Above the 120-minute ceiling.
    #[error("Maximum 120 minutes")]
    DurationTooLong,
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, _) = &err {
            if code.code == rusqlite::ErrorCode::DatabaseLocked {
                return StoreError::Locked;
            }
        }
        StoreError::QueryFailed(err.to_string())
    }
}

impl From<std::io::Error> for AccountError {
    fn from(err: std::io::Error) -> Self {
        AccountError::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for AccountError {
    fn from(err: serde_json::Error) -> Self {
        AccountError::Unavailable(err.to_string())
    }
}
