//! Signed-in identity and the shared record store.
//!
//! Focus totals, streaks and friendships live in a per-user document
//! store keyed by collection and id. [`RecordStore`] is the seam between
//! the domain services and whatever backs them; [`FileRecordStore`] keeps
//! everything in local JSON files. Auth state is exposed as a watch
//! channel rather than something callers poll.

pub mod file_store;
pub mod focus;
pub mod friends;
pub mod reporter;
pub mod streaks;

pub use file_store::FileRecordStore;
pub use focus::FocusRecord;
pub use friends::{FriendEntry, FriendError, FriendRequest, RequestStatus};
pub use reporter::CompletionReporter;
pub use streaks::StreakRecord;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;

use crate::error::AccountError;

/// The signed-in user, as the record services see them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl UserProfile {
    /// Name shown on leaderboards; falls back to a placeholder.
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or("User")
    }
}

/// Document store shared between this user and their friends.
///
/// Collections are flat namespaces of JSON documents; nested paths like
/// `users/{uid}/friends` name per-user collections. Implementations are
/// free to be files, a database or a remote service.
pub trait RecordStore: Send + Sync {
    /// Who is signed in right now, if anyone.
    fn current_user(&self) -> Option<UserProfile>;

    /// Subscribe to sign-in state. The receiver sees the current value
    /// immediately and every change after it; nobody has to poll.
    fn watch_user(&self) -> watch::Receiver<Option<UserProfile>>;

    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, AccountError>;

    fn set(&self, collection: &str, id: &str, value: &Value) -> Result<(), AccountError>;

    /// Insert a document under a fresh id and return the id.
    fn add(&self, collection: &str, value: &Value) -> Result<String, AccountError>;

    /// All documents in a collection, in no particular order.
    fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, AccountError>;
}

/// Decode a stored document, attributing failures to its collection.
pub(crate) fn decode<T: DeserializeOwned>(
    collection: &str,
    value: Value,
) -> Result<T, AccountError> {
    serde_json::from_value(value).map_err(|e| AccountError::Malformed {
        collection: collection.to_string(),
        message: e.to_string(),
    })
}

/// Encode a document for storage.
pub(crate) fn encode<T: Serialize>(collection: &str, value: &T) -> Result<Value, AccountError> {
    serde_json::to_value(value).map_err(|e| AccountError::Malformed {
        collection: collection.to_string(),
        message: e.to_string(),
    })
}
