//! JSON-file record store.
//!
//! One directory per collection, one `{id}.json` per document, and a
//! `session.json` holding the signed-in profile. Good enough for a single
//! machine, and the only [`RecordStore`] the CLI ships with.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::AccountError;
use crate::storage::data_dir;

use super::{RecordStore, UserProfile};

const SESSION_FILE: &str = "session.json";

pub struct FileRecordStore {
    root: PathBuf,
    // Guards session.json writes; document writes rely on distinct ids.
    session_lock: Mutex<()>,
    user_tx: watch::Sender<Option<UserProfile>>,
}

impl FileRecordStore {
    /// Open (and create) a record store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, AccountError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let session = read_session(&root.join(SESSION_FILE))?;
        let (user_tx, _) = watch::channel(session);
        Ok(Self {
            root,
            session_lock: Mutex::new(()),
            user_tx,
        })
    }

    /// Open the store under `records/` in the data directory.
    pub fn open_default() -> Result<Self, AccountError> {
        let root = data_dir()?.join("records");
        Self::open(root)
    }

    /// Record `profile` as the signed-in user and notify watchers.
    pub fn sign_in(&self, profile: UserProfile) -> Result<(), AccountError> {
        let _guard = self.lock_session()?;
        let raw = serde_json::to_string_pretty(&profile)?;
        fs::write(self.root.join(SESSION_FILE), raw)?;
        self.user_tx.send_replace(Some(profile));
        Ok(())
    }

    /// Drop the signed-in user and notify watchers.
    pub fn sign_out(&self) -> Result<(), AccountError> {
        let _guard = self.lock_session()?;
        let path = self.root.join(SESSION_FILE);
        if path.exists() {
            fs::remove_file(path)?;
        }
        self.user_tx.send_replace(None);
        Ok(())
    }

    fn lock_session(&self) -> Result<std::sync::MutexGuard<'_, ()>, AccountError> {
        self.session_lock
            .lock()
            .map_err(|_| AccountError::Unavailable("session lock poisoned".into()))
    }

    fn doc_path(&self, collection: &str, id: &str) -> PathBuf {
        self.root.join(collection).join(format!("{id}.json"))
    }
}

fn read_session(path: &Path) -> Result<Option<UserProfile>, AccountError> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl RecordStore for FileRecordStore {
    fn current_user(&self) -> Option<UserProfile> {
        self.user_tx.borrow().clone()
    }

    fn watch_user(&self) -> watch::Receiver<Option<UserProfile>> {
        self.user_tx.subscribe()
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, AccountError> {
        match fs::read_to_string(self.doc_path(collection, id)) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(
        &self,
        collection: &str,
        id: &str,
        value: &Value,
    ) -> Result<(), AccountError> {
        let path = self.doc_path(collection, id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(value)?;
        fs::write(path, raw)?;
        Ok(())
    }

    fn add(&self, collection: &str, value: &Value) -> Result<String, AccountError> {
        let id = Uuid::new_v4().to_string();
        self.set(collection, &id, value)?;
        Ok(id)
    }

    fn list(&self, collection: &str) -> Result<Vec<(String, Value)>, AccountError> {
        let dir = self.root.join(collection);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut docs = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().map(|ext| ext == "json") != Some(true) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let raw = fs::read_to_string(&path)?;
            docs.push((stem.to_string(), serde_json::from_str(&raw)?));
        }
        Ok(docs)
    }
}
