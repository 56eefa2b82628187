//! Subcommand implementations plus the plumbing they share.

use std::sync::Arc;

use tokio::task::JoinHandle;

use timeblock_core::account::{FileRecordStore, RecordStore};
use timeblock_core::error::AccountError;
use timeblock_core::notify::Notifier;
use timeblock_core::session::{self, SessionConfig, SessionHandle};
use timeblock_core::storage::{Config, SqliteStore};
use timeblock_core::{CommandReply, CompletionReporter, UserProfile};

pub mod account;
pub mod config;
pub mod serve;
pub mod social;
pub mod stats;
pub mod timer;

/// Notifications land on stderr so stdout stays machine readable.
struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, title: &str, message: &str) {
        eprintln!("{title}: {message}");
    }
}

fn require_user(records: &FileRecordStore) -> Result<UserProfile, AccountError> {
    records.current_user().ok_or(AccountError::NotSignedIn)
}

fn print_reply(reply: &CommandReply) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(reply)?);
    Ok(())
}

/// A live session host wired to the on-disk stores. Completions are
/// credited to the signed-in account, if any.
fn open_session(
    config: &Config,
) -> Result<(SessionHandle, JoinHandle<()>, Arc<FileRecordStore>), Box<dyn std::error::Error>> {
    let store = SqliteStore::open()?;
    let records = Arc::new(FileRecordStore::open_default()?);
    let (handle, join) = session::spawn(SessionConfig {
        store: Arc::new(store),
        notifier: Arc::new(StderrNotifier),
        reporter: Some(CompletionReporter::new(records.clone())),
        default_total_secs: config.default_total_secs(),
        notifications_enabled: config.notifications.enabled,
    });
    Ok((handle, join, records))
}
