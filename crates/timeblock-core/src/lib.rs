//! # TimeBlock Core Library
//!
//! This library provides the core logic for the TimeBlock focus timer.
//! It implements a CLI-first philosophy where every operation is available
//! through a standalone CLI binary, with any GUI shell being a thin layer
//! over the same core library.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a plain countdown state machine; the session host
//!   ticks it once per second and reconciles it against the wall clock at
//!   startup
//! - **Session Host**: one task that owns the engine, answers commands and
//!   broadcasts state changes to any number of observers
//! - **Storage**: SQLite-backed key-value state and TOML configuration
//! - **Account**: signed-in identity plus focus totals, streaks and
//!   friendships in a shared record store
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: core countdown state machine
//! - [`session::spawn`]: the serialized session host
//! - [`Command`] / [`Event`]: the wire surface
//! - [`Config`]: application configuration management

pub mod account;
pub mod command;
pub mod error;
pub mod events;
pub mod notify;
pub mod session;
pub mod storage;
pub mod tally;
pub mod timer;

pub use account::{CompletionReporter, FileRecordStore, RecordStore, UserProfile};
pub use command::{apply_command, parse_request, Command, CommandReply};
pub use error::{AccountError, ConfigError, StoreError, ValidationError};
pub use events::Event;
pub use notify::{LogNotifier, Notifier};
pub use session::{SessionConfig, SessionHandle};
pub use storage::{Config, MemoryStore, SqliteStore, StateStore};
pub use tally::{DailyTally, LastSession};
pub use timer::{TimerEngine, TimerPhase, TimerSnapshot};
