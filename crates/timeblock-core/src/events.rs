//! Events broadcast by the session host.
//!
//! Observers subscribe through [`crate::session::SessionHandle::subscribe`];
//! publishing is fire-and-forget and succeeds whether anyone is listening
//! or not.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerSnapshot;

/// Broadcast payloads, tagged for wire consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    /// The countdown moved or a command changed it.
    TimerUpdate {
        remaining_secs: u32,
        total_secs: u32,
        running: bool,
        at: DateTime<Utc>,
    },
    /// A full session just counted down to zero. Emitted at most once per
    /// session, never retroactively for time that drained while no host
    /// was alive.
    FocusComplete {
        minutes_completed: u32,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn timer_update(snapshot: &TimerSnapshot) -> Self {
        Event::TimerUpdate {
            remaining_secs: snapshot.remaining_secs,
            total_secs: snapshot.total_secs,
            running: snapshot.running,
            at: Utc::now(),
        }
    }

    pub fn focus_complete(minutes_completed: u32) -> Self {
        Event::FocusComplete {
            minutes_completed,
            at: Utc::now(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Event::TimerUpdate { at, .. } | Event::FocusComplete { at, .. } => *at,
        }
    }
}
