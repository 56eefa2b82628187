//! Countdown engine.
//!
//! The engine is a plain state machine over whole seconds. It has no internal
//! clock and schedules nothing - the session host calls `tick()` once per
//! second while the countdown is running, and every command is a synchronous
//! mutation. Persistence and broadcasting are the caller's concern.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Running --tick..--> Running --tick(==0)--> Finished
//! Running --pause--> Paused --start--> Running
//! {any} --reset/set_duration--> Idle
//! Finished --start--> Running   (manual restart from a full countdown)
//! ```

use serde::{Deserialize, Serialize};

/// 25 minutes, the out-of-box session length.
pub const DEFAULT_SESSION_SECS: u32 = 25 * 60;

/// Smallest custom duration accepted at the boundary.
pub const MIN_CUSTOM_MINUTES: u32 = 1;
/// Largest custom duration accepted at the boundary.
pub const MAX_CUSTOM_MINUTES: u32 = 120;

/// Derived phase of the countdown, for display and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
    Finished,
}

/// Read-only view of the countdown, embedded in command replies and
/// printed by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub remaining_secs: u32,
    pub total_secs: u32,
    pub running: bool,
    pub phase: TimerPhase,
}

/// What a single `tick()` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// One second elapsed; the countdown continues.
    Counted,
    /// This tick brought the countdown to zero. Carries the whole minutes
    /// of the configured session length (a 3-second session completes 0).
    Finished { minutes_completed: u32 },
}

/// Core countdown state machine.
///
/// Invariants held after every operation:
/// - `remaining_secs <= total_secs`
/// - `running` implies `remaining_secs > 0`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerEngine {
    remaining_secs: u32,
    total_secs: u32,
    running: bool,
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_SECS)
    }
}

impl TimerEngine {
    /// Create a paused engine with a full countdown of `total_secs`.
    pub fn new(total_secs: u32) -> Self {
        let total_secs = total_secs.max(1);
        Self {
            remaining_secs: total_secs,
            total_secs,
            running: false,
        }
    }

    /// Rebuild an engine from persisted parts, clamping into the invariants.
    /// `remaining` is capped at `total`; a running flag with nothing left to
    /// count is demoted to paused.
    pub(crate) fn from_parts(remaining_secs: u32, total_secs: u32, running: bool) -> Self {
        let total_secs = total_secs.max(1);
        let remaining_secs = remaining_secs.min(total_secs);
        Self {
            remaining_secs,
            total_secs,
            running: running && remaining_secs > 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn total_secs(&self) -> u32 {
        self.total_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn phase(&self) -> TimerPhase {
        if self.running {
            TimerPhase::Running
        } else if self.remaining_secs == 0 {
            TimerPhase::Finished
        } else if self.remaining_secs == self.total_secs {
            TimerPhase::Idle
        } else {
            TimerPhase::Paused
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            remaining_secs: self.remaining_secs,
            total_secs: self.total_secs,
            running: self.running,
            phase: self.phase(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin (or resume) the countdown. Returns `false` when already
    /// running - starting is idempotent and must never stack a second
    /// tick schedule.
    ///
    /// From `Finished` the countdown is restored to the full session
    /// length first, so `running` never coexists with an empty countdown.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        if self.remaining_secs == 0 {
            self.remaining_secs = self.total_secs;
        }
        self.running = true;
        true
    }

    /// Stop counting down without touching the remaining time. Returns
    /// `false` when already paused.
    pub fn pause(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        true
    }

    /// Pause and rewind the countdown to the full session length.
    pub fn reset(&mut self) {
        self.running = false;
        self.remaining_secs = self.total_secs;
    }

    /// Pause and adopt a new session length. Callers validate the
    /// 1..=120 minute range at the boundary; the engine only clamps
    /// against zero.
    pub fn set_duration_minutes(&mut self, minutes: u32) {
        self.running = false;
        self.total_secs = minutes.saturating_mul(60).max(1);
        self.remaining_secs = self.total_secs;
    }

    /// Advance the countdown by one second. Returns `None` when not
    /// running (a stray tick against a paused engine is a no-op).
    pub fn tick(&mut self) -> Option<TickOutcome> {
        if !self.running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.running = false;
            Some(TickOutcome::Finished {
                minutes_completed: self.total_secs / 60,
            })
        } else {
            Some(TickOutcome::Counted)
        }
    }
}
