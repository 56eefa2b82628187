//! Startup reconciliation against the persisted checkpoint.
//!
//! The countdown keeps running on the wall clock even while no process is
//! alive to tick it. On startup the saved checkpoint is aged by the real
//! elapsed time before any command is accepted, so a session that should
//! have finished in the meantime is observed as finished exactly once.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

use crate::error::StoreError;
use crate::storage::store::StateStore;
use crate::timer::engine::TimerEngine;

/// Key the serialized checkpoint lives under in the state store.
pub const CHECKPOINT_KEY: &str = "timer_state";

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Persisted countdown state plus the moment it was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub remaining_secs: u32,
    pub total_secs: u32,
    pub running: bool,
    pub saved_at_ms: u64,
}

impl Checkpoint {
    pub fn of(engine: &TimerEngine, now_ms: u64) -> Self {
        Self {
            remaining_secs: engine.remaining_secs(),
            total_secs: engine.total_secs(),
            running: engine.is_running(),
            saved_at_ms: now_ms,
        }
    }

    /// Read the checkpoint back from the store. Any failure is logged and
    /// treated as "no checkpoint" so startup always proceeds.
    pub fn load(store: &dyn StateStore) -> Option<Self> {
        let raw = match store.get(CHECKPOINT_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "failed to read timer checkpoint");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(checkpoint) => Some(checkpoint),
            Err(e) => {
                warn!(error = %e, "discarding unreadable timer checkpoint");
                None
            }
        }
    }

    pub fn save(&self, store: &dyn StateStore) -> Result<(), StoreError> {
        let raw = serde_json::to_string(self)
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        store.set(CHECKPOINT_KEY, &raw)
    }
}

/// How the saved state related to the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Countdown was running and still has time left; it keeps running.
    Resumed,
    /// Countdown was running and ran out while nothing was ticking it.
    /// Worth a notification, but not a completion event.
    FinishedWhileAway { minutes_completed: u32 },
    /// Paused, finished, or fresh state; nothing to do.
    Unchanged,
}

/// Result of aging a checkpoint to `now_ms`.
#[derive(Debug)]
pub struct Reconciled {
    pub engine: TimerEngine,
    pub outcome: ReconcileOutcome,
}

/// Age `saved` by the wall-clock time since it was written.
///
/// Elapsed time is subtracted whether or not the countdown was running;
/// that matches how the state has always aged and keeps reconciliation a
/// pure function of the checkpoint and the clock. A countdown that was
/// running and has time left resumes by itself.
pub fn reconcile(saved: Option<Checkpoint>, default_total_secs: u32, now_ms: u64) -> Reconciled {
    let Some(saved) = saved else {
        return Reconciled {
            engine: TimerEngine::new(default_total_secs),
            outcome: ReconcileOutcome::Unchanged,
        };
    };

    let elapsed = now_ms.saturating_sub(saved.saved_at_ms) / 1000;
    let elapsed_secs = elapsed.min(u64::from(u32::MAX)) as u32;
    let remaining = saved.remaining_secs.saturating_sub(elapsed_secs);
    let mut engine = TimerEngine::from_parts(remaining, saved.total_secs, false);

    let outcome = if saved.running && remaining > 0 {
        engine.start();
        ReconcileOutcome::Resumed
    } else if saved.running {
        ReconcileOutcome::FinishedWhileAway {
            minutes_completed: engine.total_secs() / 60,
        }
    } else {
        ReconcileOutcome::Unchanged
    };

    Reconciled { engine, outcome }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::store::MemoryStore;
    use crate::timer::engine::{TimerPhase, DEFAULT_SESSION_SECS};

    fn saved(remaining: u32, total: u32, running: bool, at_ms: u64) -> Checkpoint {
        Checkpoint {
            remaining_secs: remaining,
            total_secs: total,
            running,
            saved_at_ms: at_ms,
        }
    }

    #[test]
    fn fresh_start_without_checkpoint() {
        let r = reconcile(None, DEFAULT_SESSION_SECS, 5_000);
        assert_eq!(r.engine.remaining_secs(), DEFAULT_SESSION_SECS);
        assert_eq!(r.engine.phase(), TimerPhase::Idle);
        assert_eq!(r.outcome, ReconcileOutcome::Unchanged);
    }

    #[test]
    fn running_checkpoint_resumes_aged() {
        let r = reconcile(Some(saved(100, 1500, true, 10_000)), 1500, 50_000);
        assert_eq!(r.engine.remaining_secs(), 60);
        assert!(r.engine.is_running());
        assert_eq!(r.outcome, ReconcileOutcome::Resumed);
    }

    #[test]
    fn running_checkpoint_that_drained_finishes_quietly() {
        let r = reconcile(Some(saved(10, 1500, true, 10_000)), 1500, 70_000);
        assert_eq!(r.engine.remaining_secs(), 0);
        assert!(!r.engine.is_running());
        assert_eq!(r.engine.phase(), TimerPhase::Finished);
        assert_eq!(
            r.outcome,
            ReconcileOutcome::FinishedWhileAway {
                minutes_completed: 25
            }
        );
    }

    #[test]
    fn drain_exactly_to_zero_counts_as_away_finish() {
        let r = reconcile(Some(saved(10, 600, true, 0)), 1500, 10_000);
        assert_eq!(r.engine.remaining_secs(), 0);
        assert_eq!(
            r.outcome,
            ReconcileOutcome::FinishedWhileAway {
                minutes_completed: 10
            }
        );
    }

    #[test]
    fn paused_checkpoint_still_loses_time() {
        let r = reconcile(Some(saved(100, 1500, false, 10_000)), 1500, 50_000);
        assert_eq!(r.engine.remaining_secs(), 60);
        assert!(!r.engine.is_running());
        assert_eq!(r.outcome, ReconcileOutcome::Unchanged);
    }

    #[test]
    fn paused_checkpoint_can_drain_without_notification() {
        let r = reconcile(Some(saved(10, 600, false, 0)), 1500, 60_000);
        assert_eq!(r.engine.remaining_secs(), 0);
        assert_eq!(r.engine.phase(), TimerPhase::Finished);
        assert_eq!(r.outcome, ReconcileOutcome::Unchanged);
    }

    #[test]
    fn clock_going_backwards_changes_nothing() {
        let r = reconcile(Some(saved(100, 1500, true, 90_000)), 1500, 10_000);
        assert_eq!(r.engine.remaining_secs(), 100);
        assert_eq!(r.outcome, ReconcileOutcome::Resumed);
    }

    #[test]
    fn sub_second_remainders_are_floored() {
        let r = reconcile(Some(saved(100, 1500, true, 0)), 1500, 1_999);
        assert_eq!(r.engine.remaining_secs(), 99);
    }

    #[test]
    fn checkpoint_survives_the_store() {
        let store = MemoryStore::default();
        let mut engine = TimerEngine::new(600);
        engine.start();
        engine.tick();

        let out = Checkpoint::of(&engine, 42_000);
        out.save(&store).unwrap();

        let back = Checkpoint::load(&store).unwrap();
        assert_eq!(back, out);
        assert_eq!(back.remaining_secs, 599);
        assert!(back.running);
    }

    #[test]
    fn missing_or_corrupt_checkpoint_loads_as_none() {
        let store = MemoryStore::default();
        assert_eq!(Checkpoint::load(&store), None);

        store.set(CHECKPOINT_KEY, "not json").unwrap();
        assert_eq!(Checkpoint::load(&store), None);
    }
}
