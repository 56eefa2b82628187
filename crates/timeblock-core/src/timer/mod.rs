mod duration;
mod engine;
mod reconcile;

pub use duration::{parse_custom_minutes, validate_minutes};
pub use engine::{
    TickOutcome, TimerEngine, TimerPhase, TimerSnapshot, DEFAULT_SESSION_SECS,
    MAX_CUSTOM_MINUTES, MIN_CUSTOM_MINUTES,
};
pub use reconcile::{
    now_ms, reconcile, Checkpoint, Reconciled, ReconcileOutcome, CHECKPOINT_KEY,
};
