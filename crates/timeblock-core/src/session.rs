//! Serialized session host.
//!
//! One task owns the engine, the tick schedule and the stores. Commands
//! arrive over a channel and are answered through a oneshot, so every
//! mutation is totally ordered with the ticks; there is nothing to lock.
//! State changes fan out over a broadcast channel that is perfectly happy
//! with zero listeners.
//!
//! Before the first command is accepted the persisted checkpoint is aged
//! by the wall clock: a countdown that was running resumes by itself, and
//! one that ran out while no host was alive triggers a single notification
//! (but no completion event, and no tally credit).

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::account::CompletionReporter;
use crate::command::{apply_command, Command, CommandReply};
use crate::events::Event;
use crate::notify::{completion_message, Notifier, NOTIFICATION_TITLE};
use crate::storage::StateStore;
use crate::tally::{self, DailyTally, LastSession};
use crate::timer::{
    now_ms, reconcile, Checkpoint, Reconciled, ReconcileOutcome, TickOutcome, TimerEngine,
};

const COMMAND_CAPACITY: usize = 16;
const EVENT_CAPACITY: usize = 64;

/// The host task is gone and can no longer answer.
#[derive(Debug, Error)]
#[error("session host is gone")]
pub struct SessionClosed;

/// Everything the host needs from its surroundings.
pub struct SessionConfig {
    pub store: Arc<dyn StateStore>,
    pub notifier: Arc<dyn Notifier>,
    /// Credits completions to the signed-in account, when there is one.
    pub reporter: Option<CompletionReporter>,
    /// Session length for a fresh countdown, in seconds.
    pub default_total_secs: u32,
    pub notifications_enabled: bool,
}

struct Envelope {
    command: Command,
    reply: oneshot::Sender<CommandReply>,
}

/// Cheap handle to a running session host.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Envelope>,
    events: broadcast::Sender<Event>,
}

impl SessionHandle {
    /// Send one command and wait for its reply.
    pub async fn apply(&self, command: Command) -> Result<CommandReply, SessionClosed> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(Envelope { command, reply: tx })
            .await
            .map_err(|_| SessionClosed)?;
        rx.await.map_err(|_| SessionClosed)
    }

    /// Observe state changes. Every tick and every command produces an
    /// update; completions additionally produce their own event.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }
}

/// Spawn the host. It stops once every [`SessionHandle`] is dropped,
/// writing a final checkpoint on the way out.
pub fn spawn(config: SessionConfig) -> (SessionHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
    let (events, _) = broadcast::channel(EVENT_CAPACITY);
    let handle = SessionHandle {
        tx,
        events: events.clone(),
    };
    let join = tokio::spawn(run(config, rx, events));
    (handle, join)
}

async fn run(
    config: SessionConfig,
    mut rx: mpsc::Receiver<Envelope>,
    events: broadcast::Sender<Event>,
) {
    let SessionConfig {
        store,
        notifier,
        reporter,
        default_total_secs,
        notifications_enabled,
    } = config;

    let saved = Checkpoint::load(store.as_ref());
    let Reconciled { mut engine, outcome } = reconcile(saved, default_total_secs, now_ms());
    persist(store.as_ref(), &engine);
    match outcome {
        ReconcileOutcome::Resumed => {
            info!(remaining_secs = engine.remaining_secs(), "countdown resumed");
        }
        ReconcileOutcome::FinishedWhileAway { minutes_completed } => {
            info!(minutes_completed, "countdown finished while away");
            if notifications_enabled {
                notifier.notify(NOTIFICATION_TITLE, &completion_message(minutes_completed));
            }
        }
        ReconcileOutcome::Unchanged => {}
    }

    let mut tally = DailyTally::load(store.as_ref());

    // First tick a full second from now, resumed countdowns included.
    let period = Duration::from_secs(1);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(outcome) = engine.tick() else { continue };

                tally.credit(tally::today(), 1);
                if let Err(e) = tally.save(store.as_ref()) {
                    warn!(error = %e, "failed to persist focus tally");
                }
                persist(store.as_ref(), &engine);

                if let TickOutcome::Finished { minutes_completed } = outcome {
                    info!(minutes_completed, "countdown finished");
                    let session = LastSession {
                        minutes: minutes_completed,
                        finished_at_ms: now_ms(),
                    };
                    if let Err(e) = session.save(store.as_ref()) {
                        warn!(error = %e, "failed to persist last session");
                    }
                    if notifications_enabled {
                        notifier.notify(NOTIFICATION_TITLE, &completion_message(minutes_completed));
                    }
                    let _ = events.send(Event::focus_complete(minutes_completed));
                    if let Some(reporter) = &reporter {
                        let reporter = reporter.clone();
                        tokio::task::spawn_blocking(move || {
                            if let Err(e) = reporter.report(minutes_completed) {
                                warn!(error = %e, "failed to record completion");
                            }
                        });
                    }
                }

                let _ = events.send(Event::timer_update(&engine.snapshot()));
            }
            envelope = rx.recv() => {
                let Some(Envelope { command, reply }) = envelope else { break };

                let was_running = engine.is_running();
                let out = apply_command(&mut engine, &command);
                if engine.is_running() && !was_running {
                    // A full second before the first decrement.
                    ticker.reset();
                }
                persist(store.as_ref(), &engine);
                let _ = events.send(Event::timer_update(&engine.snapshot()));
                let _ = reply.send(out);
            }
        }
    }

    persist(store.as_ref(), &engine);
    debug!("session host stopped");
}

fn persist(store: &dyn StateStore, engine: &TimerEngine) {
    if let Err(e) = Checkpoint::of(engine, now_ms()).save(store) {
        warn!(error = %e, "failed to persist timer state");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{focus, streaks, FileRecordStore, UserProfile};
    use crate::error::StoreError;
    use crate::notify::LogNotifier;
    use crate::storage::MemoryStore;
    use crate::timer::TimerPhase;
    use std::sync::Mutex;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(30);

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        fn messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, _title: &str, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    /// Store whose writes always fail.
    struct FailingStore;

    impl StateStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::QueryFailed("disk full".into()))
        }
    }

    fn config(store: Arc<dyn StateStore>, total_secs: u32) -> SessionConfig {
        SessionConfig {
            store,
            notifier: Arc::new(LogNotifier),
            reporter: None,
            default_total_secs: total_secs,
            notifications_enabled: true,
        }
    }

    async fn next_event(rx: &mut broadcast::Receiver<Event>) -> Event {
        timeout(WAIT, rx.recv()).await.unwrap().unwrap()
    }

    fn remaining_of(event: &Event) -> u32 {
        match event {
            Event::TimerUpdate { remaining_secs, .. } => *remaining_secs,
            other => panic!("expected TIMER_UPDATE, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn a_short_session_completes_exactly_once() {
        let store = Arc::new(MemoryStore::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let (handle, _join) = spawn(SessionConfig {
            store: store.clone(),
            notifier: notifier.clone(),
            reporter: None,
            default_total_secs: 3,
            notifications_enabled: true,
        });
        let mut rx = handle.subscribe();

        let reply = handle.apply(Command::StartTimer).await.unwrap();
        assert!(reply.success);
        assert_eq!(remaining_of(&next_event(&mut rx).await), 3); // the command's update

        assert_eq!(remaining_of(&next_event(&mut rx).await), 2);
        assert_eq!(remaining_of(&next_event(&mut rx).await), 1);

        // Completion: FOCUS_COMPLETE first, then the final update.
        match next_event(&mut rx).await {
            Event::FocusComplete { minutes_completed, .. } => assert_eq!(minutes_completed, 0),
            other => panic!("expected FOCUS_COMPLETE, got {other:?}"),
        }
        let last = next_event(&mut rx).await;
        match &last {
            Event::TimerUpdate { remaining_secs, running, .. } => {
                assert_eq!(*remaining_secs, 0);
                assert!(!running);
            }
            other => panic!("expected TIMER_UPDATE, got {other:?}"),
        }

        // The countdown stays at zero; no further events, no second
        // completion.
        assert!(timeout(WAIT, rx.recv()).await.is_err());
        let reply = handle.apply(Command::GetState).await.unwrap();
        assert_eq!(reply.state.unwrap().phase, TimerPhase::Finished);

        assert_eq!(notifier.messages(), vec!["Great! You focused for 0 minutes!"]);

        // Every counted second went into today's tally, the final one
        // included.
        let tally = DailyTally::load(store.as_ref());
        assert_eq!(tally.seconds_on(tally::today()), 3);

        // And the checkpoint agrees.
        let saved = Checkpoint::load(store.as_ref()).unwrap();
        assert_eq!(saved.remaining_secs, 0);
        assert!(!saved.running);
    }

    #[tokio::test(start_paused = true)]
    async fn starting_twice_never_stacks_tick_schedules() {
        let store = Arc::new(MemoryStore::default());
        let (handle, _join) = spawn(config(store, 100));
        let mut rx = handle.subscribe();

        assert!(handle.apply(Command::StartTimer).await.unwrap().success);
        assert!(handle.apply(Command::StartTimer).await.unwrap().success);
        assert_eq!(remaining_of(&next_event(&mut rx).await), 100);
        assert_eq!(remaining_of(&next_event(&mut rx).await), 100);

        // One decrement per second, not two.
        assert_eq!(remaining_of(&next_event(&mut rx).await), 99);
        assert_eq!(remaining_of(&next_event(&mut rx).await), 98);
    }

    #[tokio::test(start_paused = true)]
    async fn pausing_stops_the_countdown_in_place() {
        let store = Arc::new(MemoryStore::default());
        let (handle, _join) = spawn(config(store.clone(), 100));
        let mut rx = handle.subscribe();

        handle.apply(Command::StartTimer).await.unwrap();
        assert_eq!(remaining_of(&next_event(&mut rx).await), 100);
        assert_eq!(remaining_of(&next_event(&mut rx).await), 99);

        let reply = handle.apply(Command::PauseTimer).await.unwrap();
        let state = reply.state.unwrap();
        assert!(!state.running);
        assert_eq!(state.remaining_secs, 99);
        assert_eq!(remaining_of(&next_event(&mut rx).await), 99);

        // Paused: the clock keeps ticking but nothing moves or broadcasts.
        assert!(timeout(WAIT, rx.recv()).await.is_err());

        handle.apply(Command::StartTimer).await.unwrap();
        assert_eq!(remaining_of(&next_event(&mut rx).await), 99);
        assert_eq!(remaining_of(&next_event(&mut rx).await), 98);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_rewinds_to_the_full_session() {
        let store = Arc::new(MemoryStore::default());
        let (handle, _join) = spawn(config(store, 100));
        let mut rx = handle.subscribe();

        handle.apply(Command::StartTimer).await.unwrap();
        next_event(&mut rx).await;
        next_event(&mut rx).await; // one tick

        let reply = handle.apply(Command::ResetTimer).await.unwrap();
        let state = reply.state.unwrap();
        assert_eq!(state.remaining_secs, 100);
        assert!(!state.running);
        assert_eq!(state.phase, TimerPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn set_timer_quirks_hold_over_the_wire() {
        let store = Arc::new(MemoryStore::default());
        let (handle, _join) = spawn(config(store, 1500));

        // Absent minutes: acknowledged, nothing changes.
        let reply = handle
            .apply(Command::SetTimer { minutes: None })
            .await
            .unwrap();
        assert!(reply.success);
        assert_eq!(reply.state.unwrap().total_secs, 1500);

        // Out of range: rejected with the boundary message.
        let reply = handle
            .apply(Command::SetTimer { minutes: Some(121) })
            .await
            .unwrap();
        assert!(!reply.success);
        assert_eq!(reply.error.as_deref(), Some("Maximum 120 minutes"));

        // In range: paused at the new length.
        let reply = handle
            .apply(Command::SetTimer { minutes: Some(10) })
            .await
            .unwrap();
        let state = reply.state.unwrap();
        assert_eq!((state.remaining_secs, state.total_secs), (600, 600));
        assert!(!state.running);
    }

    #[tokio::test(start_paused = true)]
    async fn a_running_checkpoint_resumes_by_itself() {
        let store = Arc::new(MemoryStore::default());
        Checkpoint {
            remaining_secs: 100,
            total_secs: 1500,
            running: true,
            saved_at_ms: now_ms().saturating_sub(40_000),
        }
        .save(store.as_ref())
        .unwrap();

        let (handle, _join) = spawn(config(store, 1500));
        let mut rx = handle.subscribe();

        let reply = handle.apply(Command::GetState).await.unwrap();
        let state = reply.state.unwrap();
        assert_eq!(state.remaining_secs, 60);
        assert!(state.running);

        // No start command was sent, yet it counts.
        next_event(&mut rx).await; // the GET_STATE update
        assert_eq!(remaining_of(&next_event(&mut rx).await), 59);
    }

    #[tokio::test(start_paused = true)]
    async fn finishing_while_away_notifies_once_and_credits_nothing() {
        let store = Arc::new(MemoryStore::default());
        Checkpoint {
            remaining_secs: 10,
            total_secs: 600,
            running: true,
            saved_at_ms: now_ms().saturating_sub(60_000),
        }
        .save(store.as_ref())
        .unwrap();

        let notifier = Arc::new(RecordingNotifier::default());
        let (handle, _join) = spawn(SessionConfig {
            store: store.clone(),
            notifier: notifier.clone(),
            reporter: None,
            default_total_secs: 1500,
            notifications_enabled: true,
        });
        let mut rx = handle.subscribe();

        let reply = handle.apply(Command::GetState).await.unwrap();
        let state = reply.state.unwrap();
        assert_eq!(state.remaining_secs, 0);
        assert!(!state.running);
        assert_eq!(state.phase, TimerPhase::Finished);

        assert_eq!(notifier.messages(), vec!["Great! You focused for 10 minutes!"]);

        // The away time is not back-credited and no completion event is
        // broadcast.
        assert!(DailyTally::load(store.as_ref()).is_empty());
        next_event(&mut rx).await; // the GET_STATE update
        assert!(timeout(WAIT, rx.recv()).await.is_err());

        // A second host over the same store stays quiet: the reconciled
        // checkpoint was written back with running = false.
        let notifier2 = Arc::new(RecordingNotifier::default());
        let (handle2, _join2) = spawn(SessionConfig {
            store: store.clone(),
            notifier: notifier2.clone(),
            reporter: None,
            default_total_secs: 1500,
            notifications_enabled: true,
        });
        handle2.apply(Command::GetState).await.unwrap();
        assert!(notifier2.messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn notifications_can_be_disabled() {
        let store = Arc::new(MemoryStore::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let (handle, _join) = spawn(SessionConfig {
            store,
            notifier: notifier.clone(),
            reporter: None,
            default_total_secs: 2,
            notifications_enabled: false,
        });
        let mut rx = handle.subscribe();

        handle.apply(Command::StartTimer).await.unwrap();
        loop {
            if let Event::FocusComplete { .. } = next_event(&mut rx).await {
                break;
            }
        }
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn store_failures_never_reach_the_caller() {
        let (handle, _join) = spawn(config(Arc::new(FailingStore), 100));
        let mut rx = handle.subscribe();

        let reply = handle.apply(Command::StartTimer).await.unwrap();
        assert!(reply.success);
        assert_eq!(remaining_of(&next_event(&mut rx).await), 100);
        assert_eq!(remaining_of(&next_event(&mut rx).await), 99);
    }

    #[tokio::test(start_paused = true)]
    async fn every_observer_sees_every_event() {
        let store = Arc::new(MemoryStore::default());
        let (handle, _join) = spawn(config(store, 3));
        let mut first = handle.subscribe();
        let mut second = handle.subscribe();

        handle.apply(Command::StartTimer).await.unwrap();

        // The start update, two mid-count ticks, the completion and the
        // final update.
        for _ in 0..5 {
            let a = next_event(&mut first).await;
            let b = next_event(&mut second).await;
            assert_eq!(a, b);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn broadcasting_to_nobody_is_fine() {
        let store = Arc::new(MemoryStore::default());
        let (handle, _join) = spawn(config(store, 5));

        // No subscriber exists; commands and ticks still work.
        assert!(handle.apply(Command::StartTimer).await.unwrap().success);
        tokio::time::sleep(Duration::from_secs(2)).await;

        // A late subscriber sees whatever happens next.
        let mut rx = handle.subscribe();
        let reply = handle.apply(Command::GetState).await.unwrap();
        assert!(reply.state.unwrap().remaining_secs < 5);
        next_event(&mut rx).await;
    }

    #[tokio::test(start_paused = true)]
    async fn completions_reach_the_signed_in_account() {
        let dir = tempfile::tempdir().unwrap();
        let records = Arc::new(FileRecordStore::open(dir.path().join("records")).unwrap());
        records
            .sign_in(UserProfile {
                uid: "u1".into(),
                email: "u1@example.com".into(),
                display_name: Some("One".into()),
            })
            .unwrap();

        let store = Arc::new(MemoryStore::default());
        let (handle, _join) = spawn(SessionConfig {
            store,
            notifier: Arc::new(LogNotifier),
            reporter: Some(CompletionReporter::new(records.clone())),
            default_total_secs: 60,
            notifications_enabled: true,
        });
        let mut rx = handle.subscribe();

        handle.apply(Command::StartTimer).await.unwrap();
        loop {
            if let Event::FocusComplete { minutes_completed, .. } = next_event(&mut rx).await {
                assert_eq!(minutes_completed, 1);
                break;
            }
        }

        // The report runs off the event loop; give it a moment of real
        // time to land. The streak is written last, so once it shows up
        // the totals are in too.
        let mut streak = 0;
        for _ in 0..200 {
            streak = streaks::get_or_init(records.as_ref(), "u1")
                .unwrap()
                .current_streak;
            if streak > 0 {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert_eq!(streak, 1);
        let totals = focus::get_or_init(records.as_ref(), "u1").unwrap();
        assert_eq!(totals.total_minutes, 1);
    }
}
