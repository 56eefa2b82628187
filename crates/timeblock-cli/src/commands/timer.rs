use clap::Subcommand;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use timeblock_core::storage::{Config, SqliteStore};
use timeblock_core::timer::{
    now_ms, parse_custom_minutes, reconcile, Checkpoint, Reconciled, ReconcileOutcome,
};
use timeblock_core::{apply_command, Command, Notifier};

use super::{open_session, print_reply, StderrNotifier};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start or resume the countdown
    Start,
    /// Pause the countdown in place
    Pause,
    /// Rewind to a full session at the current length
    Reset,
    /// Print current timer state as JSON
    Status,
    /// Set the session length in minutes (1-120) and pause
    Set {
        /// Whole minutes, e.g. "45"
        minutes: String,
    },
    /// Run a live session and stream state changes as JSON lines
    Watch {
        /// Start the countdown immediately
        #[arg(long)]
        start: bool,
    },
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let command = match action {
        TimerAction::Watch { start } => return watch(start),
        TimerAction::Start => Command::StartTimer,
        TimerAction::Pause => Command::PauseTimer,
        TimerAction::Reset => Command::ResetTimer,
        TimerAction::Status => Command::GetState,
        TimerAction::Set { minutes } => {
            let minutes = parse_custom_minutes(&minutes)?;
            Command::SetTimer {
                minutes: Some(i64::from(minutes)),
            }
        }
    };

    let config = Config::load_or_default();
    let store = SqliteStore::open()?;

    // Each invocation first ages the saved countdown, so time spent
    // between invocations comes off before the command applies.
    let saved = Checkpoint::load(&store);
    let Reconciled {
        mut engine,
        outcome,
    } = reconcile(saved, config.default_total_secs(), now_ms());
    if let ReconcileOutcome::FinishedWhileAway { minutes_completed } = outcome {
        if config.notifications.enabled {
            StderrNotifier.notify(
                timeblock_core::notify::NOTIFICATION_TITLE,
                &timeblock_core::notify::completion_message(minutes_completed),
            );
        }
    }

    let reply = apply_command(&mut engine, &command);
    Checkpoint::of(&engine, now_ms()).save(&store)?;
    print_reply(&reply)
}

fn watch(start: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let (handle, join, _records) = open_session(&config)?;
        let mut events = handle.subscribe();

        let first = if start {
            Command::StartTimer
        } else {
            Command::GetState
        };
        print_reply(&handle.apply(first).await?)?;

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                event = events.recv() => match event {
                    Ok(event) => println!("{}", serde_json::to_string(&event)?),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event stream lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        drop(handle);
        let _ = join.await;
        Ok(())
    })
}
