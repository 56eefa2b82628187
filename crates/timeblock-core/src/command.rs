//! Wire commands and their replies.
//!
//! Every request gets exactly one reply carrying a success flag and, when
//! the countdown state is known, a snapshot of it. Requests that do not
//! parse are answered with a failure reply instead of being dropped.

use serde::{Deserialize, Serialize};

use crate::timer::{validate_minutes, TimerEngine, TimerSnapshot};

/// Commands accepted by the session host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    GetState,
    StartTimer,
    PauseTimer,
    ResetTimer,
    SetTimer {
        #[serde(default)]
        minutes: Option<i64>,
    },
}

/// Uniform reply to any [`Command`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandReply {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<TimerSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandReply {
    pub fn ok(state: TimerSnapshot) -> Self {
        Self {
            success: true,
            state: Some(state),
            error: None,
        }
    }

    pub fn rejected(state: TimerSnapshot, message: impl Into<String>) -> Self {
        Self {
            success: false,
            state: Some(state),
            error: Some(message.into()),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            state: None,
            error: Some(message.into()),
        }
    }
}

/// Decode one wire request. The serde error doubles as the reply reason
/// for unknown or malformed requests.
pub fn parse_request(raw: &str) -> Result<Command, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Apply a command to the engine and build its reply.
///
/// `SET_TIMER` with no minutes (or an explicit zero) acknowledges without
/// changing anything, a quirk the message surface has always had; the UI
/// catches those values before they are ever sent. Out-of-range minutes
/// are rejected with the boundary message and leave the countdown alone.
pub fn apply_command(engine: &mut TimerEngine, command: &Command) -> CommandReply {
    match command {
        Command::GetState => {}
        Command::StartTimer => {
            engine.start();
        }
        Command::PauseTimer => {
            engine.pause();
        }
        Command::ResetTimer => {
            engine.reset();
        }
        Command::SetTimer { minutes } => match minutes {
            None | Some(0) => {}
            Some(minutes) => match validate_minutes(*minutes) {
                Ok(minutes) => engine.set_duration_minutes(minutes),
                Err(e) => return CommandReply::rejected(engine.snapshot(), e.to_string()),
            },
        },
    }
    CommandReply::ok(engine.snapshot())
}
