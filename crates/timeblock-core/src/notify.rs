//! User-facing notifications.
//!
//! The session host talks to an abstract [`Notifier`] so the desktop shell
//! can surface real notifications while the CLI and tests settle for the
//! log. Notification failures are nobody's problem but the notifier's.

use tracing::info;

/// Title used for every notification.
pub const NOTIFICATION_TITLE: &str = "TimeBlock Timer";

/// Message shown when a session completes, live or while away.
pub fn completion_message(minutes: u32) -> String {
    if minutes == 1 {
        format!("Great! You focused for {minutes} minute!")
    } else {
        format!("Great! You focused for {minutes} minutes!")
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

/// Notifier that writes to the log instead of the desktop.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str) {
        info!(title, message, "notification");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_message_pluralizes() {
        assert_eq!(completion_message(0), "Great! You focused for 0 minutes!");
        assert_eq!(completion_message(1), "Great! You focused for 1 minute!");
        assert_eq!(completion_message(25), "Great! You focused for 25 minutes!");
    }
}
