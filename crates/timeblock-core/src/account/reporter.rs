//! Bridges completed sessions to the record store.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::AccountError;
use crate::tally;

use super::{focus, streaks, RecordStore};

/// Credits a completed session to the signed-in user.
///
/// Blocking by design; the session host runs it off the event loop and
/// logs failures instead of surfacing them.
#[derive(Clone)]
pub struct CompletionReporter {
    records: Arc<dyn RecordStore>,
}

impl CompletionReporter {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }

    /// Add the minutes to the lifetime total and mark today active.
    /// Without a signed-in user the completion stays local.
    pub fn report(&self, minutes_completed: u32) -> Result<(), AccountError> {
        let Some(user) = self.records.current_user() else {
            debug!("no signed-in user, completion stays local");
            return Ok(());
        };

        let totals = focus::add_minutes(self.records.as_ref(), &user, minutes_completed)?;
        let streak = streaks::record_active_day(self.records.as_ref(), &user, tally::today())?;
        info!(
            minutes = minutes_completed,
            total_minutes = totals.total_minutes,
            current_streak = streak.current_streak,
            "recorded completed session"
        );
        Ok(())
    }
}
