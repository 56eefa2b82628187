//! Per-day focus tally.
//!
//! Every counted second while the timer runs credits one second to the
//! local calendar day it happened on. The tally only moves while a host
//! is alive and ticking; time that drains while nothing is running is
//! not back-credited.

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StoreError;
use crate::storage::store::StateStore;

/// Key the serialized tally lives under in the state store.
pub const TALLY_KEY: &str = "focus_tally";

/// Key of the most recently completed session, kept for quick display.
pub const LAST_SESSION_KEY: &str = "last_session";

/// The local calendar day, which is what focus time is bucketed by.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Seconds of focused time per calendar day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTally {
    days: BTreeMap<NaiveDate, u64>,
}

impl DailyTally {
    /// Add focused seconds to a day's bucket.
    pub fn credit(&mut self, day: NaiveDate, secs: u64) {
        *self.days.entry(day).or_insert(0) += secs;
    }

    pub fn seconds_on(&self, day: NaiveDate) -> u64 {
        self.days.get(&day).copied().unwrap_or(0)
    }

    pub fn total_seconds(&self) -> u64 {
        self.days.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Days with recorded focus time, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, u64)> + '_ {
        self.days.iter().map(|(day, secs)| (*day, *secs))
    }

    /// Read the tally from the store; a missing or unreadable tally is an
    /// empty one.
    pub fn load(store: &dyn StateStore) -> Self {
        let raw = match store.get(TALLY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::default(),
            Err(e) => {
                warn!(error = %e, "failed to read focus tally");
                return Self::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(tally) => tally,
            Err(e) => {
                warn!(error = %e, "discarding unreadable focus tally");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &dyn StateStore) -> Result<(), StoreError> {
        let raw = serde_json::to_string(self)
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        store.set(TALLY_KEY, &raw)
    }
}

/// Snapshot of the most recently completed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastSession {
    pub minutes: u32,
    pub finished_at_ms: u64,
}

impl LastSession {
    pub fn load(store: &dyn StateStore) -> Option<Self> {
        match store.get(LAST_SESSION_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "failed to read last session");
                None
            }
        }
    }

    pub fn save(&self, store: &dyn StateStore) -> Result<(), StoreError> {
        let raw = serde_json::to_string(self)
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        store.set(LAST_SESSION_KEY, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::store::MemoryStore;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn credits_accumulate_per_day() {
        let mut tally = DailyTally::default();
        tally.credit(day("2026-08-23"), 1);
        tally.credit(day("2026-08-23"), 1);
        tally.credit(day("2026-08-24"), 5);

        assert_eq!(tally.seconds_on(day("2026-08-23")), 2);
        assert_eq!(tally.seconds_on(day("2026-08-24")), 5);
        assert_eq!(tally.seconds_on(day("2026-08-25")), 0);
        assert_eq!(tally.total_seconds(), 7);
    }

    #[test]
    fn iterates_oldest_first() {
        let mut tally = DailyTally::default();
        tally.credit(day("2026-08-24"), 2);
        tally.credit(day("2026-08-22"), 1);
        let days: Vec<_> = tally.iter().map(|(d, _)| d).collect();
        assert_eq!(days, vec![day("2026-08-22"), day("2026-08-24")]);
    }

    #[test]
    fn missing_tally_loads_empty() {
        let store = MemoryStore::default();
        assert!(DailyTally::load(&store).is_empty());
    }

    #[test]
    fn corrupt_tally_loads_empty() {
        let store = MemoryStore::default();
        store.set(TALLY_KEY, "{oops").unwrap();
        assert!(DailyTally::load(&store).is_empty());
    }

    #[test]
    fn tally_survives_the_store() {
        let store = MemoryStore::default();
        let mut tally = DailyTally::default();
        tally.credit(day("2026-08-23"), 90);
        tally.save(&store).unwrap();

        assert_eq!(DailyTally::load(&store), tally);
    }

    #[test]
    fn last_session_round_trips() {
        let store = MemoryStore::default();
        assert_eq!(LastSession::load(&store), None);

        let session = LastSession {
            minutes: 25,
            finished_at_ms: 1_700_000_000_000,
        };
        session.save(&store).unwrap();
        assert_eq!(LastSession::load(&store), Some(session));
    }
}
