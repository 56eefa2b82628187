//! Daily streaks and the streak leaderboard.
//!
//! A streak advances at most once per calendar day, on the first completed
//! session of that day. Missing a day resets the current streak to one on
//! the next completion; the longest streak is never lowered.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AccountError;

use super::{decode, encode, RecordStore, UserProfile};

/// Collection holding one streak document per user. Doubles as the place
/// friend lookups find users by email, since every active user has one.
pub const STREAKS: &str = "streaks";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakRecord {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_days: u32,
    pub last_active: Option<NaiveDate>,
    pub display_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakStanding {
    pub user_id: String,
    #[serde(flatten)]
    pub record: StreakRecord,
}

/// Fetch a user's streak, creating the zeroed document on first sight.
pub fn get_or_init(store: &dyn RecordStore, uid: &str) -> Result<StreakRecord, AccountError> {
    if let Some(value) = store.get(STREAKS, uid)? {
        return decode(STREAKS, value);
    }
    let now = Utc::now();
    let record = StreakRecord {
        current_streak: 0,
        longest_streak: 0,
        total_days: 0,
        last_active: None,
        display_name: "User".into(),
        email: String::new(),
        created_at: now,
        updated_at: now,
    };
    store.set(STREAKS, uid, &encode(STREAKS, &record)?)?;
    Ok(record)
}

/// Mark `today` as an active day for the user.
///
/// The second and later completions of the same day change nothing.
pub fn record_active_day(
    store: &dyn RecordStore,
    user: &UserProfile,
    today: NaiveDate,
) -> Result<StreakRecord, AccountError> {
    let mut record = get_or_init(store, &user.uid)?;

    if record.last_active == Some(today) {
        return Ok(record);
    }

    record.current_streak = match record.last_active {
        Some(prev) if (today - prev).num_days() == 1 => record.current_streak + 1,
        _ => 1,
    };
    record.longest_streak = record.longest_streak.max(record.current_streak);
    record.total_days += 1;
    record.last_active = Some(today);
    if let Some(name) = &user.display_name {
        record.display_name = name.clone();
    }
    if !user.email.is_empty() {
        record.email = user.email.clone();
    }
    record.updated_at = Utc::now();

    store.set(STREAKS, &user.uid, &encode(STREAKS, &record)?)?;
    Ok(record)
}

/// Drop the current streak to zero, keeping the longest and the history.
pub fn reset(store: &dyn RecordStore, uid: &str) -> Result<StreakRecord, AccountError> {
    let mut record = get_or_init(store, uid)?;
    record.current_streak = 0;
    record.last_active = None;
    record.updated_at = Utc::now();
    store.set(STREAKS, uid, &encode(STREAKS, &record)?)?;
    Ok(record)
}

/// Top users by current streak, longest streak breaking ties.
pub fn leaderboard(
    store: &dyn RecordStore,
    limit: usize,
) -> Result<Vec<StreakStanding>, AccountError> {
    let mut rows = Vec::new();
    for (user_id, value) in store.list(STREAKS)? {
        match decode::<StreakRecord>(STREAKS, value) {
            Ok(record) => rows.push(StreakStanding { user_id, record }),
            Err(e) => warn!(error = %e, user_id, "skipping unreadable streak record"),
        }
    }
    rows.sort_by(|a, b| {
        b.record
            .current_streak
            .cmp(&a.record.current_streak)
            .then(b.record.longest_streak.cmp(&a.record.longest_streak))
    });
    rows.truncate(limit);
    Ok(rows)
}

/// 1-based position: one plus the number of users with a strictly higher
/// current streak.
pub fn rank(store: &dyn RecordStore, current_streak: u32) -> Result<u64, AccountError> {
    let mut rank = 1;
    for (_, value) in store.list(STREAKS)? {
        if let Ok(record) = decode::<StreakRecord>(STREAKS, value) {
            if record.current_streak > current_streak {
                rank += 1;
            }
        }
    }
    Ok(rank)
}
