//! Lifetime focus totals and the minutes leaderboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AccountError;

use super::{decode, encode, RecordStore, UserProfile};

/// Collection holding one totals document per user.
pub const FOCUS: &str = "focus";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusRecord {
    pub total_minutes: u64,
    pub display_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusStanding {
    pub user_id: String,
    #[serde(flatten)]
    pub record: FocusRecord,
}

/// Fetch a user's totals, creating the zeroed document on first sight.
pub fn get_or_init(store: &dyn RecordStore, uid: &str) -> Result<FocusRecord, AccountError> {
    if let Some(value) = store.get(FOCUS, uid)? {
        return decode(FOCUS, value);
    }
    let now = Utc::now();
    let record = FocusRecord {
        total_minutes: 0,
        display_name: "User".into(),
        email: String::new(),
        created_at: now,
        updated_at: now,
    };
    store.set(FOCUS, uid, &encode(FOCUS, &record)?)?;
    Ok(record)
}

/// Credit completed minutes to the user's lifetime total.
///
/// Read, add, write. The display name and email are refreshed on every
/// write so the leaderboard always shows current details.
pub fn add_minutes(
    store: &dyn RecordStore,
    user: &UserProfile,
    minutes: u32,
) -> Result<FocusRecord, AccountError> {
    let mut record = get_or_init(store, &user.uid)?;
    record.total_minutes += u64::from(minutes);
    record.display_name = user.name().to_string();
    record.email = user.email.clone();
    record.updated_at = Utc::now();
    store.set(FOCUS, &user.uid, &encode(FOCUS, &record)?)?;
    Ok(record)
}

/// Top users by lifetime minutes, best first.
pub fn leaderboard(
    store: &dyn RecordStore,
    limit: usize,
) -> Result<Vec<FocusStanding>, AccountError> {
    let mut rows = Vec::new();
    for (user_id, value) in store.list(FOCUS)? {
        match decode::<FocusRecord>(FOCUS, value) {
            Ok(record) => rows.push(FocusStanding { user_id, record }),
            Err(e) => warn!(error = %e, user_id, "skipping unreadable focus record"),
        }
    }
    rows.sort_by(|a, b| b.record.total_minutes.cmp(&a.record.total_minutes));
    rows.truncate(limit);
    Ok(rows)
}

/// 1-based position: one plus the number of users with a strictly higher
/// total. Ties share a rank.
pub fn rank(store: &dyn RecordStore, total_minutes: u64) -> Result<u64, AccountError> {
    let mut rank = 1;
    for (_, value) in store.list(FOCUS)? {
        if let Ok(record) = decode::<FocusRecord>(FOCUS, value) {
            if record.total_minutes > total_minutes {
                rank += 1;
            }
        }
    }
    Ok(rank)
}
