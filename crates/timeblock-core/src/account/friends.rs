//! Friend requests and friendship lists.
//!
//! Requests are addressed by email. Recipients are looked up through the
//! streaks collection, the one place every active user's email is
//! recorded; someone who has never completed a session cannot be found.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AccountError;

use super::{decode, encode, streaks, RecordStore, UserProfile};

/// Collection of request documents under generated ids.
pub const FRIEND_REQUESTS: &str = "friend_requests";

fn friends_collection(uid: &str) -> String {
    format!("users/{uid}/friends")
}

/// Outcomes a request sender or responder can see. Display strings are
/// shown to the user verbatim.
#[derive(Error, Debug)]
pub enum FriendError {
    #[error("User not found with that email")]
    RecipientNotFound,

    #[error("Cannot send friend request to yourself")]
    SelfRequest,

    #[error("Already friends with this user")]
    AlreadyFriends,

    #[error("Friend request already sent")]
    AlreadyRequested,

    #[error("Request not found")]
    RequestMissing,

    #[error(transparent)]
    Store(#[from] AccountError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequest {
    pub from: String,
    pub from_email: String,
    pub from_name: String,
    pub to: String,
    pub to_email: String,
    pub to_name: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

/// One row in a user's friends list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendEntry {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub added_at: DateTime<Utc>,
}

/// Find a user id by the email on their streak document.
fn find_by_email(
    store: &dyn RecordStore,
    email: &str,
) -> Result<Option<(String, streaks::StreakRecord)>, AccountError> {
    for (user_id, value) in store.list(streaks::STREAKS)? {
        if let Ok(record) = decode::<streaks::StreakRecord>(streaks::STREAKS, value) {
            if record.email == email {
                return Ok(Some((user_id, record)));
            }
        }
    }
    Ok(None)
}

/// Send a friend request from the signed-in user to `to_email`.
pub fn send_request(
    store: &dyn RecordStore,
    from: &UserProfile,
    to_email: &str,
) -> Result<(), FriendError> {
    let Some((to_uid, to_record)) = find_by_email(store, to_email)? else {
        return Err(FriendError::RecipientNotFound);
    };

    if to_uid == from.uid {
        return Err(FriendError::SelfRequest);
    }

    if store.get(&friends_collection(&from.uid), &to_uid)?.is_some() {
        return Err(FriendError::AlreadyFriends);
    }

    for (_, value) in store.list(FRIEND_REQUESTS)? {
        if let Ok(request) = decode::<FriendRequest>(FRIEND_REQUESTS, value) {
            if request.from == from.uid
                && request.to == to_uid
                && request.status == RequestStatus::Pending
            {
                return Err(FriendError::AlreadyRequested);
            }
        }
    }

    let request = FriendRequest {
        from: from.uid.clone(),
        from_email: from.email.clone(),
        from_name: from.name().to_string(),
        to: to_uid,
        to_email: to_email.to_string(),
        to_name: to_record.display_name,
        status: RequestStatus::Pending,
        created_at: Utc::now(),
        resolved_at: None,
    };
    store.add(FRIEND_REQUESTS, &encode(FRIEND_REQUESTS, &request)?)?;
    Ok(())
}

/// Requests waiting on this user's answer.
pub fn pending_requests(
    store: &dyn RecordStore,
    uid: &str,
) -> Result<Vec<(String, FriendRequest)>, AccountError> {
    let mut pending = Vec::new();
    for (id, value) in store.list(FRIEND_REQUESTS)? {
        if let Ok(request) = decode::<FriendRequest>(FRIEND_REQUESTS, value) {
            if request.to == uid && request.status == RequestStatus::Pending {
                pending.push((id, request));
            }
        }
    }
    pending.sort_by(|a, b| a.1.created_at.cmp(&b.1.created_at));
    Ok(pending)
}

/// Accept a request: both users gain a friends-list entry and the request
/// is marked accepted.
pub fn accept_request(store: &dyn RecordStore, request_id: &str) -> Result<(), FriendError> {
    let Some(value) = store.get(FRIEND_REQUESTS, request_id)? else {
        return Err(FriendError::RequestMissing);
    };
    let mut request: FriendRequest = decode(FRIEND_REQUESTS, value)?;

    let now = Utc::now();
    let to_entry = FriendEntry {
        user_id: request.from.clone(),
        email: request.from_email.clone(),
        display_name: request.from_name.clone(),
        added_at: now,
    };
    let from_entry = FriendEntry {
        user_id: request.to.clone(),
        email: request.to_email.clone(),
        display_name: request.to_name.clone(),
        added_at: now,
    };

    let collection = friends_collection(&request.to);
    store.set(&collection, &request.from, &encode(&collection, &to_entry)?)?;
    let collection = friends_collection(&request.from);
    store.set(&collection, &request.to, &encode(&collection, &from_entry)?)?;

    request.status = RequestStatus::Accepted;
    request.resolved_at = Some(now);
    store.set(
        FRIEND_REQUESTS,
        request_id,
        &encode(FRIEND_REQUESTS, &request)?,
    )?;
    Ok(())
}

/// Decline a request, leaving both friends lists alone.
pub fn reject_request(store: &dyn RecordStore, request_id: &str) -> Result<(), FriendError> {
    let Some(value) = store.get(FRIEND_REQUESTS, request_id)? else {
        return Err(FriendError::RequestMissing);
    };
    let mut request: FriendRequest = decode(FRIEND_REQUESTS, value)?;
    request.status = RequestStatus::Rejected;
    request.resolved_at = Some(Utc::now());
    store.set(
        FRIEND_REQUESTS,
        request_id,
        &encode(FRIEND_REQUESTS, &request)?,
    )?;
    Ok(())
}

/// The user's friends, alphabetical by display name.
pub fn friends_of(store: &dyn RecordStore, uid: &str) -> Result<Vec<FriendEntry>, AccountError> {
    let collection = friends_collection(uid);
    let mut friends = Vec::new();
    for (_, value) in store.list(&collection)? {
        friends.push(decode::<FriendEntry>(&collection, value)?);
    }
    friends.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    Ok(friends)
}
