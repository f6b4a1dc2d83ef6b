use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::TrackId;

/// A registered user and their personal voting record.
///
/// `voted_tracks` is the set of tracks the user currently holds an active vote
/// on. `remaining_votes` never goes below zero for non-admin users.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub is_admin: bool,
    pub voted_tracks: BTreeSet<TrackId>,
    pub remaining_votes: i32,
    pub last_vote_refresh: DateTime<Utc>,
}

impl User {
    /// Returns true if the user holds an active vote on `track_id`.
    pub fn has_voted_for(&self, track_id: &str) -> bool {
        self.voted_tracks.contains(track_id)
    }
}

/// The voting state of a user, as shown on their own profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoterStatus {
    pub email: String,
    pub is_admin: bool,
    pub voted_tracks: BTreeSet<TrackId>,
    pub remaining_votes: i32,
    pub last_vote_refresh: DateTime<Utc>,
}

impl From<User> for VoterStatus {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            is_admin: user.is_admin,
            voted_tracks: user.voted_tracks,
            remaining_votes: user.remaining_votes,
            last_vote_refresh: user.last_vote_refresh,
        }
    }
}
