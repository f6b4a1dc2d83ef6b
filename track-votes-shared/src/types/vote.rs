use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Track, TrackId};

/// A request to record a new active vote.
///
/// The repository applies the track increment, the vote-set insertion and,
/// when `consume_quota` is set, the quota decrement as one atomic unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastVote {
    pub user_id: Uuid,
    pub track_id: TrackId,
    pub consume_quota: bool,
}

/// A request to remove an active vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetractVote {
    pub user_id: Uuid,
    pub track_id: TrackId,
}

/// Outcome of a successful cast: the counters as they are after the update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CastReceipt {
    pub track: Track,
    pub voted_tracks: BTreeSet<TrackId>,
    pub remaining_votes: i32,
}

/// Outcome of a successful retraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RetractReceipt {
    pub track: Track,
    pub voted_tracks: BTreeSet<TrackId>,
}

/// The quota fields of a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaState {
    pub remaining_votes: i32,
    pub last_vote_refresh: DateTime<Utc>,
}
