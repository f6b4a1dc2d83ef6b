use chrono::{DateTime, Utc};
use track_votes_shared::types::{LeaderboardQuery, Track};

use crate::errors::VotesRepositoryError;

/// Read-only access to track records.
///
/// Reads observe the same `votes` counter the ledger writes.
#[async_trait::async_trait]
pub trait TracksRepository: Send + Sync {
    async fn find_track(&self, track_id: &str) -> Result<Option<Track>, VotesRepositoryError>;

    /// Returns the tracks of `query.genre` added within `query.period` before
    /// `now`, ordered as `LeaderboardQuery::compare` defines.
    async fn leaderboard(&self, query: &LeaderboardQuery, now: DateTime<Utc>) -> Result<Vec<Track>, VotesRepositoryError>;
}
