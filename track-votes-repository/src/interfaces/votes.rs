//! This module defines the `VotesRepository` trait, the interface between the
//! vote ledger and the store holding user records, vote pairs and track counters.
use chrono::{DateTime, Utc};
use track_votes_shared::types::{CastReceipt, CastVote, QuotaState, RetractReceipt, RetractVote, User};
use uuid::Uuid;

use crate::errors::VotesRepositoryError;

/// A trait that defines the interface for the vote accounting store.
///
/// Implementors must apply `apply_cast` and `apply_retract` atomically: the
/// track counter, the user's vote set and the user's quota change together or
/// not at all. Implementors re-validate the preconditions inside that atomic
/// unit, so concurrent callers cannot double count a vote or overdraw a quota.
#[async_trait::async_trait]
pub trait VotesRepository: Send + Sync {
    /// Looks up a user, with their current vote set, by identity key.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(User))` - The user record
    /// * `Ok(None)` - No user is registered under `email`
    /// * `Err(VotesRepositoryError)` - Storage failure
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, VotesRepositoryError>;

    /// Writes the quota fields of a user after a refresh.
    ///
    /// The write only applies while the stored `last_vote_refresh` still
    /// equals `expected_refresh`, the value the refresh was computed from.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The quota was written
    /// * `Ok(false)` - The quota was refreshed concurrently; nothing was written
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if the user does not exist.
    async fn store_quota(
        &self,
        user_id: Uuid,
        expected_refresh: DateTime<Utc>,
        quota: QuotaState,
    ) -> Result<bool, VotesRepositoryError>;

    /// Records a new active vote.
    ///
    /// Increments the track counter, adds the track to the user's vote set and,
    /// if `cast.consume_quota` is set, decrements the user's remaining votes.
    ///
    /// # Errors
    ///
    /// * `TrackNotFound` - The track does not exist
    /// * `UserNotFound` - The user does not exist
    /// * `DuplicateVote` - The user already holds a vote on the track
    /// * `QuotaExhausted` - The quota must be consumed but is zero
    ///
    /// On any error nothing is written.
    async fn apply_cast(&self, cast: &CastVote, voted_at: DateTime<Utc>) -> Result<CastReceipt, VotesRepositoryError>;

    /// Removes an active vote.
    ///
    /// Decrements the track counter (never below zero) and removes the track
    /// from the user's vote set. The quota is left untouched.
    ///
    /// # Errors
    ///
    /// * `NotVoted` - The user holds no vote on the track
    /// * `TrackNotFound` - The track does not exist
    ///
    /// On any error nothing is written.
    async fn apply_retract(&self, retract: &RetractVote) -> Result<RetractReceipt, VotesRepositoryError>;

    /// Recomputes every track counter from the recorded vote pairs.
    ///
    /// # Returns
    ///
    /// The number of tracks whose counter was corrected.
    async fn reconcile_vote_counts(&self) -> Result<u64, VotesRepositoryError>;
}
