//! In-memory store for testing and local development.
//!
//! `InMemoryStore` implements both `VotesRepository` and `TracksRepository`
//! over one mutex-guarded state. Each paired update validates and applies all
//! of its writes while holding the lock, which gives it the same
//! all-or-nothing semantics as a PostgreSQL transaction.
//!
//! # Example
//!
//! ```ignore
//! use track_votes_repository::InMemoryStore;
//!
//! let store = InMemoryStore::new();
//! store.insert_track(track);
//! store.insert_user(user);
//! let receipt = store.apply_cast(&cast, Utc::now()).await?;
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use track_votes_shared::types::{
    CastReceipt, CastVote, LeaderboardQuery, QuotaState, RetractReceipt, RetractVote, Track, User,
};
use uuid::Uuid;

use crate::{TracksRepository, VotesRepository, VotesRepositoryError};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    tracks: HashMap<String, Track>,
}

impl State {
    fn user_mut(&mut self, user_id: Uuid) -> Result<&mut User, VotesRepositoryError> {
        self.users
            .get_mut(&user_id)
            .ok_or(VotesRepositoryError::UserNotFound(user_id))
    }
}

/// Vote store held entirely in process memory.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `users` and `tracks`.
    pub fn with_records(users: impl IntoIterator<Item = User>, tracks: impl IntoIterator<Item = Track>) -> Self {
        let store = Self::new();
        for track in tracks {
            store.insert_track(track);
        }
        for user in users {
            store.insert_user(user);
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_available(&self) -> Result<(), VotesRepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(VotesRepositoryError::unavailable("in-memory store marked unavailable"));
        }
        Ok(())
    }

    /// Inserts or replaces a user record.
    pub fn insert_user(&self, user: User) {
        self.lock().users.insert(user.id, user);
    }

    /// Inserts or replaces a track record.
    pub fn insert_track(&self, track: Track) {
        self.lock().tracks.insert(track.id.clone(), track);
    }

    /// Deletes a track and every vote on it, as a catalog removal would.
    pub fn remove_track(&self, track_id: &str) {
        let mut state = self.lock();
        state.tracks.remove(track_id);
        for user in state.users.values_mut() {
            user.voted_tracks.remove(track_id);
        }
    }

    /// Overwrites a track counter without touching any vote set.
    ///
    /// Reproduces the drift left behind by non-transactional writers.
    pub fn force_track_votes(&self, track_id: &str, votes: i64) {
        if let Some(track) = self.lock().tracks.get_mut(track_id) {
            track.votes = votes;
        }
    }

    /// Makes every subsequent operation fail with `Unavailable` while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn user(&self, user_id: Uuid) -> Option<User> {
        self.lock().users.get(&user_id).cloned()
    }

    pub fn track(&self, track_id: &str) -> Option<Track> {
        self.lock().tracks.get(track_id).cloned()
    }

    /// Number of users holding an active vote on `track_id`.
    pub fn active_votes(&self, track_id: &str) -> i64 {
        self.lock()
            .users
            .values()
            .filter(|user| user.has_voted_for(track_id))
            .count() as i64
    }

    /// Ids of tracks whose counter disagrees with the recorded vote sets.
    pub fn drifted_tracks(&self) -> Vec<String> {
        let state = self.lock();
        let mut drifted: Vec<String> = state
            .tracks
            .values()
            .filter(|track| {
                let actual = state.users.values().filter(|u| u.has_voted_for(&track.id)).count() as i64;
                track.votes != actual
            })
            .map(|track| track.id.clone())
            .collect();
        drifted.sort();
        drifted
    }
}

#[async_trait]
impl VotesRepository for InMemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, VotesRepositoryError> {
        self.check_available()?;
        Ok(self.lock().users.values().find(|user| user.email == email).cloned())
    }

    async fn store_quota(
        &self,
        user_id: Uuid,
        expected_refresh: DateTime<Utc>,
        quota: QuotaState,
    ) -> Result<bool, VotesRepositoryError> {
        self.check_available()?;
        let mut state = self.lock();
        let user = state.user_mut(user_id)?;
        if user.last_vote_refresh != expected_refresh {
            return Ok(false);
        }
        user.remaining_votes = quota.remaining_votes;
        user.last_vote_refresh = quota.last_vote_refresh;
        Ok(true)
    }

    async fn apply_cast(&self, cast: &CastVote, _voted_at: DateTime<Utc>) -> Result<CastReceipt, VotesRepositoryError> {
        self.check_available()?;
        let mut state = self.lock();

        // Validate everything before the first write.
        let user = state
            .users
            .get(&cast.user_id)
            .ok_or(VotesRepositoryError::UserNotFound(cast.user_id))?;
        if !state.tracks.contains_key(&cast.track_id) {
            return Err(VotesRepositoryError::TrackNotFound(cast.track_id.clone()));
        }
        if user.has_voted_for(&cast.track_id) {
            return Err(VotesRepositoryError::DuplicateVote {
                user_id: cast.user_id,
                track_id: cast.track_id.clone(),
            });
        }
        if cast.consume_quota && user.remaining_votes <= 0 {
            return Err(VotesRepositoryError::QuotaExhausted(cast.user_id));
        }

        let user = state.user_mut(cast.user_id)?;
        user.voted_tracks.insert(cast.track_id.clone());
        if cast.consume_quota {
            user.remaining_votes -= 1;
        }
        let voted_tracks = user.voted_tracks.clone();
        let remaining_votes = user.remaining_votes;

        let track = state
            .tracks
            .get_mut(&cast.track_id)
            .ok_or_else(|| VotesRepositoryError::TrackNotFound(cast.track_id.clone()))?;
        track.votes += 1;

        Ok(CastReceipt {
            track: track.clone(),
            voted_tracks,
            remaining_votes,
        })
    }

    async fn apply_retract(&self, retract: &RetractVote) -> Result<RetractReceipt, VotesRepositoryError> {
        self.check_available()?;
        let mut state = self.lock();

        let user = state
            .users
            .get(&retract.user_id)
            .ok_or(VotesRepositoryError::UserNotFound(retract.user_id))?;
        if !user.has_voted_for(&retract.track_id) {
            return Err(VotesRepositoryError::NotVoted {
                user_id: retract.user_id,
                track_id: retract.track_id.clone(),
            });
        }
        if !state.tracks.contains_key(&retract.track_id) {
            return Err(VotesRepositoryError::TrackNotFound(retract.track_id.clone()));
        }

        let user = state.user_mut(retract.user_id)?;
        user.voted_tracks.remove(&retract.track_id);
        let voted_tracks = user.voted_tracks.clone();

        let track = state
            .tracks
            .get_mut(&retract.track_id)
            .ok_or_else(|| VotesRepositoryError::TrackNotFound(retract.track_id.clone()))?;
        track.votes = (track.votes - 1).max(0);

        Ok(RetractReceipt {
            track: track.clone(),
            voted_tracks,
        })
    }

    async fn reconcile_vote_counts(&self) -> Result<u64, VotesRepositoryError> {
        self.check_available()?;
        let mut state = self.lock();

        let mut actual: HashMap<String, i64> = HashMap::new();
        for user in state.users.values() {
            for track_id in &user.voted_tracks {
                *actual.entry(track_id.clone()).or_default() += 1;
            }
        }

        let mut corrected = 0;
        for track in state.tracks.values_mut() {
            let votes = actual.get(&track.id).copied().unwrap_or(0);
            if track.votes != votes {
                track.votes = votes;
                corrected += 1;
            }
        }
        Ok(corrected)
    }
}

#[async_trait]
impl TracksRepository for InMemoryStore {
    async fn find_track(&self, track_id: &str) -> Result<Option<Track>, VotesRepositoryError> {
        self.check_available()?;
        Ok(self.lock().tracks.get(track_id).cloned())
    }

    async fn leaderboard(&self, query: &LeaderboardQuery, now: DateTime<Utc>) -> Result<Vec<Track>, VotesRepositoryError> {
        self.check_available()?;
        let state = self.lock();
        Ok(query.rank(state.tracks.values(), now))
    }
}
