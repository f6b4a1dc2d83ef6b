//! The vote ledger.
//!
//! `VoteLedger` owns the invariant linking every user's vote set to each
//! track's aggregate counter:
//!
//! `track.votes == |{ u : track.id ∈ u.voted_tracks }|`
//!
//! It checks the preconditions of an operation against a fresh read of the
//! user record, then hands the paired write to the `VotesRepository`, which
//! applies it atomically and re-validates it so concurrent requests cannot
//! break the invariant. The ledger itself holds no locks.

use std::sync::Arc;

use track_votes_repository::VotesRepository;
use track_votes_shared::types::{CastReceipt, CastVote, RetractReceipt, RetractVote, User, UserIdentity, VoterStatus};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::errors::LedgerError;
use crate::quota::QuotaPolicy;

pub struct VoteLedger {
    votes: Arc<dyn VotesRepository>,
    policy: QuotaPolicy,
    clock: Arc<dyn Clock>,
}

impl VoteLedger {
    /// Creates a ledger over `votes` using the wall clock.
    pub fn new(votes: Arc<dyn VotesRepository>, policy: QuotaPolicy) -> Self {
        Self::with_clock(votes, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(votes: Arc<dyn VotesRepository>, policy: QuotaPolicy, clock: Arc<dyn Clock>) -> Self {
        Self { votes, policy, clock }
    }

    pub fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    /// Resolves the caller to their user record, if they have one.
    async fn load_user(&self, identity: Option<&UserIdentity>) -> Result<Option<User>, LedgerError> {
        let identity = identity.ok_or(LedgerError::Unauthenticated)?;
        Ok(self.votes.find_user_by_email(&identity.email).await?)
    }

    async fn require_user(&self, identity: Option<&UserIdentity>) -> Result<User, LedgerError> {
        let identity = identity.ok_or(LedgerError::Unauthenticated)?;
        self.votes
            .find_user_by_email(&identity.email)
            .await?
            .ok_or_else(|| LedgerError::UserNotFound(identity.email.clone()))
    }

    /// Applies the refresh rule to `user` and persists it if the quota changed.
    ///
    /// The write is conditional on the refresh time read with `user`. If
    /// another request refreshed the quota first, nothing is written and
    /// `user` is reloaded, so votes spent since are not handed back.
    async fn refresh_quota(&self, user: &mut User) -> Result<(), LedgerError> {
        let refresh = self
            .policy
            .refresh(self.clock.now(), user.last_vote_refresh, user.remaining_votes);

        if !refresh.refreshed {
            return Ok(());
        }

        if self
            .votes
            .store_quota(user.id, user.last_vote_refresh, refresh.quota)
            .await?
        {
            debug!(
                user_id = %user.id,
                remaining_votes = refresh.quota.remaining_votes,
                "Vote quota refreshed"
            );
            user.remaining_votes = refresh.quota.remaining_votes;
            user.last_vote_refresh = refresh.quota.last_vote_refresh;
        } else {
            debug!(user_id = %user.id, "Vote quota already refreshed, reloading user");
            let reloaded = self
                .votes
                .find_user_by_email(&user.email)
                .await?
                .ok_or_else(|| LedgerError::UserNotFound(user.email.clone()))?;
            *user = reloaded;
        }
        Ok(())
    }

    /// Casts a vote by the caller on `track_id`.
    ///
    /// Preconditions are checked in order: the caller is authenticated, their
    /// user record exists, their quota (after refresh) allows another vote,
    /// and they hold no vote on the track yet. The track increment, the vote
    /// set insertion and the quota decrement (skipped for admins) are then
    /// applied as one atomic store update.
    ///
    /// # Errors
    ///
    /// `Unauthenticated`, `UserNotFound`, `QuotaExceeded`, `DuplicateVote`,
    /// `TrackNotFound` or `StoreFailure`. On error nothing was written, except
    /// possibly the quota refresh, which stands on its own.
    pub async fn cast_vote(&self, identity: Option<&UserIdentity>, track_id: &str) -> Result<CastReceipt, LedgerError> {
        let mut user = self.require_user(identity).await?;

        self.refresh_quota(&mut user).await?;

        if !self.policy.is_eligible(&user) {
            warn!(user_id = %user.id, track_id = %track_id, "Vote rejected, quota exhausted");
            return Err(LedgerError::QuotaExceeded);
        }

        if user.has_voted_for(track_id) {
            warn!(user_id = %user.id, track_id = %track_id, "Vote rejected, duplicate");
            return Err(LedgerError::DuplicateVote(track_id.to_string()));
        }

        let cast = CastVote {
            user_id: user.id,
            track_id: track_id.to_string(),
            consume_quota: self.policy.consumes_quota(&user),
        };
        let receipt = self.votes.apply_cast(&cast, self.clock.now()).await?;

        info!(
            user_id = %user.id,
            track_id = %track_id,
            track_votes = receipt.track.votes,
            remaining_votes = receipt.remaining_votes,
            "Vote cast"
        );
        Ok(receipt)
    }

    /// Retracts the caller's vote on `track_id`.
    ///
    /// The quota spent on the vote is not given back.
    ///
    /// # Errors
    ///
    /// `Unauthenticated`, `NotVoted` (also when the caller has no user
    /// record), `TrackNotFound` or `StoreFailure`.
    pub async fn retract_vote(&self, identity: Option<&UserIdentity>, track_id: &str) -> Result<RetractReceipt, LedgerError> {
        let user = match self.load_user(identity).await? {
            Some(user) if user.has_voted_for(track_id) => user,
            _ => {
                warn!(track_id = %track_id, "Retraction rejected, no active vote");
                return Err(LedgerError::NotVoted(track_id.to_string()));
            }
        };

        let retract = RetractVote {
            user_id: user.id,
            track_id: track_id.to_string(),
        };
        let receipt = self.votes.apply_retract(&retract).await?;

        info!(
            user_id = %user.id,
            track_id = %track_id,
            track_votes = receipt.track.votes,
            "Vote retracted"
        );
        Ok(receipt)
    }

    /// Returns the caller's vote set and quota, refreshing the quota first.
    pub async fn voter_status(&self, identity: Option<&UserIdentity>) -> Result<VoterStatus, LedgerError> {
        let mut user = self.require_user(identity).await?;

        self.refresh_quota(&mut user).await?;
        Ok(VoterStatus::from(user))
    }

    /// Rewrites every track counter that disagrees with the recorded votes.
    ///
    /// Returns the number of tracks corrected.
    pub async fn reconcile(&self) -> Result<u64, LedgerError> {
        let corrected = self.votes.reconcile_vote_counts().await?;
        if corrected > 0 {
            warn!(corrected, "Reconciled drifted track vote counters");
        } else {
            info!("Track vote counters consistent");
        }
        Ok(corrected)
    }
}
