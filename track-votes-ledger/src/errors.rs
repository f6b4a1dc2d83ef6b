//! Error types for the vote ledger.
//! Every rejection of a cast or retract maps to exactly one variant, which the
//! request boundary translates to a user-facing status.
use thiserror::Error;
use track_votes_repository::VotesRepositoryError;

/// Represents the ways a ledger operation can fail.
///
/// Every variant except `StoreFailure` is a precondition rejection returned
/// before any write was applied, or by a store transaction that rolled back.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Track not found: {0}")]
    TrackNotFound(String),

    #[error("No votes remaining")]
    QuotaExceeded,

    #[error("Already voted for track {0}")]
    DuplicateVote(String),

    #[error("No active vote on track {0}")]
    NotVoted(String),

    #[error("Store failure: {0}")]
    StoreFailure(#[source] VotesRepositoryError),
}

impl From<VotesRepositoryError> for LedgerError {
    fn from(err: VotesRepositoryError) -> Self {
        match err {
            VotesRepositoryError::TrackNotFound(track_id) => Self::TrackNotFound(track_id),
            VotesRepositoryError::UserNotFound(user_id) => Self::UserNotFound(user_id.to_string()),
            VotesRepositoryError::DuplicateVote { track_id, .. } => Self::DuplicateVote(track_id),
            VotesRepositoryError::NotVoted { track_id, .. } => Self::NotVoted(track_id),
            VotesRepositoryError::QuotaExhausted(_) => Self::QuotaExceeded,
            other => Self::StoreFailure(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_domain_rejections_map_to_taxonomy() {
        let user_id = Uuid::new_v4();

        assert!(matches!(
            LedgerError::from(VotesRepositoryError::DuplicateVote {
                user_id,
                track_id: "t".to_string()
            }),
            LedgerError::DuplicateVote(id) if id == "t"
        ));
        assert!(matches!(
            LedgerError::from(VotesRepositoryError::QuotaExhausted(user_id)),
            LedgerError::QuotaExceeded
        ));
        assert!(matches!(
            LedgerError::from(VotesRepositoryError::NotVoted {
                user_id,
                track_id: "t".to_string()
            }),
            LedgerError::NotVoted(_)
        ));
    }

    #[test]
    fn test_storage_failures_map_to_store_failure() {
        let err = LedgerError::from(VotesRepositoryError::unavailable("down"));
        assert!(matches!(err, LedgerError::StoreFailure(_)));
    }
}
