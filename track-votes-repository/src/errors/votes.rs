//! Error types for the votes repository.
//! Separates storage failures from the domain rejections that are detected
//! inside a transaction and cause it to roll back.
use thiserror::Error;
use uuid::Uuid;

/// Represents errors that can occur within the votes repository.
///
/// `DatabaseError` and `Unavailable` are storage failures. The remaining
/// variants are rejections raised while re-validating a paired update inside
/// its transaction; when one is returned no write of that update was applied.
#[derive(Debug, Error)]
pub enum VotesRepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Track not found: {0}")]
    TrackNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("User {user_id} already voted for track {track_id}")]
    DuplicateVote { user_id: Uuid, track_id: String },

    #[error("User {user_id} has no vote on track {track_id}")]
    NotVoted { user_id: Uuid, track_id: String },

    #[error("User {0} has no remaining votes")]
    QuotaExhausted(Uuid),
}

impl VotesRepositoryError {
    /// Create an unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Returns true for storage failures, false for domain rejections.
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            Self::DatabaseError(_) | Self::MigrationError(_) | Self::Unavailable(_)
        )
    }
}
