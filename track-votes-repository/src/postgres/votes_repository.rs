use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use track_votes_shared::types::{CastReceipt, CastVote, QuotaState, RetractReceipt, RetractVote, Track, User};
use uuid::Uuid;

use super::{TRACK_COLUMNS, TrackRow};
use crate::{VotesRepository, VotesRepositoryError};

/// PostgreSQL implementation of the votes repository.
///
/// Every paired update runs in its own transaction. The user row is locked
/// with `SELECT ... FOR UPDATE` before anything else, so concurrent casts by
/// the same user serialize, and every rejection returns before `commit`,
/// which rolls the whole transaction back.
pub struct PostgresVotesRepository {
    pool: sqlx::PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    is_admin: bool,
    remaining_votes: i32,
    last_vote_refresh: DateTime<Utc>,
    voted_tracks: Vec<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            is_admin: row.is_admin,
            voted_tracks: row.voted_tracks.into_iter().collect(),
            remaining_votes: row.remaining_votes,
            last_vote_refresh: row.last_vote_refresh,
        }
    }
}

impl PostgresVotesRepository {
    /// Creates a new PostgreSQL repository instance.
    ///
    /// # Arguments
    ///
    /// * `pool` - Configured PostgreSQL connection pool with the migrated schema
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    /// Locks the user row and returns its remaining votes.
    async fn lock_user_tx(
        &self,
        user_id: Uuid,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<i32, VotesRepositoryError> {
        sqlx::query_scalar::<_, i32>("SELECT remaining_votes FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(VotesRepositoryError::UserNotFound(user_id))
    }

    /// Adds `delta` to the track counter, clamping at zero.
    async fn bump_track_votes_tx(
        &self,
        track_id: &str,
        delta: i64,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<Track, VotesRepositoryError> {
        let sql = format!(
            "UPDATE tracks SET votes = GREATEST(votes + $2, 0) WHERE id = $1 RETURNING {TRACK_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TrackRow>(&sql)
            .bind(track_id)
            .bind(delta)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| VotesRepositoryError::TrackNotFound(track_id.to_string()))?;
        Ok(row.into())
    }

    async fn voted_tracks_tx(
        &self,
        user_id: Uuid,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<BTreeSet<String>, VotesRepositoryError> {
        let track_ids = sqlx::query_scalar::<_, String>("SELECT track_id FROM user_votes WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&mut **tx)
            .await?;
        Ok(track_ids.into_iter().collect())
    }
}

#[async_trait]
impl VotesRepository for PostgresVotesRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, VotesRepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.id, u.email, u.is_admin, u.remaining_votes, u.last_vote_refresh,
                   COALESCE(array_agg(uv.track_id) FILTER (WHERE uv.track_id IS NOT NULL), '{}') AS voted_tracks
            FROM users u
            LEFT JOIN user_votes uv ON uv.user_id = u.id
            WHERE u.email = $1
            GROUP BY u.id
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn store_quota(
        &self,
        user_id: Uuid,
        expected_refresh: DateTime<Utc>,
        quota: QuotaState,
    ) -> Result<bool, VotesRepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET remaining_votes = $2, last_vote_refresh = $3
            WHERE id = $1 AND last_vote_refresh = $4
            "#,
        )
        .bind(user_id)
        .bind(quota.remaining_votes)
        .bind(quota.last_vote_refresh)
        .bind(expected_refresh)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Err(VotesRepositoryError::UserNotFound(user_id));
        }
        Ok(false)
    }

    /// Records a vote in a single transaction.
    ///
    /// Locks the user, increments the track counter, inserts the vote pair
    /// (`ON CONFLICT DO NOTHING` detects a duplicate) and, when required,
    /// decrements the quota only while it is positive.
    async fn apply_cast(&self, cast: &CastVote, voted_at: DateTime<Utc>) -> Result<CastReceipt, VotesRepositoryError> {
        let mut tx = self.pool.begin().await?;

        let mut remaining_votes = self.lock_user_tx(cast.user_id, &mut tx).await?;
        let track = self.bump_track_votes_tx(&cast.track_id, 1, &mut tx).await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO user_votes (user_id, track_id, voted_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, track_id) DO NOTHING
            "#,
        )
        .bind(cast.user_id)
        .bind(&cast.track_id)
        .bind(voted_at)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(VotesRepositoryError::DuplicateVote {
                user_id: cast.user_id,
                track_id: cast.track_id.clone(),
            });
        }

        if cast.consume_quota {
            remaining_votes = sqlx::query_scalar::<_, i32>(
                r#"
                UPDATE users SET remaining_votes = remaining_votes - 1
                WHERE id = $1 AND remaining_votes > 0
                RETURNING remaining_votes
                "#,
            )
            .bind(cast.user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(VotesRepositoryError::QuotaExhausted(cast.user_id))?;
        }

        let voted_tracks = self.voted_tracks_tx(cast.user_id, &mut tx).await?;
        tx.commit().await?;

        Ok(CastReceipt {
            track,
            voted_tracks,
            remaining_votes,
        })
    }

    /// Removes a vote in a single transaction.
    async fn apply_retract(&self, retract: &RetractVote) -> Result<RetractReceipt, VotesRepositoryError> {
        let mut tx = self.pool.begin().await?;

        self.lock_user_tx(retract.user_id, &mut tx).await?;

        let deleted = sqlx::query("DELETE FROM user_votes WHERE user_id = $1 AND track_id = $2")
            .bind(retract.user_id)
            .bind(&retract.track_id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(VotesRepositoryError::NotVoted {
                user_id: retract.user_id,
                track_id: retract.track_id.clone(),
            });
        }

        let track = self.bump_track_votes_tx(&retract.track_id, -1, &mut tx).await?;
        let voted_tracks = self.voted_tracks_tx(retract.user_id, &mut tx).await?;
        tx.commit().await?;

        Ok(RetractReceipt { track, voted_tracks })
    }

    async fn reconcile_vote_counts(&self) -> Result<u64, VotesRepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE tracks t
            SET votes = actual.votes
            FROM (
                SELECT tr.id, COUNT(uv.track_id) AS votes
                FROM tracks tr
                LEFT JOIN user_votes uv ON uv.track_id = tr.id
                GROUP BY tr.id
            ) AS actual
            WHERE t.id = actual.id AND t.votes <> actual.votes
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
