use async_trait::async_trait;
use chrono::{DateTime, Utc};
use track_votes_shared::types::{LeaderboardQuery, SortDirection, SortKey, Track};

use super::{TRACK_COLUMNS, TrackRow};
use crate::{TracksRepository, VotesRepositoryError};

/// PostgreSQL-backed read access to tracks.
pub struct PostgresTracksRepository {
    pool: sqlx::PgPool,
}

impl PostgresTracksRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

/// Builds the ORDER BY clause for a leaderboard query.
///
/// Only enum-derived identifiers are interpolated. Ids compare with the "C"
/// collation so ties break in byte order, as `LeaderboardQuery::compare` does.
fn order_clause(query: &LeaderboardQuery) -> String {
    let column = match query.sort_by {
        SortKey::Popularity => "popularity",
        SortKey::Votes => "votes",
    };
    let direction = match query.order {
        SortDirection::Increasing => "ASC",
        SortDirection::Decreasing => "DESC",
    };
    format!("ORDER BY {column} {direction}, id COLLATE \"C\" ASC")
}

#[async_trait]
impl TracksRepository for PostgresTracksRepository {
    async fn find_track(&self, track_id: &str) -> Result<Option<Track>, VotesRepositoryError> {
        let sql = format!("SELECT {TRACK_COLUMNS} FROM tracks WHERE id = $1");
        let row = sqlx::query_as::<_, TrackRow>(&sql)
            .bind(track_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Track::from))
    }

    async fn leaderboard(&self, query: &LeaderboardQuery, now: DateTime<Utc>) -> Result<Vec<Track>, VotesRepositoryError> {
        let sql = format!(
            "SELECT {TRACK_COLUMNS} FROM tracks \
             WHERE lower(genre) = lower($1) AND added_at >= $2 AND added_at <= $3 \
             {} LIMIT $4",
            order_clause(query)
        );

        let rows = sqlx::query_as::<_, TrackRow>(&sql)
            .bind(&query.genre)
            .bind(query.period.since(now))
            .bind(now)
            .bind(query.effective_limit() as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Track::from).collect())
    }
}
