//! PostgreSQL implementation of the track votes repository.
//!
//! Provides the production backend for the `VotesRepository` and
//! `TracksRepository` traits.
//!
//! ## Key Features
//!
//! - Connection pooling with `sqlx::PgPool`
//! - One transaction per paired vote update, rolled back on any rejection
//! - `(user_id, track_id)` primary key on `user_votes` closing the duplicate-vote race
//! - Conditional quota decrement closing the quota-overdraw race
//! - Embedded migrations (`src/postgres/migrations`)
//!
//! ## Database Tables
//!
//! - `users`: identity key, admin flag and quota
//! - `tracks`: catalog metadata and the aggregate `votes` counter
//! - `user_votes`: one row per active vote
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use track_votes_shared::types::Track;

use crate::errors::VotesRepositoryError;

mod tracks_repository;
mod votes_repository;

pub use tracks_repository::PostgresTracksRepository;
pub use votes_repository::PostgresVotesRepository;

/// Migrations creating the `users`, `tracks` and `user_votes` tables.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("src/postgres/migrations");

/// Opens a connection pool to `database_url`.
///
/// # Arguments
///
/// * `database_url` - PostgreSQL connection string
/// * `max_connections` - Upper bound on pooled connections
pub async fn connect(database_url: &str, max_connections: u32) -> Result<sqlx::PgPool, VotesRepositoryError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Applies pending migrations.
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<(), VotesRepositoryError> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Column list matching `TrackRow`.
pub(crate) const TRACK_COLUMNS: &str = "id, title, artist, genre, popularity, votes, added_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct TrackRow {
    id: String,
    title: String,
    artist: String,
    genre: String,
    popularity: i32,
    votes: i64,
    added_at: DateTime<Utc>,
}

impl From<TrackRow> for Track {
    fn from(row: TrackRow) -> Self {
        Track {
            id: row.id,
            title: row.title,
            artist: row.artist,
            genre: row.genre,
            popularity: row.popularity,
            votes: row.votes,
            added_at: row.added_at,
        }
    }
}
