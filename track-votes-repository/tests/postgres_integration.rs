//! Integration tests for the PostgreSQL votes repository.
//!
//! These tests require a real PostgreSQL database and use SQLx test macros
//! to ensure proper test isolation and cleanup.
//!
//! Run with: `DATABASE_URL=postgres://... cargo test --test postgres_integration -- --ignored`

use chrono::{DateTime, Duration, Utc};
use sqlx::Row;
use track_votes_repository::{
    PostgresTracksRepository, PostgresVotesRepository, TracksRepository, VotesRepository, VotesRepositoryError,
};
use track_votes_shared::types::{CastVote, LeaderboardQuery, QuotaState, RetractVote, SortDirection, SortKey};
use uuid::Uuid;

async fn insert_user(pool: &sqlx::PgPool, email: &str, is_admin: bool, remaining_votes: i32) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, email, is_admin, remaining_votes, last_vote_refresh) VALUES ($1, $2, $3, $4, NOW())")
        .bind(id)
        .bind(email)
        .bind(is_admin)
        .bind(remaining_votes)
        .execute(pool)
        .await
        .unwrap();
    id
}

async fn insert_track(pool: &sqlx::PgPool, id: &str, genre: &str, popularity: i32, votes: i64, added_at: DateTime<Utc>) {
    sqlx::query("INSERT INTO tracks (id, title, artist, genre, popularity, votes, added_at) VALUES ($1, $2, $3, $4, $5, $6, $7)")
        .bind(id)
        .bind(format!("Title {id}"))
        .bind("Artist")
        .bind(genre)
        .bind(popularity)
        .bind(votes)
        .bind(added_at)
        .execute(pool)
        .await
        .unwrap();
}

async fn track_votes(pool: &sqlx::PgPool, id: &str) -> i64 {
    sqlx::query("SELECT votes FROM tracks WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
        .get::<i64, _>("votes")
}

fn cast(user_id: Uuid, track_id: &str, consume_quota: bool) -> CastVote {
    CastVote {
        user_id,
        track_id: track_id.to_string(),
        consume_quota,
    }
}

// ============================================================================
// Cast Tests
// ============================================================================

#[sqlx::test(migrations = "src/postgres/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_cast_vote_updates_track_set_and_quota(pool: sqlx::PgPool) {
    let repository = PostgresVotesRepository::new(pool.clone());
    let user_id = insert_user(&pool, "u@example.com", false, 3).await;
    insert_track(&pool, "T", "r&b", 50, 10, Utc::now()).await;

    let receipt = repository.apply_cast(&cast(user_id, "T", true), Utc::now()).await.unwrap();

    assert_eq!(receipt.track.votes, 11);
    assert_eq!(receipt.remaining_votes, 2);
    assert_eq!(receipt.voted_tracks.into_iter().collect::<Vec<_>>(), vec!["T".to_string()]);

    let user = repository.find_user_by_email("u@example.com").await.unwrap().unwrap();
    assert!(user.has_voted_for("T"));
    assert_eq!(user.remaining_votes, 2);
}

#[sqlx::test(migrations = "src/postgres/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_cast_rolls_back(pool: sqlx::PgPool) {
    let repository = PostgresVotesRepository::new(pool.clone());
    let user_id = insert_user(&pool, "u@example.com", false, 3).await;
    insert_track(&pool, "T", "r&b", 50, 10, Utc::now()).await;

    repository.apply_cast(&cast(user_id, "T", true), Utc::now()).await.unwrap();
    let result = repository.apply_cast(&cast(user_id, "T", true), Utc::now()).await;

    assert!(matches!(result, Err(VotesRepositoryError::DuplicateVote { .. })));
    assert_eq!(track_votes(&pool, "T").await, 11);
    let user = repository.find_user_by_email("u@example.com").await.unwrap().unwrap();
    assert_eq!(user.remaining_votes, 2);
}

#[sqlx::test(migrations = "src/postgres/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_cast_on_missing_track_leaves_user_untouched(pool: sqlx::PgPool) {
    let repository = PostgresVotesRepository::new(pool.clone());
    let user_id = insert_user(&pool, "u@example.com", false, 3).await;

    let result = repository.apply_cast(&cast(user_id, "missing", true), Utc::now()).await;

    assert!(matches!(result, Err(VotesRepositoryError::TrackNotFound(_))));
    let user = repository.find_user_by_email("u@example.com").await.unwrap().unwrap();
    assert!(user.voted_tracks.is_empty());
    assert_eq!(user.remaining_votes, 3);
}

#[sqlx::test(migrations = "src/postgres/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_cast_with_exhausted_quota_rolls_back(pool: sqlx::PgPool) {
    let repository = PostgresVotesRepository::new(pool.clone());
    let user_id = insert_user(&pool, "u@example.com", false, 0).await;
    insert_track(&pool, "T", "r&b", 50, 10, Utc::now()).await;

    let result = repository.apply_cast(&cast(user_id, "T", true), Utc::now()).await;

    assert!(matches!(result, Err(VotesRepositoryError::QuotaExhausted(_))));
    assert_eq!(track_votes(&pool, "T").await, 10);
}

#[sqlx::test(migrations = "src/postgres/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_admin_cast_keeps_quota(pool: sqlx::PgPool) {
    let repository = PostgresVotesRepository::new(pool.clone());
    let user_id = insert_user(&pool, "admin@example.com", true, 0).await;
    insert_track(&pool, "T", "r&b", 50, 10, Utc::now()).await;

    let receipt = repository.apply_cast(&cast(user_id, "T", false), Utc::now()).await.unwrap();

    assert_eq!(receipt.track.votes, 11);
    assert_eq!(receipt.remaining_votes, 0);
}

#[sqlx::test(migrations = "src/postgres/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_duplicate_casts_count_once(pool: sqlx::PgPool) {
    let repository = std::sync::Arc::new(PostgresVotesRepository::new(pool.clone()));
    let user_id = insert_user(&pool, "u@example.com", false, 10).await;
    insert_track(&pool, "T", "r&b", 50, 0, Utc::now()).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let repository = repository.clone();
        handles.push(tokio::spawn(async move {
            repository.apply_cast(&cast(user_id, "T", true), Utc::now()).await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            accepted += 1;
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(track_votes(&pool, "T").await, 1);
}

// ============================================================================
// Retract Tests
// ============================================================================

#[sqlx::test(migrations = "src/postgres/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_retract_round_trip(pool: sqlx::PgPool) {
    let repository = PostgresVotesRepository::new(pool.clone());
    let user_id = insert_user(&pool, "u@example.com", false, 3).await;
    insert_track(&pool, "T", "r&b", 50, 10, Utc::now()).await;

    repository.apply_cast(&cast(user_id, "T", true), Utc::now()).await.unwrap();
    let receipt = repository
        .apply_retract(&RetractVote {
            user_id,
            track_id: "T".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(receipt.track.votes, 10);
    assert!(receipt.voted_tracks.is_empty());
    let user = repository.find_user_by_email("u@example.com").await.unwrap().unwrap();
    assert_eq!(user.remaining_votes, 2);
}

#[sqlx::test(migrations = "src/postgres/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_retract_without_vote_is_rejected(pool: sqlx::PgPool) {
    let repository = PostgresVotesRepository::new(pool.clone());
    let user_id = insert_user(&pool, "u@example.com", false, 3).await;
    insert_track(&pool, "T", "r&b", 50, 10, Utc::now()).await;

    let result = repository
        .apply_retract(&RetractVote {
            user_id,
            track_id: "T".to_string(),
        })
        .await;

    assert!(matches!(result, Err(VotesRepositoryError::NotVoted { .. })));
    assert_eq!(track_votes(&pool, "T").await, 10);
}

// ============================================================================
// Quota and Reconcile Tests
// ============================================================================

#[sqlx::test(migrations = "src/postgres/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_store_quota_is_conditional_on_refresh_time(pool: sqlx::PgPool) {
    let repository = PostgresVotesRepository::new(pool.clone());
    insert_user(&pool, "u@example.com", false, 0).await;
    let user = repository.find_user_by_email("u@example.com").await.unwrap().unwrap();
    let refreshed_at = user.last_vote_refresh + Duration::days(30);
    let quota = QuotaState {
        remaining_votes: 10,
        last_vote_refresh: refreshed_at,
    };

    assert!(repository.store_quota(user.id, user.last_vote_refresh, quota).await.unwrap());
    let stored = repository.find_user_by_email("u@example.com").await.unwrap().unwrap();
    assert_eq!(stored.remaining_votes, 10);

    // A second refresh computed from the old refresh time must not apply.
    let written = repository
        .store_quota(user.id, user.last_vote_refresh, quota)
        .await
        .unwrap();
    assert!(!written);

    let missing = repository.store_quota(Uuid::new_v4(), refreshed_at, quota).await;
    assert!(matches!(missing, Err(VotesRepositoryError::UserNotFound(_))));
}

#[sqlx::test(migrations = "src/postgres/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_reconcile_vote_counts(pool: sqlx::PgPool) {
    let repository = PostgresVotesRepository::new(pool.clone());
    let user_id = insert_user(&pool, "u@example.com", false, 3).await;
    insert_track(&pool, "A", "r&b", 50, 0, Utc::now()).await;
    insert_track(&pool, "B", "r&b", 50, 7, Utc::now()).await;
    repository.apply_cast(&cast(user_id, "A", true), Utc::now()).await.unwrap();
    sqlx::query("UPDATE tracks SET votes = 4 WHERE id = 'A'").execute(&pool).await.unwrap();

    assert_eq!(repository.reconcile_vote_counts().await.unwrap(), 2);
    assert_eq!(track_votes(&pool, "A").await, 1);
    assert_eq!(track_votes(&pool, "B").await, 0);
    assert_eq!(repository.reconcile_vote_counts().await.unwrap(), 0);
}

// ============================================================================
// Leaderboard Tests
// ============================================================================

#[sqlx::test(migrations = "src/postgres/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_leaderboard_filters_and_orders(pool: sqlx::PgPool) {
    let repository = PostgresTracksRepository::new(pool.clone());
    let now = Utc::now();
    insert_track(&pool, "a", "R&B", 10, 5, now - Duration::days(3)).await;
    insert_track(&pool, "b", "r&b", 90, 12, now - Duration::days(10)).await;
    insert_track(&pool, "c", "r&b", 50, 7, now - Duration::days(45)).await;
    insert_track(&pool, "d", "rap", 99, 100, now - Duration::days(1)).await;

    let query = LeaderboardQuery::for_genre("r&b").sorted_by(SortKey::Votes, SortDirection::Decreasing);
    let ranked = repository.leaderboard(&query, now).await.unwrap();

    let ids: Vec<&str> = ranked.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);

    assert!(repository.find_track("d").await.unwrap().is_some());
    assert!(repository.find_track("zz").await.unwrap().is_none());
}
