// HTTP request handlers
use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::{debug, info};
use track_votes_shared::types::{CastReceipt, LeaderboardQuery, RetractReceipt, Track, TrackSummary, VoterStatus};

use crate::error::ApiError;
use crate::server::state::AppState;

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "Track votes server is running")
}

/// Popular tracks relayed from the catalog source.
pub async fn popular_tracks(State(state): State<AppState>) -> Result<Json<Vec<TrackSummary>>, ApiError> {
    let tracks = state.catalog.popular_tracks().await?;
    Ok(Json(tracks))
}

/// Ranked tracks of one genre, e.g.
/// `/tracks/leaderboard?genre=rap&sortBy=votes&period=3-last-months&order=decreasing`.
pub async fn leaderboard(
    State(state): State<AppState>,
    query: Result<Query<LeaderboardQuery>, QueryRejection>,
) -> Result<Json<Vec<Track>>, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let tracks = state.tracks.leaderboard(&query, state.clock.now()).await?;

    debug!(
        genre = %query.genre,
        sort_by = ?query.sort_by,
        period = ?query.period,
        order = ?query.order,
        count = tracks.len(),
        "Leaderboard served"
    );
    Ok(Json(tracks))
}

/// Casts the caller's vote on a track.
pub async fn cast_vote(
    State(state): State<AppState>,
    Path(track_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<CastReceipt>, ApiError> {
    let identity = state.identity.identify(&headers);
    info!(track_id = %track_id, authenticated = identity.is_some(), "Received vote request");

    let receipt = state.ledger.cast_vote(identity.as_ref(), &track_id).await?;
    Ok(Json(receipt))
}

/// Retracts the caller's vote on a track.
pub async fn retract_vote(
    State(state): State<AppState>,
    Path(track_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<RetractReceipt>, ApiError> {
    let identity = state.identity.identify(&headers);
    info!(track_id = %track_id, authenticated = identity.is_some(), "Received retraction request");

    let receipt = state.ledger.retract_vote(identity.as_ref(), &track_id).await?;
    Ok(Json(receipt))
}

/// The caller's vote set and remaining quota.
pub async fn current_user(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<VoterStatus>, ApiError> {
    let identity = state.identity.identify(&headers);

    let status = state.ledger.voter_status(identity.as_ref()).await?;
    Ok(Json(status))
}
