//! Request-boundary errors.
//!
//! `ApiError` turns every failure of a handler into a status code and a
//! `{ "error": "..." }` body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, warn};
use track_votes_ledger::LedgerError;
use track_votes_repository::VotesRepositoryError;

use crate::catalog::CatalogError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Invalid query: {0}")]
    BadRequest(String),

    #[error("Failed to fetch tracks: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Failed to fetch leaderboard: {0}")]
    Leaderboard(#[from] VotesRepositoryError),
}

impl ApiError {
    /// Status code and client-facing message.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Ledger(err) => match err {
                LedgerError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Authentication required".into()),
                LedgerError::UserNotFound(_) => (StatusCode::NOT_FOUND, "User not found".into()),
                LedgerError::TrackNotFound(_) => (StatusCode::NOT_FOUND, "Track not found".into()),
                LedgerError::QuotaExceeded => (StatusCode::BAD_REQUEST, "No votes remaining".into()),
                LedgerError::DuplicateVote(_) => (StatusCode::BAD_REQUEST, "Already voted for this track".into()),
                LedgerError::NotVoted(_) => (StatusCode::BAD_REQUEST, "No active vote on this track".into()),
                LedgerError::StoreFailure(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to record vote".into()),
            },
            ApiError::BadRequest(reason) => (StatusCode::BAD_REQUEST, format!("Invalid query: {reason}")),
            ApiError::Catalog(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch tracks".into()),
            ApiError::Leaderboard(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch leaderboard".into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            error!(error = %self, status = status.as_u16(), "Request failed");
        } else if status == StatusCode::UNAUTHORIZED {
            debug!(error = %self, "Unauthenticated request");
        } else {
            warn!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_errors_map_to_statuses() {
        let cases = [
            (LedgerError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (LedgerError::UserNotFound("u".into()), StatusCode::NOT_FOUND),
            (LedgerError::TrackNotFound("t".into()), StatusCode::NOT_FOUND),
            (LedgerError::QuotaExceeded, StatusCode::BAD_REQUEST),
            (LedgerError::DuplicateVote("t".into()), StatusCode::BAD_REQUEST),
            (LedgerError::NotVoted("t".into()), StatusCode::BAD_REQUEST),
            (
                LedgerError::StoreFailure(VotesRepositoryError::unavailable("down")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), expected);
        }
    }

    #[test]
    fn test_catalog_failure_is_internal() {
        let (status, message) = ApiError::from(CatalogError::NotConfigured).status_and_message();

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Failed to fetch tracks");
    }
}
