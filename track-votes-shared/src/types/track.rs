use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Catalog identifier of a track.
pub type TrackId = String;

/// A track record with its aggregate vote counter.
///
/// Catalog metadata (title, artist, genre, popularity, added_at) is owned by
/// the catalog sync and is read-only to the vote ledger. `votes` always equals
/// the number of users holding an active vote on the track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    pub genre: String,
    /// Catalog popularity score, 0 to 100.
    pub popularity: i32,
    pub votes: i64,
    pub added_at: DateTime<Utc>,
}

/// A track summary as returned by the external catalog source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrackSummary {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    pub popularity: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}
