//! Leaderboard query types.
//!
//! This module defines the parameters of a leaderboard request and the
//! ordering rules every store must honour when answering one.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Track;

/// Maximum number of tracks a single leaderboard request may return.
pub const MAX_LEADERBOARD_LIMIT: usize = 100;

/// Ranking criterion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Rank by the catalog popularity score (streams).
    #[default]
    Popularity,
    /// Rank by the number of active votes.
    Votes,
}

/// Time window over which tracks are ranked, ending now.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TimeWindow {
    #[default]
    #[serde(rename = "30-last-days")]
    Last30Days,
    #[serde(rename = "3-last-months")]
    Last3Months,
    #[serde(rename = "6-last-months")]
    Last6Months,
    #[serde(rename = "12-last-months")]
    Last12Months,
}

impl TimeWindow {
    pub fn duration(&self) -> Duration {
        match self {
            TimeWindow::Last30Days => Duration::days(30),
            TimeWindow::Last3Months => Duration::days(90),
            TimeWindow::Last6Months => Duration::days(180),
            TimeWindow::Last12Months => Duration::days(365),
        }
    }

    /// Start of the window ending at `now`.
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.duration()
    }
}

/// Ranking direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Increasing,
    #[default]
    Decreasing,
}

/// Leaderboard request parameters.
///
/// Deserializes from the query string of `GET /tracks/leaderboard`, e.g.
/// `?genre=r%26b&sortBy=votes&period=3-last-months&order=increasing`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardQuery {
    pub genre: String,
    #[serde(default)]
    pub sort_by: SortKey,
    #[serde(default)]
    pub period: TimeWindow,
    #[serde(default)]
    pub order: SortDirection,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

impl LeaderboardQuery {
    /// Create a query with the default ranking: most popular of the last 30 days.
    pub fn for_genre(genre: impl Into<String>) -> Self {
        Self {
            genre: genre.into(),
            sort_by: SortKey::default(),
            period: TimeWindow::default(),
            order: SortDirection::default(),
            limit: default_limit(),
        }
    }

    pub fn sorted_by(mut self, sort_by: SortKey, order: SortDirection) -> Self {
        self.sort_by = sort_by;
        self.order = order;
        self
    }

    pub fn within(mut self, period: TimeWindow) -> Self {
        self.period = period;
        self
    }

    /// The requested limit, clamped to `1..=MAX_LEADERBOARD_LIMIT`.
    pub fn effective_limit(&self) -> usize {
        self.limit.clamp(1, MAX_LEADERBOARD_LIMIT)
    }

    /// Returns true if `track` belongs in this leaderboard at `now`.
    ///
    /// Genres compare after Unicode lowercasing, the same folding the
    /// Postgres query applies with `lower()`.
    pub fn matches(&self, track: &Track, now: DateTime<Utc>) -> bool {
        track.genre.to_lowercase() == self.genre.to_lowercase()
            && track.added_at >= self.period.since(now)
            && track.added_at <= now
    }

    /// Compares two tracks by the requested key and direction.
    ///
    /// Ties are broken by track id ascending regardless of direction, so every
    /// store yields the same order for the same data.
    pub fn compare(&self, a: &Track, b: &Track) -> Ordering {
        let primary = match self.sort_by {
            SortKey::Popularity => a.popularity.cmp(&b.popularity),
            SortKey::Votes => a.votes.cmp(&b.votes),
        };
        let primary = match self.order {
            SortDirection::Increasing => primary,
            SortDirection::Decreasing => primary.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }

    /// Filters, orders and truncates `tracks` according to this query.
    pub fn rank<'a>(&self, tracks: impl IntoIterator<Item = &'a Track>, now: DateTime<Utc>) -> Vec<Track> {
        let mut ranked: Vec<Track> = tracks
            .into_iter()
            .filter(|track| self.matches(track, now))
            .cloned()
            .collect();
        ranked.sort_by(|a, b| self.compare(a, b));
        ranked.truncate(self.effective_limit());
        ranked
    }
}
