mod identity;
mod leaderboard;
mod track;
mod user;
mod vote;

pub use identity::UserIdentity;
pub use leaderboard::{LeaderboardQuery, MAX_LEADERBOARD_LIMIT, SortDirection, SortKey, TimeWindow};
pub use track::{Track, TrackId, TrackSummary};
pub use user::{User, VoterStatus};
pub use vote::{CastReceipt, CastVote, QuotaState, RetractReceipt, RetractVote};
