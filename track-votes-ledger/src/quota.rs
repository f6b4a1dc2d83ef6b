//! Quota policy.
//!
//! Decides whether a user may cast another vote and replenishes quotas on a
//! fixed period. `refresh` is a pure function of the clock and the stored
//! quota fields; the ledger invokes it before every eligibility check.

use chrono::{DateTime, Duration, Utc};
use track_votes_shared::types::{QuotaState, User};

/// Default number of votes granted per refresh period.
pub const DEFAULT_VOTES_PER_PERIOD: i32 = 10;

/// Default length of a refresh period, in days.
pub const DEFAULT_REFRESH_DAYS: i64 = 30;

/// Vote quota rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    /// Quota a user is reset to when a period elapses.
    pub votes_per_period: i32,
    pub refresh_period: Duration,
}

/// Result of applying the refresh rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaRefresh {
    pub quota: QuotaState,
    /// True if a period elapsed and `quota` differs from the stored value.
    pub refreshed: bool,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            votes_per_period: DEFAULT_VOTES_PER_PERIOD,
            refresh_period: Duration::days(DEFAULT_REFRESH_DAYS),
        }
    }
}

impl QuotaPolicy {
    pub fn new(votes_per_period: i32, refresh_period: Duration) -> Self {
        Self {
            votes_per_period,
            refresh_period,
        }
    }

    /// Admins are always eligible; everyone else needs a remaining vote.
    pub fn is_eligible(&self, user: &User) -> bool {
        user.is_admin || user.remaining_votes > 0
    }

    /// Whether a cast by `user` consumes a vote from their quota.
    pub fn consumes_quota(&self, user: &User) -> bool {
        !user.is_admin
    }

    /// Applies the periodic refresh rule.
    ///
    /// Once `refresh_period` has elapsed since `last_refresh`, the quota is
    /// reset to `votes_per_period` and the refresh time moves to `now`.
    /// A `last_refresh` in the future counts as not elapsed.
    pub fn refresh(&self, now: DateTime<Utc>, last_refresh: DateTime<Utc>, current_quota: i32) -> QuotaRefresh {
        let elapsed = now.signed_duration_since(last_refresh);

        if elapsed >= self.refresh_period {
            QuotaRefresh {
                quota: QuotaState {
                    remaining_votes: self.votes_per_period,
                    last_vote_refresh: now,
                },
                refreshed: true,
            }
        } else {
            QuotaRefresh {
                quota: QuotaState {
                    remaining_votes: current_quota,
                    last_vote_refresh: last_refresh,
                },
                refreshed: false,
            }
        }
    }
}
