use std::sync::Arc;

use track_votes_ledger::{Clock, VoteLedger};
use track_votes_repository::TracksRepository;

use crate::catalog::TrackCatalog;
use crate::identity::IdentityProvider;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<VoteLedger>,
    pub tracks: Arc<dyn TracksRepository>,
    pub catalog: Arc<dyn TrackCatalog>,
    pub identity: Arc<dyn IdentityProvider>,
    /// Time source for leaderboard windows.
    pub clock: Arc<dyn Clock>,
}
