//! This module defines and re-exports the interfaces of the track votes repository.
mod tracks;
mod votes;

pub use tracks::TracksRepository;
pub use votes::VotesRepository;
