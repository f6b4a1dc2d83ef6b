//! Error types for the track votes repository.
mod votes;

pub use votes::VotesRepositoryError;
