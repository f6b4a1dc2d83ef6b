//! # Track Votes Repository
//! This crate provides the storage interfaces of the vote ledger and their
//! implementations. It includes the error type, the `VotesRepository` and
//! `TracksRepository` traits, a PostgreSQL backend that applies every paired
//! vote update in one transaction, and an in-memory backend with the same
//! all-or-nothing semantics.
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod postgres;

pub use errors::VotesRepositoryError;
pub use interfaces::{TracksRepository, VotesRepository};
pub use memory::InMemoryStore;
pub use postgres::{PostgresTracksRepository, PostgresVotesRepository};
