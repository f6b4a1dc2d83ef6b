//! # Track Votes API
//! HTTP surface of the track voting service: configuration, the identity and
//! catalog seams, and the axum server exposing the vote ledger and the
//! leaderboard.
pub mod catalog;
pub mod config;
pub mod error;
pub mod identity;
pub mod server;

pub use catalog::{CatalogError, HttpTrackCatalog, StaticTrackCatalog, TrackCatalog, UnconfiguredCatalog};
pub use config::{ApiConfig, ConfigError};
pub use error::ApiError;
pub use identity::{HeaderIdentityProvider, IdentityProvider};
pub use server::{AppState, create_app, run_server};
