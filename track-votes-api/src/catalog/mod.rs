//! Catalog source seam.
//!
//! The catalog is an external, read-only service supplying track metadata.
//! This service only relays its list of popular tracks.
mod http;

use async_trait::async_trait;
use thiserror::Error;
use track_votes_shared::types::TrackSummary;

pub use http::HttpTrackCatalog;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Catalog source is not configured")]
    NotConfigured,
}

#[async_trait]
pub trait TrackCatalog: Send + Sync {
    async fn popular_tracks(&self) -> Result<Vec<TrackSummary>, CatalogError>;
}

/// Catalog serving a fixed list, for local development and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticTrackCatalog {
    tracks: Vec<TrackSummary>,
}

impl StaticTrackCatalog {
    pub fn new(tracks: Vec<TrackSummary>) -> Self {
        Self { tracks }
    }
}

#[async_trait]
impl TrackCatalog for StaticTrackCatalog {
    async fn popular_tracks(&self) -> Result<Vec<TrackSummary>, CatalogError> {
        Ok(self.tracks.clone())
    }
}

/// Stands in when no `CATALOG_URL` is configured; every lookup fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredCatalog;

#[async_trait]
impl TrackCatalog for UnconfiguredCatalog {
    async fn popular_tracks(&self) -> Result<Vec<TrackSummary>, CatalogError> {
        Err(CatalogError::NotConfigured)
    }
}
