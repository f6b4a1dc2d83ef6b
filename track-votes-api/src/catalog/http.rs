use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use track_votes_shared::types::TrackSummary;

use super::{CatalogError, TrackCatalog};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches popular tracks from the catalog's HTTP endpoint.
///
/// The endpoint must answer `GET` with a JSON array of track summaries.
#[derive(Debug, Clone)]
pub struct HttpTrackCatalog {
    client: reqwest::Client,
    url: String,
}

impl HttpTrackCatalog {
    pub fn new(url: impl Into<String>) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl TrackCatalog for HttpTrackCatalog {
    async fn popular_tracks(&self) -> Result<Vec<TrackSummary>, CatalogError> {
        let tracks: Vec<TrackSummary> = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(url = %self.url, count = tracks.len(), "Fetched popular tracks");
        Ok(tracks)
    }
}
