//! Game records from the play server's public HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tesuji_routine::{GameLookup, GameMetadata, SiteConfig};

/// [`GameLookup`] backed by `GET {api}/games/{id}`.
#[derive(Debug, Clone)]
pub struct HttpGameLookup {
    client: reqwest::Client,
    sites: SiteConfig,
    timeout: Duration,
}

impl HttpGameLookup {
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new(sites: SiteConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            sites,
            timeout,
        })
    }

    async fn fetch_record(&self, url: &str) -> Result<Value, String> {
        let response = tokio::time::timeout(self.timeout, self.client.get(url).send())
            .await
            .map_err(|_| "timed out".to_string())?
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;
        tokio::time::timeout(self.timeout, response.json::<Value>())
            .await
            .map_err(|_| "timed out reading body".to_string())?
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl GameLookup for HttpGameLookup {
    async fn fetch(&self, game_id: &str) -> Option<GameMetadata> {
        let url = self.sites.game_record_url(game_id);
        log::debug!("fetching {url}");
        match self.fetch_record(&url).await {
            Ok(record) => {
                let metadata = GameMetadata::from_record(&record);
                if metadata.is_none() {
                    log::warn!("game {game_id}: record is not a JSON object");
                }
                metadata
            }
            Err(err) => {
                log::warn!("game {game_id}: lookup failed: {err}");
                None
            }
        }
    }
}
