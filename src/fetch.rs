use crate::constants;
use crate::error::{EtlError, Result};
use crate::types::RawRecord;
use std::time::Duration;
use tracing::{debug, info};

/// Thin wrapper over `reqwest::Client` that pulls one JSON array of flat
/// objects from a fixed endpoint. No retries, no pagination, no auth.
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    /// Build a fetcher with the default client and request timeout.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(constants::HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }

    /// Build a fetcher around an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Issue a single GET against `endpoint` and decode the body as an
    /// array of raw records, preserving field names and row order as
    /// received. Any non-success status fails the run.
    pub async fn fetch(&self, endpoint: &str) -> Result<Vec<RawRecord>> {
        debug!("fetching {}", endpoint);
        let response = self.client.get(endpoint).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EtlError::Fetch {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let records: Vec<RawRecord> = serde_json::from_str(&body)?;
        info!(records = records.len(), "fetched {}", endpoint);
        Ok(records)
    }
}
