use crate::config::PipelineConfig;
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::storage::Storage;
use crate::transform::{transform_cases, transform_vaccinations, CASE_MAPPING, VACCINATION_MAPPING};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// Counts reported after a successful pipeline run.
#[derive(Debug, Serialize)]
pub struct PipelineRunSummary {
    pub table: String,
    pub fetched: usize,
    pub loaded: usize,
}

/// Run the case-count pipeline: fetch, transform, load, strictly in
/// order. Any step failure aborts the run and propagates unmodified;
/// a fetch or transform failure leaves the store untouched.
#[instrument(skip(fetcher, storage, config), fields(table = %config.table))]
pub async fn run_cases(
    fetcher: &Fetcher,
    storage: &Arc<dyn Storage>,
    config: &PipelineConfig,
) -> Result<PipelineRunSummary> {
    let raw = fetcher.fetch(&config.endpoint).await?;
    info!(records = raw.len(), "fetch complete");

    let clean = transform_cases(&raw, &CASE_MAPPING)?;
    info!(records = clean.len(), "transform complete");

    storage.replace_cases(&config.table, &clean).await?;
    info!("load complete");

    Ok(PipelineRunSummary {
        table: config.table.clone(),
        fetched: raw.len(),
        loaded: clean.len(),
    })
}

/// Run the vaccination pipeline. Same sequencing and failure policy as
/// the case pipeline; rows without a county are dropped in transform.
#[instrument(skip(fetcher, storage, config), fields(table = %config.table))]
pub async fn run_vaccinations(
    fetcher: &Fetcher,
    storage: &Arc<dyn Storage>,
    config: &PipelineConfig,
) -> Result<PipelineRunSummary> {
    let raw = fetcher.fetch(&config.endpoint).await?;
    info!(records = raw.len(), "fetch complete");

    let clean = transform_vaccinations(&raw, &VACCINATION_MAPPING)?;
    info!(records = clean.len(), "transform complete");

    storage.replace_vaccinations(&config.table, &clean).await?;
    info!("load complete");

    Ok(PipelineRunSummary {
        table: config.table.clone(),
        fetched: raw.len(),
        loaded: clean.len(),
    })
}
