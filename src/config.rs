use crate::constants;

/// Endpoint and destination table for one pipeline variant.
///
/// Passed into the orchestrator explicitly rather than read from globals
/// so tests can point a pipeline at a stub server and a scratch database.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub endpoint: String,
    pub table: String,
}

impl PipelineConfig {
    /// Production configuration for the case-count pipeline.
    pub fn cases() -> Self {
        Self {
            endpoint: constants::CASES_ENDPOINT.to_string(),
            table: constants::CASES_TABLE.to_string(),
        }
    }

    /// Production configuration for the vaccination pipeline.
    pub fn vaccinations() -> Self {
        Self {
            endpoint: constants::VACCINATIONS_ENDPOINT.to_string(),
            table: constants::VACCINATIONS_TABLE.to_string(),
        }
    }
}
