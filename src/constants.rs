/// Fixed endpoints and store identifiers for the production pipelines.
/// Components take these as explicit configuration so tests can inject fakes.

// CDC Socrata endpoints
pub const CASES_ENDPOINT: &str = "https://data.cdc.gov/resource/9mfq-cb36.json";
pub const VACCINATIONS_ENDPOINT: &str = "https://data.cdc.gov/resource/8xkx-amqh.json";

// SQLite database file and table names
pub const DEFAULT_DB_PATH: &str = "healthcare_data.db";
pub const CASES_TABLE: &str = "covid_cases";
pub const VACCINATIONS_TABLE: &str = "vaccinations";

/// Number of states reported by the top-states query.
pub const TOP_STATES_LIMIT: u32 = 5;

/// Request timeout applied to the HTTP client.
pub const HTTP_TIMEOUT_SECS: u64 = 30;
