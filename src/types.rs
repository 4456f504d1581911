use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Raw row as returned from the remote API: a flat JSON object whose
/// fields are source-controlled and not validated beyond what the
/// transformer reads.
pub type RawRecord = serde_json::Value;

/// How the transformer treats a source date that fails to parse.
///
/// The two pipelines intentionally differ: the case pipeline fails the
/// run on a bad date, while the vaccination pipeline keeps the row with
/// a null date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateParsePolicy {
    /// A malformed or missing date aborts the transform.
    Strict,
    /// A malformed or missing date becomes `None`.
    CoerceNull,
}

/// Cleaned daily case counts for one state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub date: NaiveDate,
    /// Two-letter state code, always uppercase.
    pub state: String,
    pub new_case: f64,
    pub new_death: f64,
}

/// Cleaned county-level vaccination coverage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaccinationRecord {
    /// `None` when the source date was unparseable.
    pub date: Option<NaiveDate>,
    /// Never empty; rows without a county are dropped.
    pub county: String,
    pub state: String,
    pub fully_vaccinated_pct: f64,
    pub at_least_one_dose: f64,
    pub one_dose_pct: f64,
}

/// One row of the top-states aggregation over the case table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateTotal {
    pub state: String,
    pub total_cases: f64,
}
