use crate::error::{EtlError, Result};
use crate::types::{CaseRecord, DateParsePolicy, RawRecord, VaccinationRecord};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::debug;

/// Field mapping for the case-count pipeline: the source field feeding
/// each destination column, plus the date-parse policy. The production
/// mapping is [`CASE_MAPPING`]; tests construct their own.
#[derive(Debug, Clone)]
pub struct CaseMapping {
    pub date: &'static str,
    pub state: &'static str,
    pub new_case: &'static str,
    pub new_death: &'static str,
    pub date_policy: DateParsePolicy,
}

/// Field mapping for the vaccination pipeline. Rows whose `county`
/// source value is missing, null, or empty are dropped.
#[derive(Debug, Clone)]
pub struct VaccinationMapping {
    pub date: &'static str,
    pub county: &'static str,
    pub state: &'static str,
    pub fully_vaccinated_pct: &'static str,
    pub at_least_one_dose: &'static str,
    pub one_dose_pct: &'static str,
    pub date_policy: DateParsePolicy,
}

pub const CASE_MAPPING: CaseMapping = CaseMapping {
    date: "submission_date",
    state: "state",
    new_case: "new_case",
    new_death: "new_death",
    date_policy: DateParsePolicy::Strict,
};

pub const VACCINATION_MAPPING: VaccinationMapping = VaccinationMapping {
    date: "date",
    county: "recip_county",
    state: "recip_state",
    fully_vaccinated_pct: "series_complete_pop_pct",
    at_least_one_dose: "administered_dose1_recip",
    one_dose_pct: "administered_dose1_pop_pct",
    date_policy: DateParsePolicy::CoerceNull,
};

/// Clean raw case rows into [`CaseRecord`]s. Never adds rows; with no
/// filter step the output count always equals the input count.
pub fn transform_cases(raw: &[RawRecord], mapping: &CaseMapping) -> Result<Vec<CaseRecord>> {
    let mut clean = Vec::with_capacity(raw.len());
    for row in raw {
        let date = match parse_date(row, mapping.date, mapping.date_policy)? {
            Some(d) => d,
            None => {
                return Err(EtlError::Parse(format!(
                    "date field '{}' missing from case record",
                    mapping.date
                )))
            }
        };
        clean.push(CaseRecord {
            date,
            state: text_or_empty(row, mapping.state).to_uppercase(),
            new_case: number_or_zero(row, mapping.new_case)?,
            new_death: number_or_zero(row, mapping.new_death)?,
        });
    }
    Ok(clean)
}

/// Clean raw vaccination rows into [`VaccinationRecord`]s. The county
/// filter runs on the raw source value, before fill, so null and
/// empty-string counties are both dropped.
pub fn transform_vaccinations(
    raw: &[RawRecord],
    mapping: &VaccinationMapping,
) -> Result<Vec<VaccinationRecord>> {
    let mut clean = Vec::with_capacity(raw.len());
    let mut dropped = 0usize;
    for row in raw {
        let county = match row.get(mapping.county).and_then(Value::as_str) {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => {
                dropped += 1;
                continue;
            }
        };
        clean.push(VaccinationRecord {
            date: parse_date(row, mapping.date, mapping.date_policy)?,
            county,
            state: text_or_empty(row, mapping.state),
            fully_vaccinated_pct: number_or_zero(row, mapping.fully_vaccinated_pct)?,
            at_least_one_dose: number_or_zero(row, mapping.at_least_one_dose)?,
            one_dose_pct: number_or_zero(row, mapping.one_dose_pct)?,
        });
    }
    if dropped > 0 {
        debug!(dropped, "dropped vaccination rows without a county");
    }
    Ok(clean)
}

/// Parse the designated source date field. Accepts plain `YYYY-MM-DD`
/// and the Socrata floating-timestamp form `YYYY-MM-DDTHH:MM:SS(.fff)`.
fn parse_date(row: &RawRecord, field: &str, policy: DateParsePolicy) -> Result<Option<NaiveDate>> {
    let raw = row.get(field).and_then(Value::as_str);
    match raw.and_then(try_parse_date) {
        Some(date) => Ok(Some(date)),
        None => match policy {
            DateParsePolicy::Strict => Err(EtlError::Parse(format!(
                "unparseable date {:?} in field '{}'",
                raw.unwrap_or(""),
                field
            ))),
            DateParsePolicy::CoerceNull => Ok(None),
        },
    }
}

fn try_parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|dt| dt.date())
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .ok()
}

/// Numeric fill policy: null or absent becomes 0.0. The source encodes
/// numbers both as JSON numbers and as numeric strings; anything else
/// is a parse error rather than a silent zero.
fn number_or_zero(row: &RawRecord, field: &str) -> Result<f64> {
    match row.get(field) {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(n)) => Ok(n.as_f64().unwrap_or(0.0)),
        Some(Value::String(s)) => s.parse::<f64>().map_err(|_| {
            EtlError::Parse(format!("non-numeric value '{}' in field '{}'", s, field))
        }),
        Some(other) => Err(EtlError::Parse(format!(
            "unexpected value {} in numeric field '{}'",
            other, field
        ))),
    }
}

fn text_or_empty(row: &RawRecord, field: &str) -> String {
    row.get(field)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}
