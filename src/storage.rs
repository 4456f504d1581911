use crate::error::{EtlError, Result};
use crate::types::{CaseRecord, StateTotal, VaccinationRecord};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Storage trait for persisting cleaned datasets.
///
/// Every write is replace-on-write: the named table is dropped and
/// recreated, so after a successful call it holds exactly the rows
/// handed in. `top_states_by_cases` is the one documented read contract
/// the loaded case table must satisfy.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn replace_cases(&self, table: &str, rows: &[CaseRecord]) -> Result<()>;
    async fn replace_vaccinations(&self, table: &str, rows: &[VaccinationRecord]) -> Result<()>;
    async fn top_states_by_cases(&self, table: &str, limit: u32) -> Result<Vec<StateTotal>>;
}

/// SQLite-backed storage. A connection is opened per call and closed on
/// every exit path; it is never held across pipeline steps.
pub struct SqliteStorage {
    db_path: PathBuf,
}

impl SqliteStorage {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.db_path).map_err(EtlError::from)
    }
}

// Table names cannot be bound as SQL parameters, so they are validated
// before being interpolated into statements.
fn check_table_name(table: &str) -> Result<()> {
    let ok = !table.is_empty()
        && !table.starts_with(|c: char| c.is_ascii_digit())
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(EtlError::Load {
            message: format!("invalid table name '{}'", table),
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn replace_cases(&self, table: &str, rows: &[CaseRecord]) -> Result<()> {
        check_table_name(table)?;
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table};
             CREATE TABLE {table} (
                 date      TEXT NOT NULL,
                 state     TEXT NOT NULL,
                 new_case  REAL NOT NULL,
                 new_death REAL NOT NULL
             );"
        ))?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {table} (date, state, new_case, new_death) VALUES (?1, ?2, ?3, ?4)"
            ))?;
            for row in rows {
                stmt.execute(params![
                    row.date.to_string(),
                    row.state,
                    row.new_case,
                    row.new_death
                ])?;
            }
        }
        tx.commit()?;
        debug!(table, rows = rows.len(), "replaced case table");
        Ok(())
    }

    async fn replace_vaccinations(&self, table: &str, rows: &[VaccinationRecord]) -> Result<()> {
        check_table_name(table)?;
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table};
             CREATE TABLE {table} (
                 date                 TEXT,
                 county               TEXT NOT NULL,
                 state                TEXT NOT NULL,
                 fully_vaccinated_pct REAL NOT NULL,
                 at_least_one_dose    REAL NOT NULL,
                 one_dose_pct         REAL NOT NULL
             );"
        ))?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {table} (date, county, state, fully_vaccinated_pct, at_least_one_dose, one_dose_pct)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
            ))?;
            for row in rows {
                stmt.execute(params![
                    row.date.map(|d| d.to_string()),
                    row.county,
                    row.state,
                    row.fully_vaccinated_pct,
                    row.at_least_one_dose,
                    row.one_dose_pct
                ])?;
            }
        }
        tx.commit()?;
        debug!(table, rows = rows.len(), "replaced vaccination table");
        Ok(())
    }

    async fn top_states_by_cases(&self, table: &str, limit: u32) -> Result<Vec<StateTotal>> {
        check_table_name(table)?;
        let conn = self.connect()?;
        // Secondary sort on state makes the top-N cut deterministic when
        // totals tie.
        let mut stmt = conn.prepare(&format!(
            "SELECT state, SUM(new_case) AS total_cases
             FROM {table}
             GROUP BY state
             ORDER BY total_cases DESC, state ASC
             LIMIT ?1"
        ))?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(StateTotal {
                state: row.get(0)?,
                total_cases: row.get(1)?,
            })
        })?;
        let mut totals = Vec::new();
        for row in rows {
            totals.push(row?);
        }
        Ok(totals)
    }
}
