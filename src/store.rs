//! SQLite access to the test_runs table
//!
//! The store is the only I/O boundary of the crate: it reads run rows,
//! parses their timestamps once, and hands immutable [`RunRecord`]s to
//! the pure analytics. Rows with unparseable timestamps are skipped
//! with a warning rather than failing the whole query.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection};

use crate::record::{parse_timestamp, RunRecord, SUCCESS_STATUSES};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS test_runs (
    id            INTEGER PRIMARY KEY,
    name          TEXT NOT NULL,
    sequence_name TEXT NOT NULL,
    start_time    TEXT NOT NULL,
    duration      REAL,
    cycles        INTEGER,
    status        TEXT NOT NULL,
    log           TEXT
)";

/// Raw row shape before timestamp parsing.
struct RawRun {
    id: i64,
    name: String,
    sequence_name: String,
    start_time: String,
    duration: Option<f64>,
    cycles: Option<i64>,
    status: String,
    log: Option<String>,
}

/// Handle to the run database.
#[derive(Debug)]
pub struct RunStore {
    conn: Connection,
}

impl RunStore {
    /// Open (or create) the run database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("failed to open database {}", path.as_ref().display()))?;
        conn.execute(SCHEMA, [])
            .context("failed to create test_runs table")?;
        Ok(Self { conn })
    }

    /// In-memory store, mainly for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        conn.execute(SCHEMA, [])
            .context("failed to create test_runs table")?;
        Ok(Self { conn })
    }

    /// Insert one run row. The record's id becomes the row id.
    pub fn insert_run(&self, record: &RunRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO test_runs (id, name, sequence_name, start_time, duration, cycles, status, log)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.id,
                    record.name,
                    record.sequence_name,
                    record.start_time.to_rfc3339(),
                    record.duration_secs,
                    record.cycles.map(i64::from),
                    record.status,
                    record.log,
                ],
            )
            .with_context(|| format!("failed to insert run {}", record.id))?;
        Ok(())
    }

    /// All runs started at or after `cutoff`, oldest first.
    pub fn runs_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<RunRecord>> {
        self.query_runs(
            "SELECT id, name, sequence_name, start_time, duration, cycles, status, log
             FROM test_runs WHERE start_time >= ?1 ORDER BY start_time ASC",
            params![cutoff.to_rfc3339()],
        )
    }

    /// One sequence's runs, oldest first, optionally successful only.
    pub fn runs_for_sequence(&self, sequence: &str, successful_only: bool) -> Result<Vec<RunRecord>> {
        if successful_only {
            self.query_runs(
                &format!(
                    "SELECT id, name, sequence_name, start_time, duration, cycles, status, log
                     FROM test_runs WHERE sequence_name = ?1 AND status IN ({})
                     ORDER BY start_time ASC",
                    success_status_list()
                ),
                params![sequence],
            )
        } else {
            self.query_runs(
                "SELECT id, name, sequence_name, start_time, duration, cycles, status, log
                 FROM test_runs WHERE sequence_name = ?1 ORDER BY start_time ASC",
                params![sequence],
            )
        }
    }

    /// The newest `limit` outcome statuses for a sequence, newest first.
    pub fn recent_statuses(&self, sequence: &str, limit: usize) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT status FROM test_runs WHERE sequence_name = ?1
                 ORDER BY start_time DESC LIMIT ?2",
            )
            .context("failed to prepare status query")?;
        let statuses = stmt
            .query_map(params![sequence, limit as i64], |row| row.get::<_, String>(0))
            .context("failed to query statuses")?
            .collect::<rusqlite::Result<Vec<String>>>()
            .context("failed to read status rows")?;
        Ok(statuses)
    }

    /// Names of all sequences with at least one successful run.
    pub fn distinct_sequences(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT DISTINCT sequence_name FROM test_runs WHERE status IN ({})
                 ORDER BY sequence_name",
                success_status_list()
            ))
            .context("failed to prepare sequence query")?;
        let sequences = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .context("failed to query sequences")?
            .collect::<rusqlite::Result<Vec<String>>>()
            .context("failed to read sequence rows")?;
        Ok(sequences)
    }

    /// Runs by explicit ids, in id order.
    pub fn runs_by_ids(&self, ids: &[i64]) -> Result<Vec<RunRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(",");
        let sql = format!(
            "SELECT id, name, sequence_name, start_time, duration, cycles, status, log
             FROM test_runs WHERE id IN ({placeholders}) ORDER BY id ASC"
        );

        let mut stmt = self.conn.prepare(&sql).context("failed to prepare id query")?;
        let raw = stmt
            .query_map(params_from_iter(ids.iter()), read_raw_run)
            .context("failed to query runs by id")?
            .collect::<rusqlite::Result<Vec<RawRun>>>()
            .context("failed to read run rows")?;
        Ok(parse_rows(raw))
    }

    /// Every run, optionally restricted to one sequence, oldest first.
    pub fn all_runs(&self, sequence: Option<&str>) -> Result<Vec<RunRecord>> {
        match sequence {
            Some(sequence) => self.query_runs(
                "SELECT id, name, sequence_name, start_time, duration, cycles, status, log
                 FROM test_runs WHERE sequence_name = ?1 ORDER BY start_time ASC",
                params![sequence],
            ),
            None => self.query_runs(
                "SELECT id, name, sequence_name, start_time, duration, cycles, status, log
                 FROM test_runs ORDER BY start_time ASC",
                [],
            ),
        }
    }

    fn query_runs<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(sql).context("failed to prepare run query")?;
        let raw = stmt
            .query_map(params, read_raw_run)
            .context("failed to query runs")?
            .collect::<rusqlite::Result<Vec<RawRun>>>()
            .context("failed to read run rows")?;
        Ok(parse_rows(raw))
    }
}

fn read_raw_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRun> {
    Ok(RawRun {
        id: row.get(0)?,
        name: row.get(1)?,
        sequence_name: row.get(2)?,
        start_time: row.get(3)?,
        duration: row.get(4)?,
        cycles: row.get(5)?,
        status: row.get(6)?,
        log: row.get(7)?,
    })
}

/// Parse timestamps at the boundary; skip rows that fail.
fn parse_rows(raw: Vec<RawRun>) -> Vec<RunRecord> {
    raw.into_iter()
        .filter_map(|row| match parse_timestamp(&row.start_time) {
            Some(start_time) => Some(RunRecord {
                id: row.id,
                name: row.name,
                sequence_name: row.sequence_name,
                start_time,
                duration_secs: row.duration,
                cycles: row.cycles.map(|c| c as u32),
                status: row.status,
                log: row.log,
            }),
            None => {
                tracing::warn!(
                    "skipping run {}: unparseable start_time {:?}",
                    row.id,
                    row.start_time
                );
                None
            }
        })
        .collect()
}

fn success_status_list() -> String {
    SUCCESS_STATUSES
        .iter()
        .map(|s| format!("'{s}'"))
        .collect::<Vec<_>>()
        .join(",")
}
