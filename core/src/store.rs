//! SQLite journal.
//!
//! RULE: Only store.rs talks to the database.
//! The journal is append-only. Nothing reads it back to rebuild the
//! registry; it exists for replay and diagnostics.

use rusqlite::{params, Connection};
use crate::{
    error::ChoreoResult,
    event::EventLogEntry,
};

pub struct ChoreoStore {
    conn: Connection,
}

impl ChoreoStore {
    /// Open (or create) the journal database at `path`.
    pub fn open(path: &str) -> ChoreoResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> ChoreoResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    pub fn migrate(&self) -> ChoreoResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_journal.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(&self, run_id: &str, seed: u64, version: &str) -> ChoreoResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, seed, version, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, seed as i64, version, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> ChoreoResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (run_id, at_ms, event_type, payload, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.run_id,
                entry.at,
                entry.event_type,
                entry.payload,
                entry.recorded_at,
            ],
        )?;
        Ok(())
    }

    /// Every journal entry of a run, in append order.
    pub fn events_for_run(&self, run_id: &str) -> ChoreoResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, at_ms, event_type, payload, recorded_at
             FROM event_log WHERE run_id = ?1
             ORDER BY id ASC"
        )?;
        let entries = stmt.query_map(params![run_id], |row| {
            Ok(EventLogEntry {
                id:          Some(row.get(0)?),
                run_id:      row.get(1)?,
                at:          row.get(2)?,
                event_type:  row.get(3)?,
                payload:     row.get(4)?,
                recorded_at: row.get(5)?,
            })
        })?.collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn event_count(&self, run_id: &str, event_type: &str) -> ChoreoResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE run_id = ?1 AND event_type = ?2",
            params![run_id, event_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
