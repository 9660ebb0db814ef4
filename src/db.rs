// 🗄️ Catalog Store - SQLite home of the reference data and the colony table
//
// Plays both external roles of the importer:
//   - source of the read-only municipality snapshot
//   - ColonySink accepting batches of resolved colonies (one SQL transaction
//     per batch: all rows land or none do)
//
// Plus the import_runs audit trail (one row per completed run).

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::batch::ColonySink;
use crate::entities::{
    federal_entities, pad_state_code, Colony, FederalEntity, Municipality, MunicipalityRecord,
    NewColony,
};
use crate::error::Result;
use crate::stats::ImportSummary;

// ============================================================================
// IMPORT RUN (audit record)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRun {
    /// Stable identity of the run (UUID v4)
    pub run_id: String,
    pub source_file: String,

    /// Fingerprint of the imported file, to tell catalog editions apart
    pub source_sha256: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub summary: ImportSummary,
}

impl ImportRun {
    pub fn new(
        source: &Path,
        source_sha256: &str,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        summary: &ImportSummary,
    ) -> Self {
        ImportRun {
            run_id: uuid::Uuid::new_v4().to_string(),
            source_file: source.display().to_string(),
            source_sha256: source_sha256.to_string(),
            started_at,
            finished_at,
            summary: summary.clone(),
        }
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS federal_entities (
            code TEXT PRIMARY KEY,
            name TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS municipalities (
            id INTEGER PRIMARY KEY,
            state_code TEXT NOT NULL REFERENCES federal_entities(code),
            name TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS colonies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            municipality_id INTEGER NOT NULL REFERENCES municipalities(id),
            name TEXT NOT NULL,
            postal_code TEXT NOT NULL CHECK (length(postal_code) = 5),
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS import_runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT UNIQUE NOT NULL,
            source_file TEXT NOT NULL,
            source_sha256 TEXT NOT NULL,
            started_at TEXT NOT NULL,
            finished_at TEXT NOT NULL,
            summary TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_municipalities_state ON municipalities(state_code)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_colonies_postal_code ON colonies(postal_code)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_colonies_municipality ON colonies(municipality_id)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// CATALOG STORE
// ============================================================================

pub struct CatalogStore {
    conn: Connection,
}

impl CatalogStore {
    /// Open (or create) a file-backed store in WAL mode
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // A run that died while checks were suspended leaves nothing behind:
        // every fresh connection starts with enforcement on.
        conn.pragma_update(None, "foreign_keys", true)?;
        setup_database(&conn)?;
        Ok(CatalogStore { conn })
    }

    // ------------------------------------------------------------------------
    // Foreign-key suspension
    // ------------------------------------------------------------------------

    pub fn foreign_keys_enabled(&self) -> Result<bool> {
        let enabled = self
            .conn
            .pragma_query_value(None, "foreign_keys", |row| row.get::<_, bool>(0))?;
        Ok(enabled)
    }

    fn set_foreign_keys(&self, enabled: bool) -> Result<()> {
        self.conn.pragma_update(None, "foreign_keys", enabled)?;
        Ok(())
    }

    /// Run `f` with foreign-key enforcement off, restoring it afterwards
    ///
    /// Enforcement is switched back on whether `f` succeeds or fails.
    pub fn with_foreign_keys_disabled<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.set_foreign_keys(false)?;
        debug!("Foreign-key enforcement suspended");

        let result = f(self);

        let restored = self.set_foreign_keys(true);
        match &restored {
            Ok(()) => debug!("Foreign-key enforcement restored"),
            Err(e) => error!(error = %e, "Failed to restore foreign-key enforcement"),
        }

        let value = result?;
        restored?;
        Ok(value)
    }

    // ------------------------------------------------------------------------
    // Reference data
    // ------------------------------------------------------------------------

    /// Insert the 32 federal entities (existing codes are left alone)
    pub fn seed_federal_entities(&mut self) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt =
                tx.prepare("INSERT OR IGNORE INTO federal_entities (code, name) VALUES (?1, ?2)")?;
            for entity in federal_entities() {
                inserted += stmt.execute(params![entity.code, entity.name])?;
            }
        }
        tx.commit()?;

        info!(inserted, "Federal entities seeded");
        Ok(inserted)
    }

    pub fn load_federal_entities(&self) -> Result<Vec<FederalEntity>> {
        let mut stmt = self
            .conn
            .prepare("SELECT code, name FROM federal_entities ORDER BY code")?;

        let entities = stmt
            .query_map([], |row| {
                Ok(FederalEntity {
                    code: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entities)
    }

    /// Insert one municipality; returns its id (assigned when `id` is None)
    pub fn insert_municipality(
        &self,
        id: Option<i64>,
        state_code: &str,
        name: &str,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO municipalities (id, state_code, name) VALUES (?1, ?2, ?3)",
            params![id, pad_state_code(state_code), name.trim()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Load a municipality snapshot from a CSV file (`id,state_code,name`)
    ///
    /// All rows land in one transaction; any bad row aborts the whole load.
    pub fn seed_municipalities_from_csv(&mut self, csv_path: &Path) -> Result<usize> {
        let mut rdr = csv::Reader::from_path(csv_path)?;
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO municipalities (id, state_code, name) VALUES (?1, ?2, ?3)",
            )?;
            for result in rdr.deserialize() {
                let record: MunicipalityRecord = result?;
                inserted += stmt.execute(params![
                    record.id,
                    pad_state_code(&record.state_code),
                    record.name.trim(),
                ])?;
            }
        }
        tx.commit()?;

        info!(inserted, source = %csv_path.display(), "Municipalities seeded");
        Ok(inserted)
    }

    /// The read-only snapshot handed to the resolver, ascending by id
    pub fn load_municipalities(&self) -> Result<Vec<Municipality>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, state_code, name FROM municipalities ORDER BY id")?;

        let municipalities = stmt
            .query_map([], |row| {
                Ok(Municipality {
                    id: row.get(0)?,
                    state_code: row.get(1)?,
                    name: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(municipalities)
    }

    // ------------------------------------------------------------------------
    // Colonies
    // ------------------------------------------------------------------------

    /// Remove every colony and reset id assignment; returns rows removed
    pub fn clear_colonies(&mut self) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute("DELETE FROM colonies", [])?;
        tx.execute("DELETE FROM sqlite_sequence WHERE name = 'colonies'", [])?;
        tx.commit()?;
        Ok(removed)
    }

    pub fn count_colonies(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM colonies", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn colonies_by_postal_code(&self, postal_code: &str) -> Result<Vec<Colony>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, municipality_id, name, postal_code
             FROM colonies
             WHERE postal_code = ?1
             ORDER BY id",
        )?;

        let colonies = stmt
            .query_map([postal_code], |row| {
                Ok(Colony {
                    id: row.get(0)?,
                    municipality_id: row.get(1)?,
                    name: row.get(2)?,
                    postal_code: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(colonies)
    }

    // ------------------------------------------------------------------------
    // Import runs
    // ------------------------------------------------------------------------

    pub fn record_run(&self, run: &ImportRun) -> Result<()> {
        let summary_json = serde_json::to_string(&run.summary)?;

        self.conn.execute(
            "INSERT INTO import_runs (
                run_id, source_file, source_sha256, started_at, finished_at, summary
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                run.run_id,
                run.source_file,
                run.source_sha256,
                run.started_at.to_rfc3339(),
                run.finished_at.to_rfc3339(),
                summary_json,
            ],
        )?;

        Ok(())
    }

    /// Most recent runs first
    pub fn recent_runs(&self, limit: usize) -> Result<Vec<ImportRun>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, source_file, source_sha256, started_at, finished_at, summary
             FROM import_runs
             ORDER BY id DESC
             LIMIT ?1",
        )?;

        let stored = stmt
            .query_map([limit as i64], StoredRun::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        stored.into_iter().map(StoredRun::into_run).collect()
    }

    pub fn find_run(&self, run_id: &str) -> Result<Option<ImportRun>> {
        let stored = self
            .conn
            .query_row(
                "SELECT run_id, source_file, source_sha256, started_at, finished_at, summary
                 FROM import_runs
                 WHERE run_id = ?1",
                [run_id],
                StoredRun::from_row,
            )
            .optional()?;

        stored.map(StoredRun::into_run).transpose()
    }
}

/// An import_runs row before its JSON summary is decoded
struct StoredRun {
    run_id: String,
    source_file: String,
    source_sha256: String,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    summary_json: String,
}

impl StoredRun {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        let started_at: String = row.get(3)?;
        let finished_at: String = row.get(4)?;

        Ok(StoredRun {
            run_id: row.get(0)?,
            source_file: row.get(1)?,
            source_sha256: row.get(2)?,
            started_at: parse_timestamp(3, &started_at)?,
            finished_at: parse_timestamp(4, &finished_at)?,
            summary_json: row.get(5)?,
        })
    }

    fn into_run(self) -> Result<ImportRun> {
        Ok(ImportRun {
            run_id: self.run_id,
            source_file: self.source_file,
            source_sha256: self.source_sha256,
            started_at: self.started_at,
            finished_at: self.finished_at,
            summary: serde_json::from_str(&self.summary_json)?,
        })
    }
}

fn parse_timestamp(column: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

// ============================================================================
// SINK
// ============================================================================

impl ColonySink for CatalogStore {
    fn write_batch(&mut self, rows: &[NewColony]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO colonies (municipality_id, name, postal_code) VALUES (?1, ?2, ?3)",
            )?;
            for row in rows {
                stmt.execute(params![row.municipality_id, row.name, row.postal_code])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
