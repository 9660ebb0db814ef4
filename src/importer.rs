// 🗄️ Run Driver - stream the catalog file through the import pipeline
//
//   line → parser → normalizer/resolver → colony → dedup guard → batch writer
//
// Strictly sequential: one line is fully processed before the next is read.
// Every row ends in exactly one RowOutcome; only I/O and storage problems
// abort the run.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::batch::{BatchWriter, ColonySink, DEFAULT_BATCH_SIZE};
use crate::config::{HeaderPolicy, ImportConfig, DEFAULT_PROGRESS_INTERVAL};
use crate::db::{CatalogStore, ImportRun};
use crate::dedup::{composite_key, DedupGuard};
use crate::entities::NewColony;
use crate::error::{ImportError, Result};
use crate::parser::{parse_line, ParseOutcome, SkipReason};
use crate::resolver::ReferenceIndex;
use crate::stats::{ImportStats, ImportSummary};

/// Markers of the copyright banner heading the official export
pub const BANNER_MARKERS: [&str; 2] = [
    "Catálogo Nacional de Códigos Postales",
    "Correos de México",
];

const READ_BUFFER_BYTES: usize = 64 * 1024;

// ============================================================================
// OPTIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportOptions {
    pub batch_size: usize,

    /// Stop after this many processed rows (0 = unlimited)
    pub limit: u64,

    pub verbose: bool,
    pub header_policy: HeaderPolicy,
    pub progress_interval: u64,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            batch_size: DEFAULT_BATCH_SIZE,
            limit: 0,
            verbose: false,
            header_policy: HeaderPolicy::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl From<&ImportConfig> for ImportOptions {
    fn from(config: &ImportConfig) -> Self {
        ImportOptions {
            batch_size: config.batch_size,
            limit: config.limit,
            verbose: config.verbose,
            header_policy: config.header_policy,
            progress_interval: config.progress_interval,
        }
    }
}

// ============================================================================
// PER-ROW PIPELINE
// ============================================================================

/// Terminal state of one catalog line
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// Resolved, unique, handed to the batch writer
    Accepted(NewColony),

    /// Rejected by the parser (malformed line or bad required field)
    Skipped(SkipReason),

    /// No tier matched the municipality name
    Unresolved {
        state_code: String,
        municipality_name: String,
    },

    /// Composite key already accepted in this run
    Duplicate,

    /// Resolved row that cannot be represented as a colony
    Failed(String),
}

/// Run one line through parse → resolve → build → dedup
///
/// The guard records the key only for rows that come back Accepted.
pub fn process_line(line: &str, index: &ReferenceIndex, guard: &mut DedupGuard) -> RowOutcome {
    let record = match parse_line(line) {
        ParseOutcome::Valid(record) => record,
        ParseOutcome::Skip(reason) => return RowOutcome::Skipped(reason),
    };

    let resolution = match index.resolve(&record.state_code, &record.municipality_name) {
        Some(resolution) => resolution,
        None => {
            return RowOutcome::Unresolved {
                state_code: record.state_code,
                municipality_name: record.municipality_name,
            }
        }
    };

    let colony = match NewColony::new(
        resolution.municipality_id,
        &record.colony_name,
        &record.postal_code,
    ) {
        Ok(colony) => colony,
        Err(e) => return RowOutcome::Failed(e.to_string()),
    };

    let key = composite_key(colony.municipality_id, &colony.postal_code, &colony.name);
    if !guard.accept(key) {
        return RowOutcome::Duplicate;
    }

    debug!(
        municipality_id = colony.municipality_id,
        tier = resolution.tier.as_str(),
        "Resolved {}",
        record.municipality_name
    );
    RowOutcome::Accepted(colony)
}

// ============================================================================
// LINE READER
// ============================================================================

/// Line-by-line reader tolerant of the export's Latin-1 encoding
pub struct CatalogLines<R: BufRead> {
    inner: R,
    buf: Vec<u8>,
    line_number: u64,
}

impl<R: BufRead> CatalogLines<R> {
    pub fn new(inner: R) -> Self {
        CatalogLines {
            inner,
            buf: Vec::with_capacity(256),
            line_number: 0,
        }
    }

    /// Next line without its terminator; None at end of file
    pub fn next_line(&mut self) -> Result<Option<String>> {
        self.buf.clear();
        if self.inner.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        while matches!(self.buf.last(), Some(b'\n') | Some(b'\r')) {
            self.buf.pop();
        }
        Ok(Some(decode_line(&self.buf)))
    }

    /// 1-based number of the last line returned
    pub fn line_number(&self) -> u64 {
        self.line_number
    }
}

/// UTF-8 when valid, otherwise ISO-8859-1 (every byte maps to one char)
pub fn decode_line(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

pub fn is_banner(line: &str) -> bool {
    BANNER_MARKERS.iter().any(|marker| line.contains(marker))
}

// ============================================================================
// DRIVER
// ============================================================================

/// Import every data line of `reader` into `sink`
pub fn run_import<R: BufRead, S: ColonySink>(
    reader: R,
    index: &ReferenceIndex,
    sink: &mut S,
    options: &ImportOptions,
) -> Result<ImportSummary> {
    let mut stats = ImportStats::new();
    let mut guard = DedupGuard::new();
    let mut writer = BatchWriter::new(sink, options.batch_size)?;
    let mut lines = CatalogLines::new(reader);

    // Banner + header detection on the first line
    let mut pending = match lines.next_line()? {
        None => None,
        Some(first) if is_banner(&first) => {
            let header = lines.next_line()?;
            debug!(?header, "Banner detected, header discarded");
            None
        }
        Some(first) => match options.header_policy {
            HeaderPolicy::AlwaysSkipFirst => {
                debug!(line = %first, "No banner, first line discarded as header");
                None
            }
            HeaderPolicy::SkipOnlyAfterBanner => Some(first),
        },
    };

    loop {
        if options.limit > 0 && stats.processed >= options.limit {
            info!(limit = options.limit, "Row limit reached");
            break;
        }

        let line = match pending.take() {
            Some(line) => line,
            None => match lines.next_line()? {
                Some(line) => line,
                None => break,
            },
        };
        if line.trim().is_empty() {
            continue;
        }

        stats.processed += 1;
        let line_number = lines.line_number();

        match process_line(&line, index, &mut guard) {
            RowOutcome::Accepted(colony) => writer.push(colony, &mut stats),
            RowOutcome::Skipped(reason) => {
                match &reason {
                    SkipReason::MissingField(field) => {
                        debug!(line_number, field = field.as_str(), "Row skipped: empty field")
                    }
                    _ => debug!(line_number, ?reason, "Row skipped"),
                }
                stats.record_skip(&reason);
            }
            RowOutcome::Unresolved {
                state_code,
                municipality_name,
            } => {
                if options.verbose {
                    warn!(
                        line_number,
                        state = %state_code,
                        "Unresolved municipality: {}",
                        municipality_name
                    );
                } else {
                    debug!(
                        line_number,
                        state = %state_code,
                        "Unresolved municipality: {}",
                        municipality_name
                    );
                }
                stats.record_unresolved();
            }
            RowOutcome::Duplicate => stats.record_duplicate(),
            RowOutcome::Failed(message) => {
                warn!(line_number, "Row failed: {}", message);
                stats.record_row_error();
            }
        }

        if options.progress_interval > 0 && stats.processed % options.progress_interval == 0 {
            info!(
                processed = stats.processed,
                imported = stats.imported,
                duplicates = stats.duplicates,
                skipped = stats.skipped(),
                "Import progress"
            );
        }
    }

    writer.finish(&mut stats);
    Ok(stats.finish())
}

/// Fail fast on a missing or empty source file
pub fn ensure_source(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(ImportError::SourceNotFound {
            path: path.to_path_buf(),
        });
    }
    if std::fs::metadata(path)?.len() == 0 {
        return Err(ImportError::EmptySource {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Import a catalog file from disk
pub fn import_file<S: ColonySink>(
    path: &Path,
    index: &ReferenceIndex,
    sink: &mut S,
    options: &ImportOptions,
) -> Result<ImportSummary> {
    ensure_source(path)?;
    let reader = BufReader::with_capacity(READ_BUFFER_BYTES, File::open(path)?);
    run_import(reader, index, sink, options)
}

/// SHA-256 of a file, hex encoded
pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut chunk = vec![0u8; READ_BUFFER_BYTES];

    loop {
        let n = file.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        hasher.update(&chunk[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// FULL RUN AGAINST THE CATALOG STORE
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run: ImportRun,
    pub summary: ImportSummary,

    /// Colonies removed by the truncate option (None when not requested)
    pub cleared: Option<usize>,

    /// Colony rows in the store after the run
    pub total_colonies: i64,
}

/// Full import: snapshot → index → (clear) → import → audit record
///
/// Foreign-key enforcement is suspended only for the clear + import step and
/// restored on every exit path.
pub fn run_catalog_import(
    store: &mut CatalogStore,
    source: &Path,
    options: &ImportOptions,
    truncate: bool,
) -> Result<RunReport> {
    ensure_source(source)?;

    let municipalities = store.load_municipalities()?;
    if municipalities.is_empty() {
        warn!("Municipality snapshot is empty, every row will be unresolved");
    }
    let index = ReferenceIndex::build(&municipalities);
    info!(
        municipalities = index.len(),
        states = index.state_count(),
        keys = index.key_count(),
        "Reference index built"
    );

    let started_at = Utc::now();
    let source_sha256 = file_sha256(source)?;

    let (summary, cleared) = store.with_foreign_keys_disabled(|store| {
        let cleared = if truncate {
            let removed = store.clear_colonies()?;
            info!(removed, "Colony table cleared");
            Some(removed)
        } else {
            None
        };

        let summary = import_file(source, &index, store, options)?;
        Ok((summary, cleared))
    })?;

    let run = ImportRun::new(source, &source_sha256, started_at, Utc::now(), &summary);
    store.record_run(&run)?;
    let total_colonies = store.count_colonies()?;

    info!(
        run_id = %run.run_id,
        imported = summary.imported,
        total_colonies,
        "Import finished"
    );

    Ok(RunReport {
        run,
        summary,
        cleared,
        total_colonies,
    })
}

// ============================================================================
// TESTS
// ============================================================================
