// ⚠️ Error taxonomy for the catalog importer
//
// Only structural problems (missing/empty source, I/O, storage) surface as
// errors. Row-level outcomes (malformed, unresolved, duplicate) are values,
// see importer::RowOutcome.

use std::path::PathBuf;
use thiserror::Error;

/// Public download page of the national postal-code catalog
pub const CATALOG_SOURCE_URL: &str =
    "https://www.correosdemexico.gob.mx/SSLServicios/ConsultaCP/CodigoPostal_Exportar.aspx";

#[derive(Error, Debug)]
pub enum ImportError {
    /// Source file is absent - aborts before any row is read
    #[error(
        "Catalog file not found: {}\n   Download the pipe-delimited TXT export from {}\n   and place it at that path (or pass a path explicitly).",
        path.display(),
        CATALOG_SOURCE_URL
    )]
    SourceNotFound { path: PathBuf },

    /// Source file has no lines at all
    #[error("Catalog file is empty: {}", path.display())]
    EmptySource { path: PathBuf },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// A resolved row that cannot be stored as a colony
    #[error("Invalid colony: {0}")]
    InvalidColony(String),

    #[error("Batch size must be at least 1 (got {0})")]
    InvalidBatchSize(usize),
}

pub type Result<T> = std::result::Result<T, ImportError>;
