// Postal Catalog Importer - Core Library
// Exposes the import pipeline for the CLI and for tests

pub mod batch;
pub mod config;
pub mod db;
pub mod dedup;
pub mod entities;
pub mod error;
pub mod importer;
pub mod normalizer;
pub mod parser;
pub mod resolver;
pub mod stats;

// Re-export commonly used types
pub use batch::{BatchWriter, ColonySink, DEFAULT_BATCH_SIZE};
pub use config::{HeaderPolicy, ImportConfig};
pub use db::{setup_database, CatalogStore, ImportRun};
pub use dedup::{composite_key, DedupGuard};
pub use entities::{
    federal_entities, Colony, FederalEntity, Municipality, MunicipalityRecord, NewColony,
};
pub use error::{ImportError, Result, CATALOG_SOURCE_URL};
pub use importer::{
    import_file, process_line, run_catalog_import, run_import, ImportOptions, RowOutcome,
    RunReport,
};
pub use normalizer::normalize;
pub use parser::{parse_line, CatalogRecord, ParseOutcome, SkipReason};
pub use resolver::{MatchTier, ReferenceIndex, Resolution};
pub use stats::{ImportStats, ImportSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
