// ⚙️ Import configuration
//
// Layering (lowest → highest): built-in defaults → TOML file → CLI flags/env.
//
// Example postal-catalog.toml:
//
//   database_path = "storage/catalog.db"
//   source_path = "storage/app/sepomex/CPdescarga.txt"
//   batch_size = 2000
//   header_policy = "skip-only-after-banner"
//   progress_interval = 50000

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::batch::DEFAULT_BATCH_SIZE;
use crate::error::{ImportError, Result};

pub const DEFAULT_SOURCE_PATH: &str = "storage/app/sepomex/CPdescarga.txt";
pub const DEFAULT_DATABASE_PATH: &str = "storage/catalog.db";
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10_000;

/// What to do with the first line when no banner is found
///
/// Files straight from the official export start with a copyright banner
/// followed by a column header; both are always discarded. Trimmed or
/// re-exported files may lack the banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeaderPolicy {
    /// No banner → the first line is data (a bare header line is then
    /// rejected by the parser as an invalid postal code and counted skipped)
    #[default]
    SkipOnlyAfterBanner,

    /// No banner → the first line is still discarded as a header, which drops
    /// one real record on files that start directly with data
    AlwaysSkipFirst,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub database_path: PathBuf,
    pub source_path: PathBuf,

    /// Rows per bulk write
    pub batch_size: usize,

    /// Stop after this many processed rows (0 = whole file)
    pub limit: u64,

    /// Log every unresolved municipality at warn level
    pub verbose: bool,

    pub header_policy: HeaderPolicy,

    /// Log progress every N processed rows (0 = never)
    pub progress_interval: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        ImportConfig {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            source_path: PathBuf::from(DEFAULT_SOURCE_PATH),
            batch_size: DEFAULT_BATCH_SIZE,
            limit: 0,
            verbose: false,
            header_policy: HeaderPolicy::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl ImportConfig {
    /// Load from a TOML file; missing keys fall back to defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ImportError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ImportConfig =
            toml::from_str(text).map_err(|e| ImportError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, or the given file when present
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(ImportError::InvalidBatchSize(self.batch_size));
        }
        Ok(())
    }
}
