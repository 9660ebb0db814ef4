// 📊 Run Statistics - counters, throughput and the final summary table
//
// Pure bookkeeping: nothing here feeds back into pipeline decisions.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::parser::SkipReason;

// ============================================================================
// RUNNING COUNTERS
// ============================================================================

#[derive(Debug)]
pub struct ImportStats {
    pub processed: u64,
    pub imported: u64,
    pub duplicates: u64,
    pub errors: u64,

    // skipped = malformed + missing_field + invalid_postal_code + unresolved
    pub malformed: u64,
    pub missing_field: u64,
    pub invalid_postal_code: u64,
    pub unresolved: u64,

    /// Bulk-write calls issued to the sink (successful or not)
    pub batches_written: u64,
    pub batches_failed: u64,

    started: Instant,
}

impl ImportStats {
    pub fn new() -> Self {
        ImportStats {
            processed: 0,
            imported: 0,
            duplicates: 0,
            errors: 0,
            malformed: 0,
            missing_field: 0,
            invalid_postal_code: 0,
            unresolved: 0,
            batches_written: 0,
            batches_failed: 0,
            started: Instant::now(),
        }
    }

    /// All rows skipped before reaching the writer
    pub fn skipped(&self) -> u64 {
        self.malformed + self.missing_field + self.invalid_postal_code + self.unresolved
    }

    pub fn record_skip(&mut self, reason: &SkipReason) {
        match reason {
            SkipReason::Malformed { .. } => self.malformed += 1,
            SkipReason::MissingField(_) => self.missing_field += 1,
            SkipReason::InvalidPostalCode(_) => self.invalid_postal_code += 1,
        }
    }

    pub fn record_unresolved(&mut self) {
        self.unresolved += 1;
    }

    pub fn record_duplicate(&mut self) {
        self.duplicates += 1;
    }

    pub fn record_row_error(&mut self) {
        self.errors += 1;
    }

    pub fn record_batch_written(&mut self, rows: usize) {
        self.batches_written += 1;
        self.imported += rows as u64;
    }

    /// A failed batch counts every one of its rows as an error
    pub fn record_batch_failed(&mut self, rows: usize) {
        self.batches_written += 1;
        self.batches_failed += 1;
        self.errors += rows as u64;
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Freeze the counters into a summary
    pub fn finish(&self) -> ImportSummary {
        ImportSummary::from_counts(self, self.elapsed())
    }
}

impl Default for ImportStats {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// FINAL SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub processed: u64,
    pub imported: u64,
    pub skipped: u64,
    pub duplicates: u64,
    pub errors: u64,
    pub malformed: u64,
    pub missing_field: u64,
    pub invalid_postal_code: u64,
    pub unresolved: u64,
    pub batches_written: u64,
    pub batches_failed: u64,
    pub elapsed_secs: f64,

    /// processed / max(elapsed, 1s)
    pub rows_per_second: f64,
}

impl ImportSummary {
    fn from_counts(stats: &ImportStats, elapsed: Duration) -> Self {
        ImportSummary {
            processed: stats.processed,
            imported: stats.imported,
            skipped: stats.skipped(),
            duplicates: stats.duplicates,
            errors: stats.errors,
            malformed: stats.malformed,
            missing_field: stats.missing_field,
            invalid_postal_code: stats.invalid_postal_code,
            unresolved: stats.unresolved,
            batches_written: stats.batches_written,
            batches_failed: stats.batches_failed,
            elapsed_secs: elapsed.as_secs_f64(),
            rows_per_second: throughput(stats.processed, elapsed),
        }
    }

    /// Console table for the end of a run
    pub fn render_table(&self) -> String {
        let rows = [
            ("Processed", self.processed.to_string()),
            ("Imported", self.imported.to_string()),
            ("Duplicates", self.duplicates.to_string()),
            ("Skipped", self.skipped.to_string()),
            ("  malformed", self.malformed.to_string()),
            ("  missing field", self.missing_field.to_string()),
            ("  invalid postal code", self.invalid_postal_code.to_string()),
            ("  unresolved municipality", self.unresolved.to_string()),
            ("Errors", self.errors.to_string()),
            ("Duration", format!("{:.2}s", self.elapsed_secs)),
            ("Throughput", format!("{:.0} rows/s", self.rows_per_second)),
        ];

        let mut out = String::new();
        out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
        out.push_str(&format!("{:<28}{:>17}\n", "Metric", "Value"));
        out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
        for (label, value) in rows {
            out.push_str(&format!("{:<28}{:>17}\n", label, value));
        }
        out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        out
    }
}

/// Rows per second, with elapsed clamped to at least one second
pub fn throughput(processed: u64, elapsed: Duration) -> f64 {
    processed as f64 / elapsed.as_secs_f64().max(1.0)
}

// ============================================================================
// TESTS
// ============================================================================
