// 💾 Batch Writer - amortize sink writes over fixed-size chunks
//
// Rows accumulate in a buffer; a full buffer becomes ONE write_batch call.
// A failed call costs the whole batch (every row counted as an error) and
// the run keeps going with the next batch. No retries, no partial recovery.

use tracing::{debug, error};

use crate::entities::NewColony;
use crate::error::{ImportError, Result};
use crate::stats::ImportStats;

/// Default number of rows per bulk write
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Destination of resolved colony rows
///
/// Implemented by the SQLite catalog store; tests use in-memory recorders.
pub trait ColonySink {
    /// Persist all rows or none of them
    fn write_batch(&mut self, rows: &[NewColony]) -> Result<()>;
}

pub struct BatchWriter<'a, S: ColonySink> {
    sink: &'a mut S,
    buffer: Vec<NewColony>,
    chunk_size: usize,
}

impl<'a, S: ColonySink> BatchWriter<'a, S> {
    pub fn new(sink: &'a mut S, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ImportError::InvalidBatchSize(chunk_size));
        }

        Ok(BatchWriter {
            sink,
            buffer: Vec::with_capacity(chunk_size),
            chunk_size,
        })
    }

    /// Buffer a row, flushing when the chunk is full
    pub fn push(&mut self, row: NewColony, stats: &mut ImportStats) {
        self.buffer.push(row);
        if self.buffer.len() >= self.chunk_size {
            self.flush(stats);
        }
    }

    /// Write whatever is buffered (no-op when empty)
    pub fn flush(&mut self, stats: &mut ImportStats) {
        if self.buffer.is_empty() {
            return;
        }

        let rows = self.buffer.len();
        match self.sink.write_batch(&self.buffer) {
            Ok(()) => {
                stats.record_batch_written(rows);
                debug!(rows, batch = stats.batches_written, "Batch written");
            }
            Err(e) => {
                stats.record_batch_failed(rows);
                error!(rows, error = %e, "Batch write failed, rows counted as errors");
            }
        }
        self.buffer.clear();
    }

    /// End of stream: flush the final partial batch
    pub fn finish(mut self, stats: &mut ImportStats) {
        self.flush(stats);
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every batch it receives; optionally fails selected calls
    #[derive(Default)]
    struct RecordingSink {
        batches: Vec<Vec<NewColony>>,
        fail_calls: Vec<usize>,
        calls: usize,
    }

    impl ColonySink for RecordingSink {
        fn write_batch(&mut self, rows: &[NewColony]) -> Result<()> {
            self.calls += 1;
            if self.fail_calls.contains(&self.calls) {
                return Err(ImportError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk full",
                )));
            }
            self.batches.push(rows.to_vec());
            Ok(())
        }
    }

    fn colony(n: usize) -> NewColony {
        NewColony::new(1, &format!("COLONIA {}", n), &format!("{:05}", n)).unwrap()
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut sink = RecordingSink::default();
        assert!(matches!(
            BatchWriter::new(&mut sink, 0),
            Err(ImportError::InvalidBatchSize(0))
        ));
    }

    #[test]
    fn test_one_write_after_exactly_n_rows() {
        let mut sink = RecordingSink::default();
        let mut stats = ImportStats::new();

        {
            let mut writer = BatchWriter::new(&mut sink, 3).unwrap();
            writer.push(colony(1), &mut stats);
            writer.push(colony(2), &mut stats);
            assert_eq!(writer.buffered(), 2);
            assert_eq!(stats.batches_written, 0);

            writer.push(colony(3), &mut stats);
            assert_eq!(writer.buffered(), 0);
        }

        assert_eq!(sink.calls, 1);
        assert_eq!(sink.batches[0].len(), 3);
        assert_eq!(stats.imported, 3);
    }

    #[test]
    fn test_partial_batch_flushed_on_finish() {
        let mut sink = RecordingSink::default();
        let mut stats = ImportStats::new();

        let mut writer = BatchWriter::new(&mut sink, 4).unwrap();
        for n in 0..6 {
            writer.push(colony(n), &mut stats);
        }
        writer.finish(&mut stats);

        assert_eq!(sink.calls, 2);
        assert_eq!(sink.batches[0].len(), 4);
        assert_eq!(sink.batches[1].len(), 2);
        assert_eq!(stats.imported, 6);
    }

    #[test]
    fn test_finish_with_empty_buffer_does_not_write() {
        let mut sink = RecordingSink::default();
        let mut stats = ImportStats::new();

        let writer = BatchWriter::new(&mut sink, 4).unwrap();
        writer.finish(&mut stats);

        assert_eq!(sink.calls, 0);
        assert_eq!(stats.batches_written, 0);
    }

    #[test]
    fn test_failed_batch_counts_rows_as_errors_and_continues() {
        let mut sink = RecordingSink {
            fail_calls: vec![1],
            ..Default::default()
        };
        let mut stats = ImportStats::new();

        let mut writer = BatchWriter::new(&mut sink, 2).unwrap();
        for n in 0..5 {
            writer.push(colony(n), &mut stats);
        }
        writer.finish(&mut stats);

        // call 1 failed (2 rows), calls 2 and 3 succeeded (2 + 1 rows)
        assert_eq!(sink.calls, 3);
        assert_eq!(stats.errors, 2);
        assert_eq!(stats.imported, 3);
        assert_eq!(stats.batches_failed, 1);
    }
}
