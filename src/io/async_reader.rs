//! Asynchronous CSV reader with batch interface
//!
//! Reads operations from a CSV file in batches for concurrent processing.
//!
//! # Design
//!
//! The AsyncReader uses:
//! - csv-async for streaming CSV parsing
//! - tokio (through the futures compat layer) for async file I/O
//! - Batch reading for efficient processing
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of Operations
//!                  ↓
//!           csv_format module
//!           (OperationCsvRecord, convert_operation_record)
//! ```

use crate::core::Operation;
use crate::io::csv_format::{convert_operation_record, OperationCsvRecord};
use crate::types::BankError;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;

/// Asynchronous CSV reader
///
/// Yields batches of operations. Rows that fail to parse are logged and
/// counted, then skipped.
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    rejected: usize,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    /// Create a new AsyncReader from an async reader
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            rejected: 0,
        }
    }

    /// Number of rows skipped so far because they failed to parse
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Read a batch of operations
    ///
    /// Reads up to `batch_size` valid operations. Invalid rows are logged
    /// with `tracing::warn!` and skipped.
    ///
    /// # Returns
    ///
    /// The operations read, in file order. Returns an empty vector when the
    /// end of the file is reached.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<Operation> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<OperationCsvRecord>();

        while batch.len() < batch_size {
            let result = match records.next().await {
                Some(Ok(record)) => convert_operation_record(record),
                Some(Err(e)) => Err(BankError::parse_error(
                    e.position().map(|pos| pos.line()),
                    e,
                )),
                None => break,
            };

            match result {
                Ok(operation) => batch.push(operation),
                Err(error) => {
                    self.rejected += 1;
                    tracing::warn!(%error, "Skipping unreadable operation");
                }
            }
        }

        batch
    }
}
