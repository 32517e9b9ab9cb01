//! Concurrent batch processing strategy
//!
//! Reads the feed in batches with the [`AsyncReader`] and applies each batch
//! with bounded concurrency.
//!
//! # Architecture
//!
//! ```text
//! ConcurrentStrategy
//!     ├── BatchConfig (batch_size, max_concurrent)
//!     ├── AsyncReader (batch CSV reading)
//!     └── Bank (shared, lock-protected engine)
//! ```
//!
//! # Ordering
//!
//! Batches are applied one after another, so an operation never overtakes
//! one from an earlier batch. Inside a batch, operations run concurrently
//! and their relative order is not defined: two withdrawals racing for the
//! same funds may succeed in either order. Balances stay consistent either
//! way because every unit holds its account locks.

use crate::core::Bank;
use crate::io::async_reader::AsyncReader;
use crate::strategy::{ProcessingStrategy, ProcessingSummary};
use crate::types::BankError;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::path::Path;

/// Configuration for batch processing
///
/// Controls how operations are batched and how many are in flight at once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of operations per batch
    pub batch_size: usize,
    /// Maximum number of operations in flight within a batch
    pub max_concurrent: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig with custom values
    ///
    /// Zero values fall back to the defaults with a warning.
    pub fn new(batch_size: usize, max_concurrent: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            tracing::warn!(default = default.batch_size, "Invalid batch_size (0), using default");
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent = if max_concurrent == 0 {
            tracing::warn!(
                default = default.max_concurrent,
                "Invalid max_concurrent (0), using default"
            );
            default.max_concurrent
        } else {
            max_concurrent
        };

        Self {
            batch_size,
            max_concurrent,
        }
    }
}

/// Concurrent batch processing strategy
#[derive(Debug, Clone)]
pub struct ConcurrentStrategy {
    config: BatchConfig,
}

impl ConcurrentStrategy {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ProcessingStrategy for ConcurrentStrategy {
    async fn process(
        &self,
        bank: &Bank,
        input_path: &Path,
    ) -> Result<ProcessingSummary, BankError> {
        let file = tokio::fs::File::open(input_path)
            .await
            .map_err(|e| BankError::IoError {
                message: format!("Failed to open file '{}': {}", input_path.display(), e),
            })?;

        // Wrap tokio file in a compatibility layer for csv-async
        let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
        let mut reader = AsyncReader::new(compat_file);
        let mut summary = ProcessingSummary::default();

        loop {
            let batch = reader.read_batch(self.config.batch_size).await;
            if batch.is_empty() {
                break;
            }
            tracing::debug!(size = batch.len(), "Applying batch");

            let results: Vec<_> = stream::iter(batch)
                .map(|operation| async move {
                    let name = operation.name();
                    (name, bank.apply(operation).await)
                })
                .buffer_unordered(self.config.max_concurrent)
                .collect()
                .await;

            for (name, result) in results {
                match result {
                    Ok(_) => summary.applied += 1,
                    Err(error) => {
                        tracing::warn!(operation = name, %error, "Operation rejected");
                        summary.rejected += 1;
                    }
                }
            }
        }

        summary.rejected += reader.rejected();
        tracing::info!(applied = summary.applied, rejected = summary.rejected, "Feed processed");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::AccountStore;
    use crate::core::InMemoryAccountStore;
    use crate::types::{Account, AccountNumber, AccountRef, Money, UserId};
    use rstest::rstest;
    use std::fmt::Write as _;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[rstest]
    #[case::valid(10, 4, 10, 4)]
    #[case::zero_batch(0, 4, 1000, 4)]
    fn test_batch_config_new(
        #[case] batch_size: usize,
        #[case] max_concurrent: usize,
        #[case] expected_batch: usize,
        #[case] expected_concurrent: usize,
    ) {
        let config = BatchConfig::new(batch_size, max_concurrent);

        assert_eq!(config.batch_size, expected_batch);
        assert_eq!(config.max_concurrent, expected_concurrent);
    }

    #[test]
    fn test_batch_config_zero_concurrency_uses_cpu_count() {
        assert_eq!(BatchConfig::new(1, 0).max_concurrent, num_cpus::get());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_strategy_conserves_money() {
        let store = Arc::new(InMemoryAccountStore::new());
        for number in ["BANK1", "BANK2", "BANK3"] {
            store
                .insert(Account::approved(
                    AccountNumber::new(number),
                    UserId::new(number),
                    number,
                    Money::from_minor(100_000),
                ))
                .await
                .unwrap();
        }
        let bank = Bank::builder().accounts(store.clone()).build();

        let mut csv = String::from("op,account,counterparty,amount,description\n");
        let pairs = [("BANK1", "BANK2"), ("BANK2", "BANK3"), ("BANK3", "BANK1")];
        for i in 0..60 {
            let (from, to) = pairs[i % pairs.len()];
            writeln!(csv, "transfer,{},{},1.25,", from, to).unwrap();
        }
        let file = create_temp_csv(&csv);

        let summary = ConcurrentStrategy::new(BatchConfig::new(16, 8))
            .process(&bank, file.path())
            .await
            .unwrap();

        assert_eq!(summary, ProcessingSummary { applied: 60, rejected: 0 });
        let mut total = 0;
        for number in ["BANK1", "BANK2", "BANK3"] {
            let account = store.resolve(&AccountRef::number(number)).await.unwrap();
            assert_eq!(account.balance, Money::from_minor(100_000));
            total += account.balance.minor();
        }
        assert_eq!(total, 300_000);
        assert_eq!(bank.ledger().len().await.unwrap(), 60);
    }

    #[tokio::test]
    async fn test_concurrent_strategy_handles_missing_file() {
        let bank = Bank::new();

        let result = ConcurrentStrategy::new(BatchConfig::default())
            .process(&bank, Path::new("nonexistent.csv"))
            .await;

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to open file"));
    }
}
