//! Sequential processing strategy
//!
//! Streams the feed with the [`SyncReader`] and applies one operation at a
//! time, in file order. The result is fully deterministic, so this is the
//! strategy to use when the feed contains operations whose outcome depends
//! on earlier ones.

use crate::core::Bank;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{ProcessingStrategy, ProcessingSummary};
use crate::types::BankError;
use async_trait::async_trait;
use std::path::Path;

/// One operation at a time, in file order
#[derive(Debug, Clone, Copy)]
pub struct SequentialStrategy;

#[async_trait]
impl ProcessingStrategy for SequentialStrategy {
    async fn process(
        &self,
        bank: &Bank,
        input_path: &Path,
    ) -> Result<ProcessingSummary, BankError> {
        let reader = SyncReader::new(input_path)?;
        let mut summary = ProcessingSummary::default();

        for result in reader {
            let operation = match result {
                Ok(operation) => operation,
                Err(error) => {
                    tracing::warn!(%error, "Skipping unreadable operation");
                    summary.rejected += 1;
                    continue;
                }
            };

            let name = operation.name();
            match bank.apply(operation).await {
                Ok(_) => summary.applied += 1,
                Err(error) => {
                    tracing::warn!(operation = name, %error, "Operation rejected");
                    summary.rejected += 1;
                }
            }
        }

        tracing::info!(applied = summary.applied, rejected = summary.rejected, "Feed processed");
        Ok(summary)
    }
}
