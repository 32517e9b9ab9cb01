//! Processing strategy module for operation feeds
//!
//! This module defines the Strategy pattern for applying a CSV feed of
//! operations to a [`Bank`]. Strategies differ only in how they read the
//! feed and how many operations they keep in flight; the per-account locks
//! of the engine keep every strategy consistent.

use crate::cli::StrategyType;
use crate::core::Bank;
use crate::types::BankError;
use async_trait::async_trait;
use std::path::Path;

pub mod concurrent;
pub mod sequential;

pub use concurrent::{BatchConfig, ConcurrentStrategy};
pub use sequential::SequentialStrategy;

/// Counts of what happened to a feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessingSummary {
    /// Operations committed to the ledger
    pub applied: usize,
    /// Rows that failed to parse or were rejected by the engine
    pub rejected: usize,
}

/// Processing strategy trait for operation feeds
#[async_trait]
pub trait ProcessingStrategy: Send + Sync {
    /// Apply every operation in the CSV file at `input_path` to `bank`
    ///
    /// # Returns
    ///
    /// * `Ok(ProcessingSummary)` if the feed was read to the end
    /// * `Err(BankError)` if a fatal error occurred (file not found, I/O error)
    ///
    /// Rejected operations are logged and counted, and processing continues
    /// with the next one.
    async fn process(&self, bank: &Bank, input_path: &Path)
        -> Result<ProcessingSummary, BankError>;
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create
/// * `config` - Optional batch configuration (ignored for sequential)
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sequential => Box::new(SequentialStrategy),
        StrategyType::Concurrent => {
            let config = config.unwrap_or_default();
            Box::new(ConcurrentStrategy::new(config))
        }
    }
}
