//! Benchmark suite for comparing processing strategies
//!
//! This benchmark compares the sequential and concurrent strategies using
//! the divan benchmarking framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//! ```
//!
//! # Benchmark Fixtures
//!
//! All runs open the 20 accounts in `benches/fixtures/accounts.csv` and then
//! apply one of:
//! - `operations_small.csv` - Small feed (100 operations)
//! - `operations_medium.csv` - Medium feed (1,000 operations)
//! - `operations_large.csv` - Large feed (10,000 operations)
//!
//! Each feed mixes deposits, withdrawals (some overdrawing) and transfers.

use bank_ledger_engine::cli::StrategyType;
use bank_ledger_engine::core::Bank;
use bank_ledger_engine::io::read_accounts;
use bank_ledger_engine::strategy::{create_strategy, BatchConfig};
use bank_ledger_engine::EngineConfig;
use std::path::Path;

fn main() {
    divan::main();
}

const FEEDS: &[&str] = &["small", "medium", "large"];

/// Open the benchmark accounts and apply one feed with the given strategy
fn run_feed(runtime: &tokio::runtime::Runtime, strategy_type: StrategyType, feed: &str) {
    let strategy = create_strategy(strategy_type, Some(BatchConfig::default()));
    let operations = format!("benches/fixtures/operations_{}.csv", feed);

    runtime.block_on(async {
        let bank = Bank::new();
        let accounts = read_accounts(
            Path::new("benches/fixtures/accounts.csv"),
            EngineConfig::default().opening_balance,
        )
        .expect("Failed to read accounts");
        for account in accounts {
            bank.directory()
                .register(account)
                .await
                .expect("Failed to register account");
        }

        strategy
            .process(&bank, Path::new(&operations))
            .await
            .expect("Processing failed");
    });
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build runtime")
}

/// Benchmark the sequential strategy
#[divan::bench(args = FEEDS)]
fn sequential_strategy(bencher: divan::Bencher, feed: &str) {
    let runtime = runtime();
    bencher.bench_local(|| run_feed(&runtime, StrategyType::Sequential, feed));
}

/// Benchmark the concurrent strategy
#[divan::bench(args = FEEDS)]
fn concurrent_strategy(bencher: divan::Bencher, feed: &str) {
    let runtime = runtime();
    bencher.bench_local(|| run_feed(&runtime, StrategyType::Concurrent, feed));
}
