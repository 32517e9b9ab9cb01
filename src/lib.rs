//! Bank Ledger Engine Library
//! # Overview
//!
//! This library moves money between bank accounts and keeps an append-only
//! ledger that can replay any account's history. Deposits, withdrawals and
//! transfers each run as one atomic unit: the balances and the ledger entry
//! are written together or not at all.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Account, Money, LedgerEntry, Statement, BankError)
//! - [`config`] - Engine tunables (opening balance, lock timeout, retries)
//! - [`core`] - Business logic components:
//!   - [`core::engine`] - Deposit, withdraw and transfer orchestration
//!   - [`core::unit`] - Atomic unit with rollback of balance writes
//!   - [`core::locks`] - Per-account locks acquired in a global order
//!   - [`core::statement`] - Statement reconstruction by ledger replay
//!   - [`core::directory`] - Account opening and KYC review
//!   - [`core::admin`] - Audited administrative overrides
//! - [`io`] - CSV reading and writing
//! - [`strategy`] - Sequential and concurrent feed processing
//! - [`cli`] - CLI arguments parsing and the end-to-end run
//! - [`telemetry`] - Tracing subscriber setup
//!
//! # Invariants
//!
//! - Money is held in integer minor units; no float arithmetic.
//! - A transfer never changes the sum of all balances.
//! - No movement leaves a balance below zero.
//! - Every ledger entry carries the balance after it was applied, so a
//!   statement replay can check itself against the recorded balances.

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod strategy;
pub mod telemetry;
pub mod types;

pub use config::EngineConfig;
pub use core::{Bank, MovementEngine, StatementReconstructor};
pub use io::{write_accounts_csv, write_statement_csv};
pub use types::{
    Account, AccountId, AccountNumber, AccountRef, BankError, KycStatus, LedgerEntry, Money,
    Statement, UserId,
};
