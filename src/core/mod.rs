//! Core business logic module
//!
//! This module contains the ledger subsystem components:
//! - `traits` - Store abstractions for accounts and the ledger
//! - `account_store` / `ledger_store` - In-memory store implementations
//! - `locks` - Per-account lock registry
//! - `unit` - All-or-nothing execution of one movement
//! - `engine` - Deposit, withdrawal and transfer orchestration
//! - `statement` - Statement reconstruction by ledger replay
//! - `directory` - Account lookup and KYC workflow
//! - `admin` - Audited administrative override
//! - `notifier` - Post-commit movement events
//! - `bank` - Wiring of all of the above

pub mod account_store;
pub mod admin;
pub mod bank;
pub mod clock;
pub mod directory;
pub mod engine;
pub mod ledger_store;
pub mod locks;
pub mod notifier;
pub mod statement;
pub mod traits;
pub mod unit;

pub use account_store::InMemoryAccountStore;
pub use admin::{AccountPatch, AdminOverride, AuditLog, AuditRecord};
pub use bank::{Bank, BankBuilder, Operation, Outcome};
pub use clock::{Clock, ManualClock, SystemClock};
pub use directory::{AccountDirectory, KycDecision};
pub use engine::{
    DepositRequest, MovementEngine, MovementReceipt, MovementRequest, TransferReceipt,
    TransferRequest, WithdrawRequest,
};
pub use ledger_store::InMemoryLedgerStore;
pub use locks::{AccountGuards, AccountLocks};
pub use notifier::{MovementEvent, Notifier, TracingNotifier};
pub use statement::StatementReconstructor;
pub use traits::{AccountStore, LedgerStore, LedgerView};
pub use unit::AtomicUnit;
