//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `ids`: Identifiers for accounts, ledger entries and users
//! - `money`: Integer minor-unit monetary amounts
//! - `account`: Account state and KYC status
//! - `transaction`: Ledger entries (the persisted financial events)
//! - `statement`: Derived statement lines
//! - `principal`: Caller identity supplied by the identity provider
//! - `error`: Error types for the ledger engine

pub mod account;
pub mod error;
pub mod ids;
pub mod money;
pub mod principal;
pub mod statement;
pub mod transaction;

pub use account::{Account, AccountRef, KycStatus};
pub use error::{BankError, ErrorKind, ErrorResponse};
pub use ids::{AccountId, AccountNumber, EntryId, UserId};
pub use money::Money;
pub use principal::Principal;
pub use statement::{Statement, StatementLine};
pub use transaction::{Direction, EntryKind, EntryStatus, LedgerEntry};
