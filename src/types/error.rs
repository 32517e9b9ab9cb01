//! Error types for the ledger engine
//!
//! This module defines all error types that can occur while moving funds,
//! reconstructing statements or reading input files.
//!
//! # Error Categories
//!
//! - **Validation Errors**: Invalid amounts, unknown accounts, KYC state,
//!   insufficient funds. Raised before any mutation, never retried.
//! - **Store Errors**: Atomicity failures (the unit was rolled back) and lock
//!   conflicts (the only retryable error).
//! - **Authorization Errors**: Administrative actions attempted by a
//!   non-admin principal.
//! - **File I/O and Parsing Errors**: Problems reading CLI input.
//!
//! Every variant maps to an HTTP-style status through
//! [`BankError::status_code`], preserving the external call contract.

use super::account::KycStatus;
use super::ids::UserId;
use super::money::Money;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Main error type for the ledger engine
///
/// Each variant includes the context needed to explain the failure to the
/// caller. Whenever one of these is returned from a money-movement
/// operation, the financial state is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    /// Amount is zero, negative, non-numeric or too precise
    #[error("Invalid amount '{amount}': {reason}")]
    InvalidAmount {
        /// The offending amount as text
        amount: String,
        /// Why it was rejected
        reason: String,
    },

    /// No account matches the given reference
    #[error("Account {reference} not found")]
    AccountNotFound {
        /// The reference that did not resolve
        reference: String,
    },

    /// No ledger entry matches the given id
    #[error("Ledger entry {entry} not found")]
    EntryNotFound {
        /// The entry id that did not resolve
        entry: String,
    },

    /// Account is not KYC-approved
    #[error("Account {account} is not KYC-approved (status: {status})")]
    KycNotApproved {
        /// Account number or id
        account: String,
        /// Current KYC status
        status: KycStatus,
    },

    /// Balance does not cover the requested debit
    #[error("Insufficient funds in account {account}: balance {available}, requested {requested}")]
    InsufficientFunds {
        /// Account number or id
        account: String,
        /// Current balance
        available: Money,
        /// Requested debit
        requested: Money,
    },

    /// Source and destination of a transfer are the same account
    #[error("Cannot transfer from account {account} to itself")]
    SameAccountTransfer {
        /// Account number or id
        account: String,
    },

    /// A store step failed and the whole unit was rolled back
    #[error("Atomic {operation} aborted: {message}")]
    AtomicityFailure {
        /// Operation whose unit was aborted
        operation: String,
        /// Underlying store failure
        message: String,
    },

    /// Account locks could not be acquired in time
    #[error("Conflict during {operation}: {message}")]
    Conflict {
        /// Operation that hit contention
        operation: String,
        /// Description of the contention
        message: String,
    },

    /// Balance arithmetic would overflow
    #[error("Arithmetic overflow in {operation} for account {account}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Account number or id
        account: String,
    },

    /// Principal is not allowed to perform an action
    #[error("User {user} is not allowed to {action}")]
    Forbidden {
        /// Acting user
        user: String,
        /// Attempted action
        action: String,
    },

    /// An account already exists for the owner or number
    #[error("Account already exists for {reference}")]
    DuplicateAccount {
        /// Owning user or account number
        reference: String,
    },

    /// Notification delivery failed
    ///
    /// Never surfaced to money-movement callers; only logged.
    #[error("Notification failed: {message}")]
    Notification {
        /// Description of the failure
        message: String,
    },

    /// Input could not be parsed
    #[error("Parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },
}

/// Coarse classification of a [`BankError`], stable for serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidAmount,
    NotFound,
    KycNotApproved,
    InsufficientFunds,
    SameAccountTransfer,
    AtomicityFailure,
    Conflict,
    ArithmeticOverflow,
    Forbidden,
    DuplicateAccount,
    Notification,
    Parse,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidAmount => "invalid_amount",
            ErrorKind::NotFound => "not_found",
            ErrorKind::KycNotApproved => "kyc_not_approved",
            ErrorKind::InsufficientFunds => "insufficient_funds",
            ErrorKind::SameAccountTransfer => "same_account_transfer",
            ErrorKind::AtomicityFailure => "atomicity_failure",
            ErrorKind::Conflict => "conflict",
            ErrorKind::ArithmeticOverflow => "arithmetic_overflow",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::DuplicateAccount => "duplicate_account",
            ErrorKind::Notification => "notification",
            ErrorKind::Parse => "parse",
            ErrorKind::Io => "io",
        };
        f.write_str(name)
    }
}

/// Structured error returned across the call boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub status: u16,
    pub message: String,
}

impl From<&BankError> for ErrorResponse {
    fn from(error: &BankError) -> Self {
        ErrorResponse {
            kind: error.kind(),
            status: error.status_code(),
            message: error.to_string(),
        }
    }
}

// Conversion from io::Error to BankError
impl From<std::io::Error> for BankError {
    fn from(error: std::io::Error) -> Self {
        BankError::IoError {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error to BankError
impl From<csv::Error> for BankError {
    fn from(error: csv::Error) -> Self {
        // Extract line number if available
        let line = error.position().map(|pos| pos.line());

        BankError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl BankError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            BankError::InvalidAmount { .. } => ErrorKind::InvalidAmount,
            BankError::AccountNotFound { .. } | BankError::EntryNotFound { .. } => {
                ErrorKind::NotFound
            }
            BankError::KycNotApproved { .. } => ErrorKind::KycNotApproved,
            BankError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            BankError::SameAccountTransfer { .. } => ErrorKind::SameAccountTransfer,
            BankError::AtomicityFailure { .. } => ErrorKind::AtomicityFailure,
            BankError::Conflict { .. } => ErrorKind::Conflict,
            BankError::ArithmeticOverflow { .. } => ErrorKind::ArithmeticOverflow,
            BankError::Forbidden { .. } => ErrorKind::Forbidden,
            BankError::DuplicateAccount { .. } => ErrorKind::DuplicateAccount,
            BankError::Notification { .. } => ErrorKind::Notification,
            BankError::ParseError { .. } => ErrorKind::Parse,
            BankError::IoError { .. } => ErrorKind::Io,
        }
    }

    /// HTTP-style status code for the error
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidAmount
            | ErrorKind::InsufficientFunds
            | ErrorKind::SameAccountTransfer
            | ErrorKind::ArithmeticOverflow
            | ErrorKind::Parse => 400,
            ErrorKind::KycNotApproved | ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::DuplicateAccount | ErrorKind::Conflict => 409,
            ErrorKind::AtomicityFailure | ErrorKind::Notification | ErrorKind::Io => 500,
        }
    }

    /// Only lock contention is worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, BankError::Conflict { .. })
    }
}

// Helper functions for creating common errors

impl BankError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: impl ToString, reason: &str) -> Self {
        BankError::InvalidAmount {
            amount: amount.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an AccountNotFound error
    pub fn account_not_found(reference: impl ToString) -> Self {
        BankError::AccountNotFound {
            reference: reference.to_string(),
        }
    }

    /// Create an EntryNotFound error
    pub fn entry_not_found(entry: impl ToString) -> Self {
        BankError::EntryNotFound {
            entry: entry.to_string(),
        }
    }

    /// Create a KycNotApproved error
    pub fn kyc_not_approved(account: impl ToString, status: KycStatus) -> Self {
        BankError::KycNotApproved {
            account: account.to_string(),
            status,
        }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(account: impl ToString, available: Money, requested: Money) -> Self {
        BankError::InsufficientFunds {
            account: account.to_string(),
            available,
            requested,
        }
    }

    /// Create a SameAccountTransfer error
    pub fn same_account_transfer(account: impl ToString) -> Self {
        BankError::SameAccountTransfer {
            account: account.to_string(),
        }
    }

    /// Create an AtomicityFailure error
    pub fn atomicity_failure(operation: &str, message: impl ToString) -> Self {
        BankError::AtomicityFailure {
            operation: operation.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a Conflict error
    pub fn conflict(operation: &str, message: impl ToString) -> Self {
        BankError::Conflict {
            operation: operation.to_string(),
            message: message.to_string(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account: impl ToString) -> Self {
        BankError::ArithmeticOverflow {
            operation: operation.to_string(),
            account: account.to_string(),
        }
    }

    /// Create a Forbidden error
    pub fn forbidden(user: &UserId, action: &str) -> Self {
        BankError::Forbidden {
            user: user.to_string(),
            action: action.to_string(),
        }
    }

    /// Create a DuplicateAccount error
    pub fn duplicate_account(reference: impl ToString) -> Self {
        BankError::DuplicateAccount {
            reference: reference.to_string(),
        }
    }

    /// Create a Notification error
    pub fn notification(message: impl ToString) -> Self {
        BankError::Notification {
            message: message.to_string(),
        }
    }

    /// Create a ParseError
    pub fn parse_error(line: Option<u64>, message: impl ToString) -> Self {
        BankError::ParseError {
            line,
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::invalid_amount(
        BankError::invalid_amount("-5", "amount must be greater than zero"),
        "Invalid amount '-5': amount must be greater than zero"
    )]
    #[case::account_not_found(
        BankError::account_not_found("BANK10000001"),
        "Account BANK10000001 not found"
    )]
    #[case::kyc_not_approved(
        BankError::kyc_not_approved("BANK10000001", KycStatus::Pending),
        "Account BANK10000001 is not KYC-approved (status: pending)"
    )]
    #[case::insufficient_funds(
        BankError::insufficient_funds("BANK1", Money::from_minor(10_000), Money::from_minor(50_000)),
        "Insufficient funds in account BANK1: balance 100.00, requested 500.00"
    )]
    #[case::same_account(
        BankError::same_account_transfer("BANK1"),
        "Cannot transfer from account BANK1 to itself"
    )]
    #[case::atomicity_failure(
        BankError::atomicity_failure("transfer", "ledger unavailable"),
        "Atomic transfer aborted: ledger unavailable"
    )]
    #[case::conflict(
        BankError::conflict("deposit", "lock wait timed out"),
        "Conflict during deposit: lock wait timed out"
    )]
    #[case::parse_error_with_line(
        BankError::parse_error(Some(42), "Invalid field"),
        "Parse error at line 42: Invalid field"
    )]
    #[case::parse_error_without_line(
        BankError::parse_error(None, "Invalid field"),
        "Parse error: Invalid field"
    )]
    fn test_error_display(#[case] error: BankError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::invalid_amount(BankError::invalid_amount("0", "zero"), 400)]
    #[case::insufficient_funds(
        BankError::insufficient_funds("A", Money::ZERO, Money::from_minor(1)),
        400
    )]
    #[case::same_account(BankError::same_account_transfer("A"), 400)]
    #[case::not_found(BankError::account_not_found("A"), 404)]
    #[case::entry_not_found(BankError::entry_not_found("x"), 404)]
    #[case::kyc(BankError::kyc_not_approved("A", KycStatus::Rejected), 403)]
    #[case::forbidden(BankError::forbidden(&UserId::new("u"), "patch"), 403)]
    #[case::conflict(BankError::conflict("transfer", "busy"), 409)]
    #[case::atomicity(BankError::atomicity_failure("transfer", "boom"), 500)]
    fn test_status_codes(#[case] error: BankError, #[case] expected: u16) {
        assert_eq!(error.status_code(), expected);
    }

    #[test]
    fn test_only_conflicts_are_retryable() {
        assert!(BankError::conflict("deposit", "busy").is_retryable());
        assert!(!BankError::atomicity_failure("deposit", "boom").is_retryable());
        assert!(!BankError::insufficient_funds("A", Money::ZERO, Money::from_minor(1)).is_retryable());
    }

    #[test]
    fn test_error_response_shape() {
        let error = BankError::kyc_not_approved("BANK1", KycStatus::Pending);
        let response = ErrorResponse::from(&error);

        assert_eq!(response.kind, ErrorKind::KycNotApproved);
        assert_eq!(response.status, 403);
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"kind":"kyc_not_approved","status":403,"message":"Account BANK1 is not KYC-approved (status: pending)"}"#
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Permission denied");
        let error: BankError = io_error.into();
        assert!(matches!(error, BankError::IoError { .. }));
        assert_eq!(error.to_string(), "I/O error: Permission denied");
        assert_eq!(error.status_code(), 500);
    }
}
