//! CSV format handling for operations, accounts and statements
//!
//! This module centralizes all CSV format concerns, providing:
//! - Record structures for deserializing operation and account rows
//! - Conversion from CSV records to domain types
//! - Account and statement output serialization
//!
//! All functions are pure (no file I/O) for easy testing.

use crate::core::{MovementRequest, Operation, TransferRequest};
use crate::types::{Account, AccountNumber, AccountRef, BankError, KycStatus, Money, Statement, UserId};
use serde::Deserialize;
use std::io::Write;

/// Operation row: `op,account,counterparty,amount,description`
///
/// `counterparty` is only read for transfers and `description` is optional.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct OperationCsvRecord {
    pub op: String,
    pub account: String,
    pub counterparty: Option<String>,
    pub amount: String,
    pub description: Option<String>,
}

/// Account row: `number,holder,balance,status`
///
/// A blank balance means the configured opening balance.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AccountCsvRecord {
    pub number: String,
    pub holder: String,
    pub balance: Option<String>,
    pub status: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Convert an OperationCsvRecord to an Operation
///
/// This function:
/// - Parses the op name (case insensitive)
/// - Parses the amount into minor units
/// - Requires a counterparty for transfers
///
/// Amounts are not checked for sign here; the engine rejects non-positive
/// amounts with `InvalidAmount`.
pub fn convert_operation_record(record: OperationCsvRecord) -> Result<Operation, BankError> {
    let account = record.account.trim();
    if account.is_empty() {
        return Err(BankError::parse_error(None, "Operation has no account"));
    }
    let amount: Money = record.amount.parse()?;
    let description = non_empty(record.description);

    let operation = match record.op.trim().to_lowercase().as_str() {
        "deposit" => Operation::Deposit(MovementRequest {
            account: AccountRef::number(account),
            amount,
            description,
        }),
        "withdraw" | "withdrawal" => Operation::Withdraw(MovementRequest {
            account: AccountRef::number(account),
            amount,
            description,
        }),
        "transfer" => {
            let counterparty = non_empty(record.counterparty).ok_or_else(|| {
                BankError::parse_error(
                    None,
                    format!("Transfer from {} requires a counterparty", account),
                )
            })?;
            Operation::Transfer(TransferRequest {
                from: AccountRef::number(account),
                to: AccountRef::number(counterparty),
                amount,
                description,
            })
        }
        other => {
            return Err(BankError::parse_error(
                None,
                format!("Invalid operation '{}' for account {}", other, account),
            ))
        }
    };

    Ok(operation)
}

/// Convert an AccountCsvRecord to an Account
///
/// Seeded accounts are owned by a user named after their number and use
/// their seeded balance as the statement baseline. A missing status means
/// approved and a missing balance means `opening_balance`.
pub fn convert_account_record(
    record: AccountCsvRecord,
    opening_balance: Money,
) -> Result<Account, BankError> {
    let number = record.number.trim();
    if number.is_empty() {
        return Err(BankError::parse_error(None, "Account has no number"));
    }
    let balance = match non_empty(record.balance) {
        Some(balance) => balance.parse::<Money>()?,
        None => opening_balance,
    };
    if balance < Money::ZERO {
        return Err(BankError::invalid_amount(balance, "seeded balance cannot be negative"));
    }

    let mut account = Account::approved(
        AccountNumber::new(number),
        UserId::new(number),
        record.holder.trim(),
        balance,
    );
    if let Some(status) = non_empty(record.status) {
        account.status = status.parse::<KycStatus>()?;
    }
    Ok(account)
}

/// Write account states to CSV format
///
/// Writes accounts with columns: number, holder, balance, status.
/// Accounts are sorted by number for deterministic output; accounts without
/// a number sort by id after the numbered ones.
pub fn write_accounts_csv(accounts: &[Account], output: &mut dyn Write) -> Result<(), BankError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(["number", "holder", "balance", "status"])?;

    let mut sorted_accounts = accounts.to_vec();
    sorted_accounts.sort_by_key(|account| (account.number.is_none(), account.display_ref()));

    for account in sorted_accounts {
        writer.write_record(&[
            account.display_ref(),
            account.holder.clone(),
            account.balance.to_string(),
            account.status.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write a statement to CSV format
///
/// Columns: account, entry, created_at, kind, direction, amount,
/// balance_before, balance_after, description. Timestamps are RFC 3339.
///
/// The ledger lines are framed by an `opening` row and a `closing` row that
/// carry the statement's opening and closing balances in `balance_after`
/// and leave the entry columns empty.
pub fn write_statement_csv(statement: &Statement, output: &mut dyn Write) -> Result<(), BankError> {
    let mut writer = csv::Writer::from_writer(output);
    let account = statement
        .account_number
        .as_ref()
        .map(|number| number.to_string())
        .unwrap_or_else(|| statement.account.to_string());

    writer.write_record([
        "account",
        "entry",
        "created_at",
        "kind",
        "direction",
        "amount",
        "balance_before",
        "balance_after",
        "description",
    ])?;

    writer.write_record(&summary_row(&account, "opening", statement.opening_balance, "Opening balance"))?;
    for line in &statement.lines {
        writer.write_record(&[
            account.clone(),
            line.entry.to_string(),
            line.created_at.to_rfc3339(),
            line.kind.to_string(),
            line.direction.to_string(),
            line.amount.to_string(),
            line.balance_before.to_string(),
            line.balance_after.to_string(),
            line.description.clone(),
        ])?;
    }
    writer.write_record(&summary_row(&account, "closing", statement.closing_balance, "Closing balance"))?;

    writer.flush()?;
    Ok(())
}

fn summary_row(account: &str, kind: &str, balance: Money, description: &str) -> [String; 9] {
    [
        account.to_string(),
        String::new(),
        String::new(),
        kind.to_string(),
        String::new(),
        String::new(),
        String::new(),
        balance.to_string(),
        description.to_string(),
    ]
}
