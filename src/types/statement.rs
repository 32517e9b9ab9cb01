//! Statement types derived from the ledger
//!
//! Statements are never persisted; they are rebuilt on demand by replaying
//! an account's ledger entries.

use super::ids::{AccountId, AccountNumber, EntryId};
use super::money::Money;
use super::transaction::{Direction, EntryKind};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One replayed ledger entry, as seen by a single account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementLine {
    pub entry: EntryId,
    pub created_at: DateTime<Utc>,
    pub kind: EntryKind,
    pub direction: Direction,
    pub amount: Money,
    pub balance_before: Money,
    pub balance_after: Money,
    /// Post-balance stamped on the entry for this account, when recorded
    pub recorded_balance: Option<Money>,
    pub description: String,
}

impl StatementLine {
    /// Whether the replayed balance matches the stamped one
    ///
    /// Lines without a stamp are trusted.
    pub fn is_reconciled(&self) -> bool {
        self.recorded_balance
            .map_or(true, |recorded| recorded == self.balance_after)
    }
}

/// Balance trail of one account over a time range
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    pub account: AccountId,
    pub account_number: Option<AccountNumber>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// Balance before the first line of the range
    pub opening_balance: Money,
    /// Balance after the last line of the range
    pub closing_balance: Money,
    pub lines: Vec<StatementLine>,
}

impl Statement {
    /// True when every replayed line agrees with the ledger's stamps
    pub fn is_reconciled(&self) -> bool {
        self.lines.iter().all(StatementLine::is_reconciled)
    }
}
