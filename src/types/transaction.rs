//! Ledger entry types for the ledger engine
//!
//! A ledger entry is the immutable record of one committed financial event.
//! Entries are created exactly once, by the movement engine, and are never
//! updated or removed.

use super::account::Account;
use super::ids::{AccountId, EntryId};
use super::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of financial event recorded by an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Funds credited to one account from outside the bank
    Deposit,

    /// Funds debited from one account to outside the bank
    Withdrawal,

    /// Funds moved from one internal account to another
    ///
    /// A single entry represents both legs.
    Transfer,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Deposit => "deposit",
            EntryKind::Withdrawal => "withdrawal",
            EntryKind::Transfer => "transfer",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome stamped on an entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    #[default]
    Success,
    Failed,
}

/// Side of an entry as seen from one account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Credit,
    Debit,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Credit => f.write_str("credit"),
            Direction::Debit => f.write_str("debit"),
        }
    }
}

/// Immutable record of one committed financial event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Generated entry id
    pub id: EntryId,

    /// Position in the ledger, assigned by the store on append
    ///
    /// Breaks ties between entries carrying the same timestamp.
    pub sequence: u64,

    pub kind: EntryKind,

    /// Debited account (`None` for deposits)
    pub source: Option<AccountId>,

    /// Credited account (`None` for withdrawals)
    pub destination: Option<AccountId>,

    /// Amount moved, always positive
    pub amount: Money,

    pub description: String,

    pub status: EntryStatus,

    /// Post-transaction balance of the primarily affected account
    ///
    /// The destination for deposits, the source for withdrawals and
    /// transfers.
    pub post_balance: Money,

    /// Post-transaction balance of the credited side of a transfer
    pub counterparty_post_balance: Option<Money>,

    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Entry for a deposit into `destination`
    ///
    /// `destination` is the account state before the deposit.
    pub fn deposit(
        destination: &Account,
        amount: Money,
        post_balance: Money,
        description: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        LedgerEntry {
            id: EntryId::new(),
            sequence: 0,
            kind: EntryKind::Deposit,
            source: None,
            destination: Some(destination.id),
            amount,
            description: description
                .unwrap_or_else(|| format!("Deposit to account {}", destination.display_ref())),
            status: EntryStatus::Success,
            post_balance,
            counterparty_post_balance: None,
            created_at,
        }
    }

    /// Entry for a withdrawal from `source`
    pub fn withdrawal(
        source: &Account,
        amount: Money,
        post_balance: Money,
        description: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        LedgerEntry {
            id: EntryId::new(),
            sequence: 0,
            kind: EntryKind::Withdrawal,
            source: Some(source.id),
            destination: None,
            amount,
            description: description
                .unwrap_or_else(|| format!("Withdrawal from account {}", source.display_ref())),
            status: EntryStatus::Success,
            post_balance,
            counterparty_post_balance: None,
            created_at,
        }
    }

    /// Entry for a transfer from `source` to `destination`
    ///
    /// Both post-balances are stamped so either side's history can be
    /// seeded without replaying the other account.
    pub fn transfer(
        source: &Account,
        destination: &Account,
        amount: Money,
        source_post_balance: Money,
        destination_post_balance: Money,
        description: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        LedgerEntry {
            id: EntryId::new(),
            sequence: 0,
            kind: EntryKind::Transfer,
            source: Some(source.id),
            destination: Some(destination.id),
            amount,
            description: description.unwrap_or_else(|| {
                format!(
                    "Transfer from {} to {}",
                    source.display_ref(),
                    destination.display_ref()
                )
            }),
            status: EntryStatus::Success,
            post_balance: source_post_balance,
            counterparty_post_balance: Some(destination_post_balance),
            created_at,
        }
    }

    /// Whether the account appears as source or destination
    pub fn involves(&self, account: AccountId) -> bool {
        self.source == Some(account) || self.destination == Some(account)
    }

    /// Direction of this entry from the account's point of view
    pub fn direction_for(&self, account: AccountId) -> Option<Direction> {
        if self.source == Some(account) {
            Some(Direction::Debit)
        } else if self.destination == Some(account) {
            Some(Direction::Credit)
        } else {
            None
        }
    }

    /// Stamped post-transaction balance for the given account, if recorded
    pub fn post_balance_for(&self, account: AccountId) -> Option<Money> {
        match self.kind {
            EntryKind::Deposit if self.destination == Some(account) => Some(self.post_balance),
            EntryKind::Withdrawal if self.source == Some(account) => Some(self.post_balance),
            EntryKind::Transfer if self.source == Some(account) => Some(self.post_balance),
            EntryKind::Transfer if self.destination == Some(account) => {
                self.counterparty_post_balance
            }
            _ => None,
        }
    }
}
