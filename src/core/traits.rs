//! Store abstractions for accounts and the ledger
//!
//! The engine only talks to its durable state through these traits, so the
//! in-memory stores can be swapped for a database-backed implementation (or a
//! failure-injecting double in tests) without touching the movement logic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::{
    Account, AccountId, AccountNumber, AccountRef, BankError, EntryId, LedgerEntry, Money, UserId,
};

/// Mutable record of each account's current state
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Look up an account by internal id
    async fn get(&self, id: AccountId) -> Result<Option<Account>, BankError>;

    /// Look up an account by its account number
    async fn find_by_number(&self, number: &AccountNumber) -> Result<Option<Account>, BankError>;

    /// Look up the account owned by a user
    async fn find_by_owner(&self, owner: &UserId) -> Result<Option<Account>, BankError>;

    /// Add a new account
    ///
    /// Fails with `DuplicateAccount` if the owner or the number is taken.
    async fn insert(&self, account: Account) -> Result<(), BankError>;

    /// Replace an existing account, keeping the number index in sync
    async fn put(&self, account: Account) -> Result<(), BankError>;

    /// Overwrite only the balance of an existing account
    async fn set_balance(&self, id: AccountId, balance: Money) -> Result<(), BankError>;

    /// Snapshot of every account
    async fn all(&self) -> Result<Vec<Account>, BankError>;

    /// Resolve a caller-supplied reference, failing with `AccountNotFound`
    async fn resolve(&self, reference: &AccountRef) -> Result<Account, BankError> {
        let found = match reference {
            AccountRef::Id(id) => self.get(*id).await?,
            AccountRef::Number(number) => self.find_by_number(number).await?,
            AccountRef::Owner(owner) => self.find_by_owner(owner).await?,
        };
        found.ok_or_else(|| BankError::account_not_found(reference))
    }

    /// Load an account that is expected to exist
    async fn load(&self, id: AccountId) -> Result<Account, BankError> {
        self.get(id)
            .await?
            .ok_or_else(|| BankError::account_not_found(id))
    }
}

/// Entries relevant to one statement, read from a single consistent view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerView {
    /// Latest entry strictly before the start of the range
    pub seed: Option<LedgerEntry>,
    /// Entries inside the range, oldest first
    pub entries: Vec<LedgerEntry>,
}

/// Append-only record of financial events
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Append an entry, returning it with its assigned sequence number
    async fn append(&self, entry: LedgerEntry) -> Result<LedgerEntry, BankError>;

    /// Fetch one entry, failing with `EntryNotFound`
    async fn get(&self, id: EntryId) -> Result<LedgerEntry, BankError>;

    /// Every entry in which the account is source or destination, oldest first
    async fn history(&self, account: AccountId) -> Result<Vec<LedgerEntry>, BankError>;

    /// Seed entry plus in-range entries for one account
    ///
    /// `from` and `to` are inclusive; `None` leaves that side unbounded.
    async fn statement_view(
        &self,
        account: AccountId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<LedgerView, BankError>;

    /// Total number of entries
    async fn len(&self) -> Result<usize, BankError>;
}
