//! Thread-safe in-memory account store
//!
//! This module provides the `InMemoryAccountStore` struct, which keeps account
//! state in concurrent maps so that many request tasks can read and write
//! accounts at once.
//!
//! # Design
//!
//! Accounts live in a `DashMap` keyed by [`AccountId`], with two secondary
//! `DashMap` indexes for account numbers and owners. DashMap shards its
//! locking, so operations on different accounts do not block each other.
//!
//! # Consistency
//!
//! The store only guarantees that each individual call is atomic. Keeping a
//! read-modify-write of a balance consistent is the job of the engine's
//! per-account locks (see [`crate::core::locks`]).

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::traits::AccountStore;
use crate::types::{Account, AccountId, AccountNumber, BankError, Money, UserId};

/// Thread-safe account store backed by `DashMap`
///
/// # Thread Safety
///
/// All methods are safe to call from multiple tasks concurrently. The
/// internal maps ensure that:
/// - Concurrent reads of different accounts don't block each other
/// - Concurrent writes to different accounts don't block each other
/// - Writes to the same account are serialized
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    /// Account state by internal id
    accounts: DashMap<AccountId, Account>,

    /// Account number index
    by_number: DashMap<AccountNumber, AccountId>,

    /// Owner index (one account per user)
    by_owner: DashMap<UserId, AccountId>,
}

impl InMemoryAccountStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lookup(&self, id: Option<AccountId>) -> Option<Account> {
        id.and_then(|id| self.accounts.get(&id).map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn get(&self, id: AccountId) -> Result<Option<Account>, BankError> {
        Ok(self.lookup(Some(id)))
    }

    async fn find_by_number(&self, number: &AccountNumber) -> Result<Option<Account>, BankError> {
        let id = self.by_number.get(number).map(|entry| *entry.value());
        Ok(self.lookup(id))
    }

    async fn find_by_owner(&self, owner: &UserId) -> Result<Option<Account>, BankError> {
        let id = self.by_owner.get(owner).map(|entry| *entry.value());
        Ok(self.lookup(id))
    }

    /// Insert a new account
    ///
    /// The number is claimed before the owner, always in that order, so two
    /// concurrent inserts cannot deadlock on the index shards.
    async fn insert(&self, account: Account) -> Result<(), BankError> {
        let number_slot = match &account.number {
            Some(number) => match self.by_number.entry(number.clone()) {
                Entry::Occupied(_) => return Err(BankError::duplicate_account(number)),
                Entry::Vacant(slot) => Some(slot),
            },
            None => None,
        };

        match self.by_owner.entry(account.owner.clone()) {
            Entry::Occupied(_) => Err(BankError::duplicate_account(&account.owner)),
            Entry::Vacant(owner_slot) => {
                owner_slot.insert(account.id);
                if let Some(slot) = number_slot {
                    slot.insert(account.id);
                }
                self.accounts.insert(account.id, account);
                Ok(())
            }
        }
    }

    async fn put(&self, account: Account) -> Result<(), BankError> {
        let previous_number = match self.accounts.get(&account.id) {
            Some(existing) => existing.number.clone(),
            None => return Err(BankError::account_not_found(account.id)),
        };

        if previous_number != account.number {
            if let Some(number) = &account.number {
                match self.by_number.entry(number.clone()) {
                    Entry::Occupied(slot) if *slot.get() != account.id => {
                        return Err(BankError::duplicate_account(number));
                    }
                    Entry::Occupied(_) => {}
                    Entry::Vacant(slot) => {
                        slot.insert(account.id);
                    }
                }
            }
            if let Some(old) = previous_number {
                self.by_number.remove(&old);
            }
        }

        match self.accounts.get_mut(&account.id) {
            Some(mut entry) => {
                *entry.value_mut() = account;
                Ok(())
            }
            None => Err(BankError::account_not_found(account.id)),
        }
    }

    async fn set_balance(&self, id: AccountId, balance: Money) -> Result<(), BankError> {
        match self.accounts.get_mut(&id) {
            Some(mut entry) => {
                entry.value_mut().balance = balance;
                Ok(())
            }
            None => Err(BankError::account_not_found(id)),
        }
    }

    async fn all(&self) -> Result<Vec<Account>, BankError> {
        Ok(self
            .accounts
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountRef, KycStatus};
    use std::sync::Arc;

    fn approved(number: &str, balance: i64) -> Account {
        Account::approved(
            AccountNumber::new(number),
            UserId::new(format!("owner-{}", number)),
            number,
            Money::from_minor(balance),
        )
    }

    #[tokio::test]
    async fn test_insert_and_lookup_by_every_index() {
        let store = InMemoryAccountStore::new();
        let account = approved("BANK1", 100_000);
        store.insert(account.clone()).await.unwrap();

        assert_eq!(store.get(account.id).await.unwrap(), Some(account.clone()));
        assert_eq!(
            store
                .find_by_number(&AccountNumber::new("BANK1"))
                .await
                .unwrap(),
            Some(account.clone())
        );
        assert_eq!(
            store.find_by_owner(&account.owner).await.unwrap(),
            Some(account.clone())
        );
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_owner_and_number() {
        let store = InMemoryAccountStore::new();
        let account = approved("BANK1", 0);
        store.insert(account.clone()).await.unwrap();

        let mut same_owner = approved("BANK2", 0);
        same_owner.owner = account.owner.clone();
        assert!(matches!(
            store.insert(same_owner).await,
            Err(BankError::DuplicateAccount { .. })
        ));

        let same_number = approved("BANK1", 0);
        assert!(matches!(
            store.insert(same_number).await,
            Err(BankError::DuplicateAccount { .. })
        ));

        assert_eq!(store.all().await.unwrap().len(), 1);
        assert!(store
            .find_by_number(&AccountNumber::new("BANK2"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_put_reindexes_new_number() {
        let store = InMemoryAccountStore::new();
        let mut account = Account::pending(UserId::new("u1"), "Alice", Money::ZERO);
        store.insert(account.clone()).await.unwrap();

        account.number = Some(AccountNumber::new("BANK7"));
        account.status = KycStatus::Approved;
        store.put(account.clone()).await.unwrap();

        let found = store.resolve(&AccountRef::number("BANK7")).await.unwrap();
        assert_eq!(found.id, account.id);
        assert_eq!(found.status, KycStatus::Approved);
    }

    #[tokio::test]
    async fn test_put_and_set_balance_require_existing_account() {
        let store = InMemoryAccountStore::new();
        let account = approved("BANK1", 0);

        assert!(matches!(
            store.put(account.clone()).await,
            Err(BankError::AccountNotFound { .. })
        ));
        assert!(matches!(
            store.set_balance(account.id, Money::ZERO).await,
            Err(BankError::AccountNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_set_balance_only_touches_balance() {
        let store = InMemoryAccountStore::new();
        let account = approved("BANK1", 100_000);
        store.insert(account.clone()).await.unwrap();

        store
            .set_balance(account.id, Money::from_minor(42))
            .await
            .unwrap();

        let stored = store.load(account.id).await.unwrap();
        assert_eq!(stored.balance, Money::from_minor(42));
        assert_eq!(stored.opening_balance, Money::from_minor(100_000));
        assert_eq!(stored.status, KycStatus::Approved);
    }

    #[tokio::test]
    async fn test_resolve_unknown_reference() {
        let store = InMemoryAccountStore::new();

        let err = store
            .resolve(&AccountRef::number("BANK404"))
            .await
            .unwrap_err();
        assert_eq!(err, BankError::account_not_found("BANK404"));
    }

    // Concurrent access tests
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_for_same_owner_admit_one() {
        let store = Arc::new(InMemoryAccountStore::new());
        let mut handles = vec![];

        for i in 0..10 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let account = Account::pending(UserId::new("shared"), format!("holder {}", i), Money::ZERO);
                store.insert(account).await
            }));
        }

        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                inserted += 1;
            }
        }

        assert_eq!(inserted, 1);
        assert_eq!(store.all().await.unwrap().len(), 1);
    }
}
