//! Account directory and KYC workflow
//!
//! Accounts are opened in the `Pending` state without an account number.
//! An administrator reviews the KYC submission; approval assigns the next
//! free `BANK########` number, rejection records the reason. Only approved
//! accounts can move money or produce statements.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::locks::AccountLocks;
use super::traits::AccountStore;
use crate::config::EngineConfig;
use crate::types::{
    Account, AccountId, AccountNumber, AccountRef, BankError, KycStatus, Money, Principal, UserId,
};

/// First serial handed out for generated account numbers
const FIRST_ACCOUNT_SERIAL: u64 = 10_000_000;

/// Outcome of a KYC review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum KycDecision {
    Approve,
    Reject { reason: String },
}

/// Lookup and lifecycle of customer accounts
#[derive(Clone)]
pub struct AccountDirectory {
    accounts: Arc<dyn AccountStore>,
    locks: Arc<AccountLocks>,
    opening_balance: Money,
    lock_timeout: Duration,
    next_serial: Arc<AtomicU64>,
}

impl AccountDirectory {
    /// Create a directory over an account store
    ///
    /// # Arguments
    ///
    /// * `accounts` - Store the directory reads and writes
    /// * `locks` - Lock registry shared with the movement engine
    /// * `config` - Supplies the opening balance and lock timeout
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        locks: Arc<AccountLocks>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            accounts,
            locks,
            opening_balance: config.opening_balance,
            lock_timeout: config.lock_timeout,
            next_serial: Arc::new(AtomicU64::new(FIRST_ACCOUNT_SERIAL)),
        }
    }

    /// Add an account that already exists elsewhere, such as a seeded one
    pub async fn register(&self, account: Account) -> Result<Account, BankError> {
        self.accounts.insert(account.clone()).await?;
        tracing::debug!(account = %account.display_ref(), status = %account.status, "Account registered");
        Ok(account)
    }

    /// Open a pending account for a user awaiting KYC review
    ///
    /// # Returns
    ///
    /// * `Ok(Account)` - The new pending account, credited with the opening balance
    /// * `Err(BankError::DuplicateAccount)` - If the user already has an account
    pub async fn submit_kyc(
        &self,
        owner: UserId,
        holder: impl Into<String>,
    ) -> Result<Account, BankError> {
        let account = Account::pending(owner, holder, self.opening_balance);
        self.accounts.insert(account.clone()).await?;

        tracing::info!(account = %account.id, owner = %account.owner, "KYC submitted");
        Ok(account)
    }

    /// Approve or reject a pending KYC submission
    ///
    /// Approval assigns an account number if the account has none yet.
    ///
    /// # Returns
    ///
    /// * `Ok(Account)` - The account after the review
    /// * `Err(BankError::Forbidden)` - If the principal is not an administrator
    /// * `Err(BankError::AccountNotFound)` - If the account does not exist
    /// * `Err(BankError::Conflict)` - If the account lock could not be taken in time
    pub async fn review_kyc(
        &self,
        principal: &Principal,
        account: AccountId,
        decision: KycDecision,
    ) -> Result<Account, BankError> {
        principal.require_admin("review KYC")?;

        let _guards = self
            .locks
            .acquire(&[account], self.lock_timeout, "review KYC")
            .await?;
        let mut account = self.accounts.load(account).await?;

        match decision {
            KycDecision::Approve => {
                if account.number.is_none() {
                    account.number = Some(self.allocate_number().await?);
                }
                account.status = KycStatus::Approved;
                account.rejection_reason = None;
            }
            KycDecision::Reject { reason } => {
                account.status = KycStatus::Rejected;
                account.rejection_reason = Some(reason);
            }
        }
        self.accounts.put(account.clone()).await?;

        tracing::info!(
            account = %account.display_ref(),
            status = %account.status,
            reviewer = %principal.user,
            "KYC reviewed"
        );
        Ok(account)
    }

    pub async fn resolve(&self, reference: &AccountRef) -> Result<Account, BankError> {
        self.accounts.resolve(reference).await
    }

    /// Every account, ordered by account number (pending accounts last)
    pub async fn list(&self) -> Result<Vec<Account>, BankError> {
        let mut accounts = self.accounts.all().await?;
        accounts.sort_by(|a, b| match (&a.number, &b.number) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.id.cmp(&b.id),
        });
        Ok(accounts)
    }

    /// Next generated number not already taken
    async fn allocate_number(&self) -> Result<AccountNumber, BankError> {
        loop {
            let number =
                AccountNumber::from_serial(self.next_serial.fetch_add(1, Ordering::Relaxed));
            if self.accounts.find_by_number(&number).await?.is_none() {
                return Ok(number);
            }
        }
    }
}
