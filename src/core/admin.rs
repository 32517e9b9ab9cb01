//! Audited administrative override
//!
//! Administrators can correct an account's balance, KYC status or overdraft
//! limit directly. Such edits bypass the movement engine and never write a
//! ledger entry, so each one is recorded in the [`AuditLog`] with the
//! account state before and after the change.
//!
//! A balance override breaks the link between the account and its ledger
//! history; statements covering the period show it as unreconciled lines.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::clock::Clock;
use super::locks::AccountLocks;
use super::traits::AccountStore;
use crate::types::{Account, AccountId, AccountRef, BankError, KycStatus, Money, Principal, UserId};

/// Fields an administrator may overwrite; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountPatch {
    pub balance: Option<Money>,
    pub status: Option<KycStatus>,
    pub overdraft_limit: Option<Money>,
}

impl AccountPatch {
    pub fn is_empty(&self) -> bool {
        self.balance.is_none() && self.status.is_none() && self.overdraft_limit.is_none()
    }

    /// Apply the patch to a copy of `account`
    pub fn apply_to(&self, account: &Account) -> Result<Account, BankError> {
        let mut patched = account.clone();

        if let Some(balance) = self.balance {
            if balance < Money::ZERO {
                return Err(BankError::invalid_amount(balance, "balance cannot be negative"));
            }
            patched.balance = balance;
        }
        if let Some(status) = self.status {
            // Numbers are only handed out by KYC review
            if status.is_approved() && patched.number.is_none() {
                return Err(BankError::parse_error(
                    None,
                    format!(
                        "Account {} has no number; approve it through KYC review",
                        patched.display_ref()
                    ),
                ));
            }
            patched.status = status;
        }
        if let Some(limit) = self.overdraft_limit {
            if limit < Money::ZERO {
                return Err(BankError::invalid_amount(limit, "overdraft limit cannot be negative"));
            }
            patched.overdraft_limit = limit;
        }
        Ok(patched)
    }
}

/// One administrative edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub actor: UserId,
    pub account: AccountId,
    pub before: Account,
    pub after: Account,
    pub reason: String,
    pub at: DateTime<Utc>,
}

/// Append-only log of administrative edits
#[derive(Debug, Default)]
pub struct AuditLog {
    records: RwLock<Vec<AuditRecord>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, record: AuditRecord) {
        self.records.write().await.push(record);
    }

    pub async fn records(&self) -> Vec<AuditRecord> {
        self.records.read().await.clone()
    }
}

/// Administrative write path for account fields
#[derive(Clone)]
pub struct AdminOverride {
    accounts: Arc<dyn AccountStore>,
    locks: Arc<AccountLocks>,
    audit: Arc<AuditLog>,
    clock: Arc<dyn Clock>,
    lock_timeout: Duration,
}

impl AdminOverride {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        locks: Arc<AccountLocks>,
        audit: Arc<AuditLog>,
        clock: Arc<dyn Clock>,
        lock_timeout: Duration,
    ) -> Self {
        Self {
            accounts,
            locks,
            audit,
            clock,
            lock_timeout,
        }
    }

    /// Overwrite account fields and record the edit
    ///
    /// Takes the account lock, so the edit never interleaves with a
    /// movement on the same account.
    ///
    /// # Returns
    ///
    /// * `Ok(Account)` - The account after the edit
    /// * `Err(BankError::Forbidden)` - If the principal is not an administrator
    /// * `Err(BankError::AccountNotFound)` - If the account does not resolve
    /// * `Err(BankError::InvalidAmount)` - If a patched amount is negative
    /// * `Err(BankError::ParseError)` - If the patch changes nothing, or
    ///   approves an account that has no number yet
    pub async fn apply(
        &self,
        principal: &Principal,
        account: &AccountRef,
        patch: AccountPatch,
        reason: impl Into<String>,
    ) -> Result<Account, BankError> {
        principal.require_admin("override account")?;
        if patch.is_empty() {
            return Err(BankError::parse_error(None, "Account override changes nothing"));
        }

        let target = self.accounts.resolve(account).await?;
        let _guards = self
            .locks
            .acquire(&[target.id], self.lock_timeout, "override account")
            .await?;

        let before = self.accounts.load(target.id).await?;
        let after = patch.apply_to(&before)?;
        self.accounts.put(after.clone()).await?;

        let reason = reason.into();
        tracing::warn!(
            account = %after.display_ref(),
            actor = %principal.user,
            before = %before.balance,
            after = %after.balance,
            %reason,
            "Administrative override applied"
        );
        self.audit
            .record(AuditRecord {
                id: Uuid::now_v7(),
                actor: principal.user.clone(),
                account: after.id,
                before,
                after: after.clone(),
                reason,
                at: self.clock.now(),
            })
            .await;

        Ok(after)
    }
}
