//! All-or-nothing execution of one money movement
//!
//! An [`AtomicUnit`] records the balance of every account it writes before
//! writing it. The unit ends in exactly one of two ways:
//!
//! - the ledger append succeeds and the unit is committed, or
//! - any store step fails and every recorded balance is restored, newest
//!   first, before the error is returned as `AtomicityFailure`.
//!
//! Callers must hold the account locks for every account the unit touches.

use std::sync::Arc;

use super::traits::{AccountStore, LedgerStore};
use crate::types::{Account, AccountId, BankError, LedgerEntry, Money};

pub struct AtomicUnit {
    operation: &'static str,
    accounts: Arc<dyn AccountStore>,
    /// Balances as they were before this unit wrote them
    before_images: Vec<(AccountId, Money)>,
}

impl AtomicUnit {
    pub fn begin(operation: &'static str, accounts: Arc<dyn AccountStore>) -> Self {
        Self {
            operation,
            accounts,
            before_images: Vec::new(),
        }
    }

    /// Write a new balance for `account`, remembering its current one
    ///
    /// On failure the unit is rolled back and consumed.
    pub async fn set_balance(&mut self, account: &Account, balance: Money) -> Result<(), BankError> {
        self.before_images.push((account.id, account.balance));

        if let Err(error) = self.accounts.set_balance(account.id, balance).await {
            return Err(self.rollback(error).await);
        }
        Ok(())
    }

    /// Append the ledger entry that completes the unit
    pub async fn commit(
        mut self,
        ledger: &dyn LedgerStore,
        entry: LedgerEntry,
    ) -> Result<LedgerEntry, BankError> {
        match ledger.append(entry).await {
            Ok(entry) => {
                self.before_images.clear();
                Ok(entry)
            }
            Err(error) => Err(self.rollback(error).await),
        }
    }

    async fn rollback(&mut self, cause: BankError) -> BankError {
        tracing::warn!(
            operation = self.operation,
            error = %cause,
            accounts = self.before_images.len(),
            "Rolling back atomic unit"
        );

        let mut failed = Vec::new();
        while let Some((account, balance)) = self.before_images.pop() {
            if let Err(restore_error) = self.accounts.set_balance(account, balance).await {
                tracing::error!(
                    operation = self.operation,
                    %account,
                    %balance,
                    error = %restore_error,
                    "Failed to restore balance during rollback"
                );
                failed.push(format!("account {}: {}", account, restore_error));
            }
        }

        if !failed.is_empty() {
            return BankError::atomicity_failure(
                self.operation,
                format!("{}; rollback failed for {}", cause, failed.join(", ")),
            );
        }

        match cause {
            BankError::AtomicityFailure { .. } => cause,
            other => BankError::atomicity_failure(self.operation, other),
        }
    }
}
