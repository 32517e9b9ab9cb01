//! Per-account lock registry
//!
//! Serializes read-modify-write access to account balances. Each account gets
//! its own `tokio::sync::Mutex`, created on first use and kept in a `DashMap`.
//!
//! # Deadlock Avoidance
//!
//! [`AccountLocks::acquire`] always takes the locks of a unit in ascending
//! [`AccountId`] order, so two opposite-direction transfers between the same
//! pair of accounts wait on each other instead of deadlocking.
//!
//! # Registry Size
//!
//! Mutexes nobody holds or waits on are pruned once the registry grows past
//! its prune threshold, so it tracks recently contended accounts rather than
//! every account ever locked.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::types::{AccountId, BankError};

/// Registry size above which idle mutexes are pruned
pub const DEFAULT_PRUNE_THRESHOLD: usize = 1024;

/// Registry of per-account async mutexes
#[derive(Debug)]
pub struct AccountLocks {
    locks: DashMap<AccountId, Arc<Mutex<()>>>,
    prune_above: usize,
}

impl Default for AccountLocks {
    fn default() -> Self {
        Self::with_prune_threshold(DEFAULT_PRUNE_THRESHOLD)
    }
}

/// Locks held by one unit; released when dropped
#[derive(Debug)]
pub struct AccountGuards {
    accounts: Vec<AccountId>,
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl AccountGuards {
    /// Accounts covered by these guards, in acquisition order
    pub fn accounts(&self) -> &[AccountId] {
        &self.accounts
    }
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that prunes idle mutexes once it holds more than `prune_above`
    pub fn with_prune_threshold(prune_above: usize) -> Self {
        Self {
            locks: DashMap::new(),
            prune_above,
        }
    }

    /// Number of mutexes currently in the registry
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// Drop mutexes that no unit holds or waits on
    ///
    /// A mutex only the registry references has a strong count of one.
    /// Holders and waiters clone it under the shard lock, so a mutex in use
    /// is never removed.
    ///
    /// # Returns
    ///
    /// The number of mutexes removed
    pub fn prune_idle(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        let removed = before.saturating_sub(self.locks.len());
        if removed > 0 {
            tracing::debug!(removed, remaining = self.locks.len(), "Pruned idle account locks");
        }
        removed
    }

    fn lock_for(&self, account: AccountId) -> Arc<Mutex<()>> {
        Arc::clone(
            self.locks
                .entry(account)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }

    /// Lock every listed account, in ascending id order
    ///
    /// Duplicate ids are locked once. The whole acquisition shares a single
    /// deadline; if it passes, locks taken so far are released and a
    /// `Conflict` is returned.
    pub async fn acquire(
        &self,
        accounts: &[AccountId],
        timeout: Duration,
        operation: &str,
    ) -> Result<AccountGuards, BankError> {
        if self.locks.len() > self.prune_above {
            self.prune_idle();
        }

        let mut ordered = accounts.to_vec();
        ordered.sort();
        ordered.dedup();

        let deadline = tokio::time::Instant::now() + timeout;
        let mut guards = Vec::with_capacity(ordered.len());

        for &account in &ordered {
            let lock = self.lock_for(account);
            match tokio::time::timeout_at(deadline, lock.lock_owned()).await {
                Ok(guard) => guards.push(guard),
                Err(_) => {
                    tracing::debug!(%account, operation, "Timed out waiting for account lock");
                    return Err(BankError::conflict(
                        operation,
                        format!(
                            "timed out after {}ms waiting for account {}",
                            timeout.as_millis(),
                            account
                        ),
                    ));
                }
            }
        }

        Ok(AccountGuards {
            accounts: ordered,
            _guards: guards,
        })
    }
}
