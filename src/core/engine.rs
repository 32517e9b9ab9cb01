//! Money-movement orchestration
//!
//! This module provides the `MovementEngine` struct, which runs deposits,
//! withdrawals and transfers as atomic units over an [`AccountStore`] and a
//! [`LedgerStore`].
//!
//! # Design
//!
//! Every operation follows the same shape:
//!
//! 1. Validate the request (amount, account references)
//! 2. Spawn the unit on its own task
//! 3. Inside the unit: lock the accounts in ascending id order, reload them,
//!    check KYC and funds, write balances, append the ledger entry
//! 4. After commit, hand a [`MovementEvent`] to the notifier
//!
//! Running the unit on a spawned task means it is driven to completion even
//! if the caller's future is dropped, so a unit is never left half-applied.
//!
//! # Architecture
//!
//! ```text
//! MovementEngine
//!     ├── Arc<dyn AccountStore>  (mutable balances)
//!     ├── Arc<dyn LedgerStore>   (append-only history)
//!     ├── Arc<AccountLocks>      (per-account mutexes)
//!     ├── Arc<dyn Notifier>      (post-commit events)
//!     └── Arc<dyn Clock>         (entry timestamps)
//! ```
//!
//! # Thread Safety
//!
//! The engine is cheap to clone and every clone shares the same stores and
//! locks. Concurrent operations on different accounts proceed in parallel;
//! operations touching the same account are serialized by its lock.

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

use super::clock::{Clock, SystemClock};
use super::locks::{AccountGuards, AccountLocks};
use super::notifier::{dispatch, MovementEvent, Notifier, TracingNotifier};
use super::traits::{AccountStore, LedgerStore};
use super::unit::AtomicUnit;
use crate::config::EngineConfig;
use crate::types::{Account, AccountId, AccountRef, BankError, LedgerEntry, Money};

/// Request to move money into or out of one account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementRequest {
    pub account: AccountRef,
    pub amount: Money,
    /// Free text for the ledger; a default is generated when absent
    pub description: Option<String>,
}

pub type DepositRequest = MovementRequest;
pub type WithdrawRequest = MovementRequest;

impl MovementRequest {
    pub fn new(account: impl Into<AccountRef>, amount: Money) -> Self {
        Self {
            account: account.into(),
            amount,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Request to move money between two accounts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub from: AccountRef,
    pub to: AccountRef,
    pub amount: Money,
    pub description: Option<String>,
}

impl TransferRequest {
    pub fn new(from: impl Into<AccountRef>, to: impl Into<AccountRef>, amount: Money) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            amount,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Result of a committed deposit or withdrawal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovementReceipt {
    pub entry: LedgerEntry,
    /// Balance of the account after the movement
    pub balance: Money,
}

/// Result of a committed transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    pub entry: LedgerEntry,
    pub from_balance: Money,
    pub to_balance: Money,
}

/// Money-movement orchestrator
///
/// `MovementEngine` validates requests and runs each one as an atomic unit.
/// It can be cloned and shared across tasks.
#[derive(Clone)]
pub struct MovementEngine {
    accounts: Arc<dyn AccountStore>,
    ledger: Arc<dyn LedgerStore>,
    locks: Arc<AccountLocks>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl MovementEngine {
    /// Create a new MovementEngine
    ///
    /// Uses a fresh lock registry, the tracing notifier, the system clock
    /// and the default configuration. Use the `with_*` methods to replace
    /// any of them.
    ///
    /// # Arguments
    ///
    /// * `accounts` - Store holding current account state
    /// * `ledger` - Append-only ledger the engine writes entries to
    pub fn new(accounts: Arc<dyn AccountStore>, ledger: Arc<dyn LedgerStore>) -> Self {
        Self {
            accounts,
            ledger,
            locks: Arc::new(AccountLocks::new()),
            notifier: Arc::new(TracingNotifier),
            clock: Arc::new(SystemClock),
            config: EngineConfig::default(),
        }
    }

    /// Share a lock registry with other components that write accounts
    pub fn with_locks(mut self, locks: Arc<AccountLocks>) -> Self {
        self.locks = locks;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Process a deposit
    ///
    /// # Returns
    ///
    /// * `Ok(MovementReceipt)` - The committed entry and the new balance
    /// * `Err(BankError::InvalidAmount)` - If the amount is not positive
    /// * `Err(BankError::AccountNotFound)` - If the account does not resolve
    /// * `Err(BankError::KycNotApproved)` - If the account is not approved
    /// * `Err(BankError::ArithmeticOverflow)` - If the balance would overflow
    pub async fn deposit(&self, request: DepositRequest) -> Result<MovementReceipt, BankError> {
        ensure_positive(request.amount)?;
        let account = self.accounts.resolve(&request.account).await?;
        account.ensure_approved()?;
        let account = account.id;

        let receipt = self
            .run_unit("deposit", move |engine| {
                engine.deposit_unit(account, request.amount, request.description.clone())
            })
            .await?;

        dispatch(
            Arc::clone(&self.notifier),
            MovementEvent::Deposited {
                entry: receipt.entry.id,
                account,
                amount: receipt.entry.amount,
                balance: receipt.balance,
            },
        );
        Ok(receipt)
    }

    /// Process a withdrawal
    ///
    /// # Returns
    ///
    /// * `Ok(MovementReceipt)` - The committed entry and the new balance
    /// * `Err(BankError::InvalidAmount)` - If the amount is not positive
    /// * `Err(BankError::AccountNotFound)` - If the account does not resolve
    /// * `Err(BankError::KycNotApproved)` - If the account is not approved
    /// * `Err(BankError::InsufficientFunds)` - If the balance is below the amount
    pub async fn withdraw(&self, request: WithdrawRequest) -> Result<MovementReceipt, BankError> {
        ensure_positive(request.amount)?;
        let account = self.accounts.resolve(&request.account).await?;
        account.ensure_approved()?;
        let account = account.id;

        let receipt = self
            .run_unit("withdraw", move |engine| {
                engine.withdraw_unit(account, request.amount, request.description.clone())
            })
            .await?;

        dispatch(
            Arc::clone(&self.notifier),
            MovementEvent::Withdrawn {
                entry: receipt.entry.id,
                account,
                amount: receipt.entry.amount,
                balance: receipt.balance,
            },
        );
        Ok(receipt)
    }

    /// Process a transfer between two accounts
    ///
    /// Both accounts are locked in ascending id order and a single ledger
    /// entry records the movement.
    ///
    /// # Returns
    ///
    /// * `Ok(TransferReceipt)` - The committed entry and both new balances
    /// * `Err(BankError::InvalidAmount)` - If the amount is not positive
    /// * `Err(BankError::AccountNotFound)` - If either account does not resolve
    /// * `Err(BankError::SameAccountTransfer)` - If both sides are the same account
    /// * `Err(BankError::KycNotApproved)` - If either account is not approved
    /// * `Err(BankError::InsufficientFunds)` - If the source balance is below the amount
    pub async fn transfer(&self, request: TransferRequest) -> Result<TransferReceipt, BankError> {
        ensure_positive(request.amount)?;
        let from = self.accounts.resolve(&request.from).await?;
        let to = self.accounts.resolve(&request.to).await?;
        if from.id == to.id {
            return Err(BankError::same_account_transfer(from.display_ref()));
        }
        from.ensure_approved()?;
        to.ensure_approved()?;
        let (from, to) = (from.id, to.id);

        let receipt = self
            .run_unit("transfer", move |engine| {
                engine.transfer_unit(from, to, request.amount, request.description.clone())
            })
            .await?;

        dispatch(
            Arc::clone(&self.notifier),
            MovementEvent::Transferred {
                entry: receipt.entry.id,
                from,
                to,
                amount: receipt.entry.amount,
                from_balance: receipt.from_balance,
                to_balance: receipt.to_balance,
            },
        );
        Ok(receipt)
    }

    /// Run a unit on its own task, retrying lock conflicts
    ///
    /// Only `Conflict` is retried, at most `max_conflict_retries` times with
    /// a linearly growing pause. A unit that panics is reported as an
    /// `AtomicityFailure`.
    async fn run_unit<T, F, Fut>(&self, operation: &'static str, unit: F) -> Result<T, BankError>
    where
        T: Send + 'static,
        F: Fn(MovementEngine) -> Fut,
        Fut: Future<Output = Result<T, BankError>> + Send + 'static,
    {
        let mut attempt: u32 = 0;
        loop {
            let result = match tokio::spawn(unit(self.clone())).await {
                Ok(result) => result,
                Err(join_error) => Err(BankError::atomicity_failure(operation, join_error)),
            };

            match result {
                Err(error)
                    if error.is_retryable() && attempt < self.config.max_conflict_retries =>
                {
                    attempt += 1;
                    tracing::debug!(operation, attempt, %error, "Retrying unit after conflict");
                    tokio::time::sleep(self.config.retry_backoff * attempt).await;
                }
                Err(error) => {
                    tracing::debug!(operation, %error, "Unit rejected");
                    return Err(error);
                }
                Ok(value) => return Ok(value),
            }
        }
    }

    /// Lock the accounts and reload their current state
    async fn lock_and_load(
        &self,
        ids: &[AccountId],
        operation: &'static str,
    ) -> Result<(AccountGuards, Vec<Account>), BankError> {
        let guards = self
            .locks
            .acquire(ids, self.config.lock_timeout, operation)
            .await?;

        let mut accounts = Vec::with_capacity(ids.len());
        for &id in ids {
            let account = self.accounts.load(id).await?;
            // Status may have changed since the request was validated
            account.ensure_approved()?;
            accounts.push(account);
        }
        Ok((guards, accounts))
    }

    async fn deposit_unit(
        self,
        account: AccountId,
        amount: Money,
        description: Option<String>,
    ) -> Result<MovementReceipt, BankError> {
        let (_guards, mut loaded) = self.lock_and_load(&[account], "deposit").await?;
        let account = loaded.remove(0);

        let balance = account
            .balance
            .checked_add(amount)
            .ok_or_else(|| BankError::arithmetic_overflow("deposit", account.display_ref()))?;
        let entry = LedgerEntry::deposit(&account, amount, balance, description, self.clock.now());

        let mut unit = AtomicUnit::begin("deposit", Arc::clone(&self.accounts));
        unit.set_balance(&account, balance).await?;
        let entry = unit.commit(self.ledger.as_ref(), entry).await?;

        tracing::debug!(account = %account.display_ref(), %amount, %balance, "Deposit applied");
        Ok(MovementReceipt { entry, balance })
    }

    async fn withdraw_unit(
        self,
        account: AccountId,
        amount: Money,
        description: Option<String>,
    ) -> Result<MovementReceipt, BankError> {
        let (_guards, mut loaded) = self.lock_and_load(&[account], "withdraw").await?;
        let account = loaded.remove(0);

        if account.balance < amount {
            return Err(BankError::insufficient_funds(
                account.display_ref(),
                account.balance,
                amount,
            ));
        }
        let balance = account
            .balance
            .checked_sub(amount)
            .ok_or_else(|| BankError::arithmetic_overflow("withdraw", account.display_ref()))?;
        let entry =
            LedgerEntry::withdrawal(&account, amount, balance, description, self.clock.now());

        let mut unit = AtomicUnit::begin("withdraw", Arc::clone(&self.accounts));
        unit.set_balance(&account, balance).await?;
        let entry = unit.commit(self.ledger.as_ref(), entry).await?;

        tracing::debug!(account = %account.display_ref(), %amount, %balance, "Withdrawal applied");
        Ok(MovementReceipt { entry, balance })
    }

    async fn transfer_unit(
        self,
        from: AccountId,
        to: AccountId,
        amount: Money,
        description: Option<String>,
    ) -> Result<TransferReceipt, BankError> {
        let (_guards, loaded) = self.lock_and_load(&[from, to], "transfer").await?;
        let [source, destination]: [Account; 2] = loaded
            .try_into()
            .map_err(|_| BankError::atomicity_failure("transfer", "expected two accounts"))?;

        if source.balance < amount {
            return Err(BankError::insufficient_funds(
                source.display_ref(),
                source.balance,
                amount,
            ));
        }
        let from_balance = source
            .balance
            .checked_sub(amount)
            .ok_or_else(|| BankError::arithmetic_overflow("transfer", source.display_ref()))?;
        let to_balance = destination
            .balance
            .checked_add(amount)
            .ok_or_else(|| BankError::arithmetic_overflow("transfer", destination.display_ref()))?;
        let entry = LedgerEntry::transfer(
            &source,
            &destination,
            amount,
            from_balance,
            to_balance,
            description,
            self.clock.now(),
        );

        let mut unit = AtomicUnit::begin("transfer", Arc::clone(&self.accounts));
        unit.set_balance(&source, from_balance).await?;
        unit.set_balance(&destination, to_balance).await?;
        let entry = unit.commit(self.ledger.as_ref(), entry).await?;

        tracing::debug!(
            from = %source.display_ref(),
            to = %destination.display_ref(),
            %amount,
            "Transfer applied"
        );
        Ok(TransferReceipt {
            entry,
            from_balance,
            to_balance,
        })
    }
}

fn ensure_positive(amount: Money) -> Result<(), BankError> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(BankError::invalid_amount(amount, "must be greater than zero"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::account_store::InMemoryAccountStore;
    use crate::core::ledger_store::InMemoryLedgerStore;
    use crate::types::{AccountNumber, EntryKind, KycStatus, UserId};
    use rstest::rstest;
    use std::time::Duration;

    struct Fixture {
        engine: MovementEngine,
        accounts: Arc<InMemoryAccountStore>,
        ledger: Arc<InMemoryLedgerStore>,
    }

    impl Fixture {
        fn new() -> Self {
            let accounts = Arc::new(InMemoryAccountStore::new());
            let ledger = Arc::new(InMemoryLedgerStore::new());
            let engine = MovementEngine::new(accounts.clone(), ledger.clone());
            Self {
                engine,
                accounts,
                ledger,
            }
        }

        async fn open(&self, number: &str, balance: i64) -> Account {
            let account = Account::approved(
                AccountNumber::new(number),
                UserId::new(format!("owner-{}", number)),
                number,
                Money::from_minor(balance),
            );
            self.accounts.insert(account.clone()).await.unwrap();
            account
        }

        async fn balance(&self, account: &Account) -> Money {
            self.accounts.load(account.id).await.unwrap().balance
        }
    }

    #[tokio::test]
    async fn test_deposit_updates_balance_and_ledger() {
        let fx = Fixture::new();
        let account = fx.open("BANK1", 1_000).await;

        let receipt = fx
            .engine
            .deposit(MovementRequest::new(account.id, Money::from_minor(500)))
            .await
            .unwrap();

        assert_eq!(receipt.balance, Money::from_minor(1_500));
        assert_eq!(receipt.entry.post_balance, Money::from_minor(1_500));
        assert_eq!(receipt.entry.kind, EntryKind::Deposit);
        assert_eq!(receipt.entry.description, "Deposit to account BANK1");
        assert_eq!(fx.balance(&account).await, Money::from_minor(1_500));
        assert_eq!(fx.ledger.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_deposit_by_owner_reference() {
        let fx = Fixture::new();
        let account = fx.open("BANK1", 0).await;

        let receipt = fx
            .engine
            .deposit(
                MovementRequest::new(AccountRef::Owner(account.owner.clone()), Money::from_minor(1))
                    .with_description("salary"),
            )
            .await
            .unwrap();

        assert_eq!(receipt.entry.description, "salary");
        assert_eq!(receipt.entry.destination, Some(account.id));
    }

    #[rstest]
    #[case::zero(0)]
    #[case::negative(-100)]
    #[tokio::test]
    async fn test_non_positive_amounts_are_rejected(#[case] minor: i64) {
        let fx = Fixture::new();
        let account = fx.open("BANK1", 1_000).await;
        let amount = Money::from_minor(minor);

        let deposit = fx
            .engine
            .deposit(MovementRequest::new(account.id, amount))
            .await;
        let withdraw = fx
            .engine
            .withdraw(MovementRequest::new(account.id, amount))
            .await;

        assert!(matches!(deposit, Err(BankError::InvalidAmount { .. })));
        assert!(matches!(withdraw, Err(BankError::InvalidAmount { .. })));
        assert_eq!(fx.ledger.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_withdraw_insufficient_funds_leaves_no_trace() {
        let fx = Fixture::new();
        let account = fx.open("BANK1", 100).await;

        let result = fx
            .engine
            .withdraw(MovementRequest::new(account.id, Money::from_minor(500)))
            .await;

        assert_eq!(
            result.unwrap_err(),
            BankError::insufficient_funds("BANK1", Money::from_minor(100), Money::from_minor(500))
        );
        assert_eq!(fx.balance(&account).await, Money::from_minor(100));
        assert_eq!(fx.ledger.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_withdraw_entire_balance() {
        let fx = Fixture::new();
        let account = fx.open("BANK1", 100).await;

        let receipt = fx
            .engine
            .withdraw(MovementRequest::new(account.id, Money::from_minor(100)))
            .await
            .unwrap();

        assert_eq!(receipt.balance, Money::ZERO);
        assert_eq!(receipt.entry.description, "Withdrawal from account BANK1");
    }

    #[tokio::test]
    async fn test_transfer_moves_funds_with_one_entry() {
        let fx = Fixture::new();
        let a = fx.open("BANK1", 1_000).await;
        let b = fx.open("BANK2", 1_000).await;

        let receipt = fx
            .engine
            .transfer(TransferRequest::new(
                AccountRef::number("BANK1"),
                AccountRef::number("BANK2"),
                Money::from_minor(300),
            ))
            .await
            .unwrap();

        assert_eq!(receipt.from_balance, Money::from_minor(700));
        assert_eq!(receipt.to_balance, Money::from_minor(1_300));
        assert_eq!(receipt.entry.post_balance, Money::from_minor(700));
        assert_eq!(
            receipt.entry.counterparty_post_balance,
            Some(Money::from_minor(1_300))
        );
        assert_eq!(receipt.entry.description, "Transfer from BANK1 to BANK2");
        assert_eq!(fx.balance(&a).await, Money::from_minor(700));
        assert_eq!(fx.balance(&b).await, Money::from_minor(1_300));
        assert_eq!(fx.ledger.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_transfer_to_same_account_is_rejected() {
        let fx = Fixture::new();
        let a = fx.open("BANK1", 1_000).await;

        let result = fx
            .engine
            .transfer(TransferRequest::new(
                a.id,
                AccountRef::number("BANK1"),
                Money::from_minor(1),
            ))
            .await;

        assert!(matches!(result, Err(BankError::SameAccountTransfer { .. })));
        assert_eq!(fx.ledger.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_account_is_not_found() {
        let fx = Fixture::new();
        fx.open("BANK1", 1_000).await;

        let result = fx
            .engine
            .transfer(TransferRequest::new(
                AccountRef::number("BANK1"),
                AccountRef::number("BANK9"),
                Money::from_minor(1),
            ))
            .await;

        assert_eq!(result.unwrap_err(), BankError::account_not_found("BANK9"));
    }

    #[tokio::test]
    async fn test_pending_account_cannot_move_money() {
        let fx = Fixture::new();
        let pending = Account::pending(UserId::new("u1"), "Pat", Money::from_minor(1_000));
        fx.accounts.insert(pending.clone()).await.unwrap();

        let result = fx
            .engine
            .deposit(MovementRequest::new(pending.id, Money::from_minor(1)))
            .await;

        assert_eq!(
            result.unwrap_err(),
            BankError::kyc_not_approved(pending.id, KycStatus::Pending)
        );
    }

    #[tokio::test]
    async fn test_deposit_overflow_is_rejected() {
        let fx = Fixture::new();
        let account = fx.open("BANK1", i64::MAX).await;

        let result = fx
            .engine
            .deposit(MovementRequest::new(account.id, Money::from_minor(1)))
            .await;

        assert!(matches!(result, Err(BankError::ArithmeticOverflow { .. })));
        assert_eq!(fx.balance(&account).await, Money::from_minor(i64::MAX));
    }

    #[tokio::test]
    async fn test_held_lock_surfaces_conflict_after_retries() {
        let fx = Fixture::new();
        let locks = Arc::new(AccountLocks::new());
        let engine = fx
            .engine
            .clone()
            .with_locks(locks.clone())
            .with_config(EngineConfig {
                lock_timeout: Duration::from_millis(10),
                max_conflict_retries: 1,
                retry_backoff: Duration::from_millis(1),
                ..EngineConfig::default()
            });
        let account = fx.open("BANK1", 1_000).await;

        let _held = locks
            .acquire(&[account.id], Duration::from_secs(1), "test")
            .await
            .unwrap();
        let result = engine
            .deposit(MovementRequest::new(account.id, Money::from_minor(1)))
            .await;

        assert!(matches!(result, Err(BankError::Conflict { .. })));
        assert_eq!(fx.balance(&account).await, Money::from_minor(1_000));
    }

    #[tokio::test]
    async fn test_conflict_retry_succeeds_once_lock_is_released() {
        let fx = Fixture::new();
        let locks = Arc::new(AccountLocks::new());
        let engine = fx
            .engine
            .clone()
            .with_locks(locks.clone())
            .with_config(EngineConfig {
                lock_timeout: Duration::from_millis(20),
                max_conflict_retries: 5,
                retry_backoff: Duration::from_millis(20),
                ..EngineConfig::default()
            });
        let account = fx.open("BANK1", 1_000).await;

        let held = locks
            .acquire(&[account.id], Duration::from_secs(1), "test")
            .await
            .unwrap();
        let release = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            drop(held);
        });

        let receipt = engine
            .deposit(MovementRequest::new(account.id, Money::from_minor(1)))
            .await
            .unwrap();
        release.await.unwrap();

        assert_eq!(receipt.balance, Money::from_minor(1_001));
    }

    // Concurrent access tests
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_opposite_transfers_conserve_money() {
        let fx = Fixture::new();
        let a = fx.open("BANK1", 10_000).await;
        let b = fx.open("BANK2", 10_000).await;
        let mut handles = vec![];

        for i in 0..50 {
            let engine = fx.engine.clone();
            let (from, to) = if i % 2 == 0 { (a.id, b.id) } else { (b.id, a.id) };
            handles.push(tokio::spawn(async move {
                engine
                    .transfer(TransferRequest::new(from, to, Money::from_minor(10)))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let total = fx.balance(&a).await.minor() + fx.balance(&b).await.minor();
        assert_eq!(total, 20_000);
        assert_eq!(fx.balance(&a).await, Money::from_minor(10_000));
        assert_eq!(fx.ledger.len().await.unwrap(), 50);
    }
}
