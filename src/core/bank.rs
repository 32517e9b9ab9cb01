//! Wiring of the ledger subsystem
//!
//! [`Bank`] owns one account store, one ledger and one lock registry and
//! hands out the components that work on them: the account directory, the
//! movement engine, the statement reconstructor and the admin override. All
//! of them share the same locks, so a KYC review or an override never
//! interleaves with a movement on the same account.

use std::sync::Arc;

use super::account_store::InMemoryAccountStore;
use super::admin::{AdminOverride, AuditLog};
use super::clock::{Clock, SystemClock};
use super::directory::AccountDirectory;
use super::engine::{
    MovementEngine, MovementReceipt, MovementRequest, TransferReceipt, TransferRequest,
};
use super::ledger_store::InMemoryLedgerStore;
use super::locks::AccountLocks;
use super::notifier::{Notifier, TracingNotifier};
use super::statement::StatementReconstructor;
use super::traits::{AccountStore, LedgerStore};
use crate::config::EngineConfig;
use crate::types::BankError;

/// One money movement, as read from an operations feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Deposit(MovementRequest),
    Withdraw(MovementRequest),
    Transfer(TransferRequest),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Deposit(_) => "deposit",
            Operation::Withdraw(_) => "withdraw",
            Operation::Transfer(_) => "transfer",
        }
    }
}

/// Result of an applied [`Operation`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Movement(MovementReceipt),
    Transfer(TransferReceipt),
}

/// The assembled ledger subsystem
#[derive(Clone)]
pub struct Bank {
    ledger: Arc<dyn LedgerStore>,
    directory: AccountDirectory,
    engine: MovementEngine,
    statements: StatementReconstructor,
    admin: AdminOverride,
    audit: Arc<AuditLog>,
}

impl Bank {
    /// In-memory bank with default settings
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> BankBuilder {
        BankBuilder::default()
    }

    pub fn directory(&self) -> &AccountDirectory {
        &self.directory
    }

    pub fn engine(&self) -> &MovementEngine {
        &self.engine
    }

    pub fn statements(&self) -> &StatementReconstructor {
        &self.statements
    }

    pub fn admin(&self) -> &AdminOverride {
        &self.admin
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    pub fn ledger(&self) -> &Arc<dyn LedgerStore> {
        &self.ledger
    }

    /// Route an operation to the engine
    pub async fn apply(&self, operation: Operation) -> Result<Outcome, BankError> {
        match operation {
            Operation::Deposit(request) => self.engine.deposit(request).await.map(Outcome::Movement),
            Operation::Withdraw(request) => {
                self.engine.withdraw(request).await.map(Outcome::Movement)
            }
            Operation::Transfer(request) => {
                self.engine.transfer(request).await.map(Outcome::Transfer)
            }
        }
    }
}

impl Default for Bank {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`Bank`]
///
/// Every collaborator left unset falls back to its in-memory or default
/// implementation.
#[derive(Default)]
pub struct BankBuilder {
    accounts: Option<Arc<dyn AccountStore>>,
    ledger: Option<Arc<dyn LedgerStore>>,
    notifier: Option<Arc<dyn Notifier>>,
    clock: Option<Arc<dyn Clock>>,
    config: EngineConfig,
}

impl BankBuilder {
    pub fn accounts(mut self, accounts: Arc<dyn AccountStore>) -> Self {
        self.accounts = Some(accounts);
        self
    }

    pub fn ledger(mut self, ledger: Arc<dyn LedgerStore>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Bank {
        let accounts = self
            .accounts
            .unwrap_or_else(|| Arc::new(InMemoryAccountStore::new()));
        let ledger = self
            .ledger
            .unwrap_or_else(|| Arc::new(InMemoryLedgerStore::new()));
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let locks = Arc::new(AccountLocks::new());
        let audit = Arc::new(AuditLog::new());

        let engine = MovementEngine::new(Arc::clone(&accounts), Arc::clone(&ledger))
            .with_locks(Arc::clone(&locks))
            .with_notifier(notifier)
            .with_clock(Arc::clone(&clock))
            .with_config(self.config.clone());
        let directory =
            AccountDirectory::new(Arc::clone(&accounts), Arc::clone(&locks), &self.config);
        let statements = StatementReconstructor::new(Arc::clone(&accounts), Arc::clone(&ledger));
        let admin = AdminOverride::new(
            accounts,
            locks,
            Arc::clone(&audit),
            clock,
            self.config.lock_timeout,
        );

        Bank {
            ledger,
            directory,
            engine,
            statements,
            admin,
            audit,
        }
    }
}
