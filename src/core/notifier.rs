//! Post-commit movement notifications
//!
//! After a unit commits, the engine publishes a [`MovementEvent`] to its
//! [`Notifier`]. Delivery happens on a detached task: a slow or failing
//! notifier never delays the caller and never affects the committed result.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::types::{AccountId, BankError, EntryId, Money};

/// A committed money movement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MovementEvent {
    Deposited {
        entry: EntryId,
        account: AccountId,
        amount: Money,
        balance: Money,
    },
    Withdrawn {
        entry: EntryId,
        account: AccountId,
        amount: Money,
        balance: Money,
    },
    Transferred {
        entry: EntryId,
        from: AccountId,
        to: AccountId,
        amount: Money,
        from_balance: Money,
        to_balance: Money,
    },
}

impl MovementEvent {
    pub fn entry(&self) -> EntryId {
        match self {
            MovementEvent::Deposited { entry, .. }
            | MovementEvent::Withdrawn { entry, .. }
            | MovementEvent::Transferred { entry, .. } => *entry,
        }
    }
}

/// Receiver of committed movements
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &MovementEvent) -> Result<(), BankError>;
}

/// Notifier that writes each event to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, event: &MovementEvent) -> Result<(), BankError> {
        match event {
            MovementEvent::Deposited {
                entry,
                account,
                amount,
                balance,
            } => tracing::info!(%entry, %account, %amount, %balance, "Deposit committed"),
            MovementEvent::Withdrawn {
                entry,
                account,
                amount,
                balance,
            } => tracing::info!(%entry, %account, %amount, %balance, "Withdrawal committed"),
            MovementEvent::Transferred {
                entry,
                from,
                to,
                amount,
                from_balance,
                to_balance,
            } => tracing::info!(
                %entry,
                %from,
                %to,
                %amount,
                %from_balance,
                %to_balance,
                "Transfer committed"
            ),
        }
        Ok(())
    }
}

/// Deliver an event on its own task
///
/// Failures are logged and otherwise dropped.
pub fn dispatch(notifier: Arc<dyn Notifier>, event: MovementEvent) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(error) = notifier.notify(&event).await {
            tracing::warn!(entry = %event.entry(), %error, "Movement notification failed");
        }
    })
}
