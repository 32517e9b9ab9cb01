//! Statement reconstruction from the ledger
//!
//! A statement is derived, never stored. [`StatementReconstructor`] reads one
//! consistent [`LedgerView`] for the account and replays it: the balance
//! before the first line comes from the latest entry before the range (or
//! the account's opening balance), and every line carries the balance
//! forward by its amount.
//!
//! Replaying is a pure function of the view, so the same ledger always
//! yields the same statement.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::traits::{AccountStore, LedgerStore, LedgerView};
use crate::types::{Account, AccountRef, BankError, Direction, Statement, StatementLine};

/// Builds account statements by replaying ledger entries
#[derive(Clone)]
pub struct StatementReconstructor {
    accounts: Arc<dyn AccountStore>,
    ledger: Arc<dyn LedgerStore>,
}

impl StatementReconstructor {
    pub fn new(accounts: Arc<dyn AccountStore>, ledger: Arc<dyn LedgerStore>) -> Self {
        Self { accounts, ledger }
    }

    /// Build the statement of an account over an inclusive time range
    ///
    /// `None` leaves that side of the range open.
    ///
    /// # Returns
    ///
    /// * `Ok(Statement)` - The replayed statement
    /// * `Err(BankError::AccountNotFound)` - If the account does not resolve
    /// * `Err(BankError::KycNotApproved)` - If the account is not approved;
    ///   the ledger is not read in that case
    pub async fn get_statement(
        &self,
        account: &AccountRef,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Statement, BankError> {
        let account = self.accounts.resolve(account).await?;
        account.ensure_approved()?;

        let view = self.ledger.statement_view(account.id, from, to).await?;
        let statement = replay(&account, &view, from, to)?;

        tracing::debug!(
            account = %account.display_ref(),
            lines = statement.lines.len(),
            reconciled = statement.is_reconciled(),
            "Statement reconstructed"
        );
        Ok(statement)
    }
}

/// Replay a ledger view into a statement
///
/// Debits subtract from the running balance and credits add to it.
/// Entries that do not involve the account are skipped.
pub fn replay(
    account: &Account,
    view: &LedgerView,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<Statement, BankError> {
    let opening_balance = view
        .seed
        .as_ref()
        .and_then(|seed| seed.post_balance_for(account.id))
        .unwrap_or(account.opening_balance);

    let mut balance = opening_balance;
    let mut lines = Vec::with_capacity(view.entries.len());

    for entry in &view.entries {
        let Some(direction) = entry.direction_for(account.id) else {
            continue;
        };

        let before = balance;
        let after = match direction {
            Direction::Debit => before.checked_sub(entry.amount),
            Direction::Credit => before.checked_add(entry.amount),
        }
        .ok_or_else(|| BankError::arithmetic_overflow("statement", account.display_ref()))?;

        lines.push(StatementLine {
            entry: entry.id,
            created_at: entry.created_at,
            kind: entry.kind,
            direction,
            amount: entry.amount,
            balance_before: before,
            balance_after: after,
            recorded_balance: entry.post_balance_for(account.id),
            description: entry.description.clone(),
        });
        balance = after;
    }

    Ok(Statement {
        account: account.id,
        account_number: account.number.clone(),
        from,
        to,
        opening_balance,
        closing_balance: balance,
        lines,
    })
}
