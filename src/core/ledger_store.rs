//! Append-only in-memory ledger
//!
//! This module provides the `InMemoryLedgerStore` struct, the durable record
//! of committed financial events.
//!
//! # Design
//!
//! Entries are kept in a single vector behind a `tokio::sync::RwLock`,
//! together with a per-account index of positions. Appends take the write
//! lock; every read takes the read lock once, so a statement's seed entry and
//! its in-range entries always come from the same view.
//!
//! # Ordering
//!
//! Entries are ordered by `(created_at, sequence)`. The sequence number is
//! assigned under the write lock and breaks ties between equal timestamps.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::traits::{LedgerStore, LedgerView};
use crate::types::{AccountId, BankError, EntryId, LedgerEntry};

#[derive(Debug, Default)]
struct LedgerState {
    entries: Vec<LedgerEntry>,
    by_account: HashMap<AccountId, Vec<usize>>,
    by_id: HashMap<EntryId, usize>,
}

impl LedgerState {
    fn account_entries(&self, account: AccountId) -> Vec<&LedgerEntry> {
        let mut entries: Vec<&LedgerEntry> = self
            .by_account
            .get(&account)
            .map(|positions| positions.iter().map(|&i| &self.entries[i]).collect())
            .unwrap_or_default();
        entries.sort_by_key(|entry| (entry.created_at, entry.sequence));
        entries
    }
}

/// Append-only ledger store
///
/// Entries are never updated or removed once appended.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: RwLock<LedgerState>,
}

impl InMemoryLedgerStore {
    /// Create a new empty ledger
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn append(&self, mut entry: LedgerEntry) -> Result<LedgerEntry, BankError> {
        let mut state = self.state.write().await;

        let position = state.entries.len();
        entry.sequence = position as u64 + 1;

        for account in [entry.source, entry.destination].into_iter().flatten() {
            let positions = state.by_account.entry(account).or_default();
            // A transfer never names the same account twice, but don't index it twice if it does
            if positions.last() != Some(&position) {
                positions.push(position);
            }
        }
        state.by_id.insert(entry.id, position);
        state.entries.push(entry.clone());

        Ok(entry)
    }

    async fn get(&self, id: EntryId) -> Result<LedgerEntry, BankError> {
        let state = self.state.read().await;
        state
            .by_id
            .get(&id)
            .map(|&position| state.entries[position].clone())
            .ok_or_else(|| BankError::entry_not_found(id))
    }

    async fn history(&self, account: AccountId) -> Result<Vec<LedgerEntry>, BankError> {
        let state = self.state.read().await;
        Ok(state
            .account_entries(account)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn statement_view(
        &self,
        account: AccountId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<LedgerView, BankError> {
        let state = self.state.read().await;
        let mut view = LedgerView::default();

        for entry in state.account_entries(account) {
            if from.is_some_and(|from| entry.created_at < from) {
                // Ordered oldest first, so the last one seen is the latest
                view.seed = Some(entry.clone());
            } else if to.map_or(true, |to| entry.created_at <= to) {
                view.entries.push(entry.clone());
            }
        }

        Ok(view)
    }

    async fn len(&self) -> Result<usize, BankError> {
        Ok(self.state.read().await.entries.len())
    }
}
