//! Account-related types for the ledger engine
//!
//! This module defines the Account structure, its KYC status and the
//! references callers use to address an account.

use super::error::BankError;
use super::ids::{AccountId, AccountNumber, UserId};
use super::money::Money;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// KYC review state of an account
///
/// Only approved accounts may take part in money movement or produce
/// statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KycStatus {
    /// Submitted, awaiting an administrator's review
    Pending,
    /// Approved; the account has a number and may move funds
    Approved,
    /// Rejected by an administrator
    Rejected,
}

impl KycStatus {
    pub fn is_approved(self) -> bool {
        matches!(self, KycStatus::Approved)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KycStatus::Pending => "pending",
            KycStatus::Approved => "approved",
            KycStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for KycStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KycStatus {
    type Err = BankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(KycStatus::Pending),
            "approved" => Ok(KycStatus::Approved),
            "rejected" => Ok(KycStatus::Rejected),
            other => Err(BankError::parse_error(
                None,
                format!("Invalid KYC status '{}'", other),
            )),
        }
    }
}

/// Account state
///
/// Represents the current state of one customer account. The balance is only
/// ever changed by the movement engine (together with a ledger entry) or by
/// the audited administrative override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Stable internal id
    pub id: AccountId,

    /// Account number, assigned when KYC is approved
    pub number: Option<AccountNumber>,

    /// User that owns the account
    pub owner: UserId,

    /// Account holder's display name
    pub holder: String,

    /// Current balance in minor units
    pub balance: Money,

    /// Balance granted when the account was opened
    ///
    /// Used as the statement baseline when no earlier ledger entry exists.
    pub opening_balance: Money,

    /// KYC review state
    pub status: KycStatus,

    /// Reason given when KYC was rejected
    pub rejection_reason: Option<String>,

    /// Overdraft limit (informational only, never enforced)
    pub overdraft_limit: Money,
}

impl Account {
    /// Create a pending account awaiting KYC review
    ///
    /// The account has no number yet and starts with `opening_balance`.
    pub fn pending(owner: UserId, holder: impl Into<String>, opening_balance: Money) -> Self {
        Account {
            id: AccountId::new(),
            number: None,
            owner,
            holder: holder.into(),
            balance: opening_balance,
            opening_balance,
            status: KycStatus::Pending,
            rejection_reason: None,
            overdraft_limit: Money::ZERO,
        }
    }

    /// Create an already approved account with a number
    pub fn approved(
        number: AccountNumber,
        owner: UserId,
        holder: impl Into<String>,
        balance: Money,
    ) -> Self {
        Account {
            number: Some(number),
            status: KycStatus::Approved,
            ..Account::pending(owner, holder, balance)
        }
    }

    /// Human-facing reference: the account number, or the id while pending
    pub fn display_ref(&self) -> String {
        match &self.number {
            Some(number) => number.to_string(),
            None => self.id.to_string(),
        }
    }

    /// Fail with `KycNotApproved` unless the account is approved
    pub fn ensure_approved(&self) -> Result<(), BankError> {
        if self.status.is_approved() {
            Ok(())
        } else {
            Err(BankError::kyc_not_approved(self.display_ref(), self.status))
        }
    }
}

/// How a caller addresses an account
///
/// Requests either name an account explicitly (by number or id) or refer to
/// the caller's own account through the owner's user id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "by", content = "value")]
pub enum AccountRef {
    Id(AccountId),
    Number(AccountNumber),
    Owner(UserId),
}

impl AccountRef {
    pub fn number(number: impl Into<String>) -> Self {
        AccountRef::Number(AccountNumber::new(number))
    }
}

impl From<AccountId> for AccountRef {
    fn from(id: AccountId) -> Self {
        AccountRef::Id(id)
    }
}

impl From<AccountNumber> for AccountRef {
    fn from(number: AccountNumber) -> Self {
        AccountRef::Number(number)
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountRef::Id(id) => write!(f, "{}", id),
            AccountRef::Number(number) => write!(f, "{}", number),
            AccountRef::Owner(owner) => write!(f, "owned by {}", owner),
        }
    }
}
