//! Identifiers for accounts, ledger entries and users
//!
//! Account and entry ids are UUID v7 values: they are unique, stable and
//! totally ordered, which the engine relies on for its global lock order.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable internal account reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Generate a fresh account id
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for AccountId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Ledger entry identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Externally addressable account number (e.g. `BANK10000001`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountNumber(String);

impl AccountNumber {
    /// Prefix shared by every generated account number
    pub const PREFIX: &'static str = "BANK";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Build a generated account number from an eight digit serial
    pub fn from_serial(serial: u64) -> Self {
        Self(format!("{}{:08}", Self::PREFIX, serial))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque user id issued by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, "BANK00000001")]
    #[case(10_000_000, "BANK10000000")]
    #[case(99_999_999, "BANK99999999")]
    fn test_account_number_from_serial(#[case] serial: u64, #[case] expected: &str) {
        assert_eq!(AccountNumber::from_serial(serial).as_str(), expected);
    }

    #[test]
    fn test_account_ids_are_unique() {
        let first = AccountId::new();
        let second = AccountId::new();

        assert_ne!(first, second);
    }
}
