//! Engine configuration
//!
//! Tunables for the money-movement engine. The CLI builds an
//! [`EngineConfig`] from its arguments; library users can start from
//! `EngineConfig::default()`.

use crate::types::Money;
use std::time::Duration;

/// Balance granted to newly opened accounts, in minor units (1000.00)
pub const DEFAULT_OPENING_BALANCE: Money = Money::from_minor(100_000);

/// Configuration for the movement engine and its collaborators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Balance granted when an account is opened
    ///
    /// Also the statement baseline for accounts with no earlier entry.
    pub opening_balance: Money,

    /// How long a unit may wait for its account locks
    pub lock_timeout: Duration,

    /// How many times a unit is retried after a lock conflict
    pub max_conflict_retries: u32,

    /// Base delay between conflict retries (multiplied by the attempt number)
    pub retry_backoff: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            opening_balance: DEFAULT_OPENING_BALANCE,
            lock_timeout: Duration::from_secs(5),
            max_conflict_retries: 3,
            retry_backoff: Duration::from_millis(10),
        }
    }
}

impl EngineConfig {
    /// Create an EngineConfig with custom values
    ///
    /// A negative opening balance or a zero lock timeout falls back to the
    /// default with a warning.
    pub fn new(opening_balance: Money, lock_timeout: Duration, max_conflict_retries: u32) -> Self {
        let default = Self::default();

        let opening_balance = if opening_balance < Money::ZERO {
            tracing::warn!(
                %opening_balance,
                default = %default.opening_balance,
                "Invalid opening balance, using default"
            );
            default.opening_balance
        } else {
            opening_balance
        };

        let lock_timeout = if lock_timeout.is_zero() {
            tracing::warn!(
                default_ms = default.lock_timeout.as_millis() as u64,
                "Invalid lock timeout (0), using default"
            );
            default.lock_timeout
        } else {
            lock_timeout
        };

        Self {
            opening_balance,
            lock_timeout,
            max_conflict_retries,
            ..default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();

        assert_eq!(config.opening_balance.to_string(), "1000.00");
        assert_eq!(config.lock_timeout, Duration::from_secs(5));
        assert_eq!(config.max_conflict_retries, 3);
    }

    #[rstest]
    #[case::valid(Money::from_minor(500), Duration::from_millis(250), Money::from_minor(500), Duration::from_millis(250))]
    #[case::negative_opening(Money::from_minor(-1), Duration::from_millis(250), DEFAULT_OPENING_BALANCE, Duration::from_millis(250))]
    #[case::zero_timeout(Money::ZERO, Duration::ZERO, Money::ZERO, Duration::from_secs(5))]
    fn test_new_falls_back_on_invalid_values(
        #[case] opening: Money,
        #[case] timeout: Duration,
        #[case] expected_opening: Money,
        #[case] expected_timeout: Duration,
    ) {
        let config = EngineConfig::new(opening, timeout, 1);

        assert_eq!(config.opening_balance, expected_opening);
        assert_eq!(config.lock_timeout, expected_timeout);
        assert_eq!(config.max_conflict_retries, 1);
    }
}
