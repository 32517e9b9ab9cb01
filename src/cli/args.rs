use crate::config::EngineConfig;
use crate::strategy::BatchConfig;
use crate::types::Money;
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Apply deposits, withdrawals and transfers to a ledger of bank accounts
#[derive(Parser, Debug)]
#[command(name = "bank-ledger")]
#[command(about = "Apply money movements to bank accounts and reconstruct statements", long_about = None)]
pub struct CliArgs {
    /// Operations CSV file: op,account,counterparty,amount,description
    #[arg(value_name = "OPERATIONS", help = "Path to the operations CSV file")]
    pub input_file: PathBuf,

    /// Accounts CSV file: number,holder,balance,status
    #[arg(
        long = "accounts",
        value_name = "FILE",
        help = "Accounts to open before applying operations"
    )]
    pub accounts_file: Option<PathBuf>,

    /// Processing strategy
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "sequential",
        help = "'sequential' applies operations in file order, 'concurrent' applies each batch in parallel"
    )]
    pub strategy: StrategyType,

    /// Number of operations per batch (concurrent mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of operations per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Maximum number of operations in flight (concurrent mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Maximum number of operations in flight within a batch (default: CPU cores)"
    )]
    pub max_concurrent: Option<usize>,

    /// Print this account's statement instead of the account list
    #[arg(long = "statement", value_name = "NUMBER")]
    pub statement: Option<String>,

    /// Statement range start (inclusive, RFC 3339)
    #[arg(long = "from", value_name = "TIMESTAMP", requires = "statement")]
    pub from: Option<DateTime<Utc>>,

    /// Statement range end (inclusive, RFC 3339)
    #[arg(long = "to", value_name = "TIMESTAMP", requires = "statement")]
    pub to: Option<DateTime<Utc>>,

    /// Balance for accounts seeded without one (default: 1000.00)
    #[arg(long = "opening-balance", value_name = "AMOUNT")]
    pub opening_balance: Option<Money>,

    /// How long an operation may wait for its account locks
    #[arg(long = "lock-timeout-ms", value_name = "MILLIS")]
    pub lock_timeout_ms: Option<u64>,

    /// Retries after a lock conflict
    #[arg(long = "max-retries", value_name = "COUNT")]
    pub max_retries: Option<u32>,

    /// Log output format (logs go to stderr; filter with RUST_LOG)
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text")]
    pub log_format: LogFormat,
}

/// Available processing strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sequential,
    Concurrent,
}

/// Log output formats
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Missing values use the defaults; zero values fall back to the
    /// defaults with a warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent.unwrap_or(default.max_concurrent),
            )
        } else {
            BatchConfig::default()
        }
    }

    /// Create an EngineConfig from CLI arguments
    pub fn to_engine_config(&self) -> EngineConfig {
        let default = EngineConfig::default();
        EngineConfig::new(
            self.opening_balance.unwrap_or(default.opening_balance),
            self.lock_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(default.lock_timeout),
            self.max_retries.unwrap_or(default.max_conflict_retries),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::default_strategy(&["program", "ops.csv"], StrategyType::Sequential)]
    #[case::explicit_sequential(&["program", "--strategy", "sequential", "ops.csv"], StrategyType::Sequential)]
    #[case::explicit_concurrent(&["program", "--strategy", "concurrent", "ops.csv"], StrategyType::Concurrent)]
    fn test_strategy_parsing(#[case] args: &[&str], #[case] expected: StrategyType) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.strategy, expected);
    }

    #[rstest]
    #[case::all_defaults(&["program", "ops.csv"], 1000, num_cpus::get())]
    #[case::custom_batch_size(&["program", "--batch-size", "2000", "ops.csv"], 2000, num_cpus::get())]
    #[case::custom_max_concurrent(&["program", "--max-concurrent", "8", "ops.csv"], 1000, 8)]
    #[case::zero_batch_size(&["program", "--batch-size", "0", "ops.csv"], 1000, num_cpus::get())]
    fn test_batch_config_conversion(
        #[case] args: &[&str],
        #[case] expected_batch_size: usize,
        #[case] expected_max_concurrent: usize,
    ) {
        let config = CliArgs::try_parse_from(args).unwrap().to_batch_config();

        assert_eq!(config.batch_size, expected_batch_size);
        assert_eq!(config.max_concurrent, expected_max_concurrent);
    }

    #[test]
    fn test_engine_config_conversion() {
        let parsed = CliArgs::try_parse_from([
            "program",
            "--opening-balance",
            "250.50",
            "--lock-timeout-ms",
            "100",
            "--max-retries",
            "0",
            "ops.csv",
        ])
        .unwrap();

        let config = parsed.to_engine_config();

        assert_eq!(config.opening_balance, Money::from_minor(25_050));
        assert_eq!(config.lock_timeout, Duration::from_millis(100));
        assert_eq!(config.max_conflict_retries, 0);
    }

    #[test]
    fn test_engine_config_defaults() {
        let parsed = CliArgs::try_parse_from(["program", "ops.csv"]).unwrap();

        assert_eq!(parsed.to_engine_config(), EngineConfig::default());
    }

    #[test]
    fn test_statement_range_parsing() {
        let parsed = CliArgs::try_parse_from([
            "program",
            "--statement",
            "BANK1",
            "--from",
            "2024-01-01T00:00:00Z",
            "ops.csv",
        ])
        .unwrap();

        assert_eq!(parsed.statement.as_deref(), Some("BANK1"));
        assert_eq!(
            parsed.from,
            Some(DateTime::from_timestamp(1_704_067_200, 0).unwrap())
        );
        assert_eq!(parsed.to, None);
    }

    #[rstest]
    #[case::range_without_statement(&["program", "--from", "2024-01-01T00:00:00Z", "ops.csv"])]
    #[case::bad_amount(&["program", "--opening-balance", "1.001", "ops.csv"])]
    #[case::bad_strategy(&["program", "--strategy", "parallel", "ops.csv"])]
    #[case::missing_input(&["program"])]
    fn test_invalid_arguments(#[case] args: &[&str]) {
        assert!(CliArgs::try_parse_from(args).is_err());
    }

    #[test]
    fn test_log_format_parsing() {
        let parsed = CliArgs::try_parse_from(["program", "--log-format", "json", "ops.csv"]).unwrap();
        assert_eq!(parsed.log_format, LogFormat::Json);
    }
}
