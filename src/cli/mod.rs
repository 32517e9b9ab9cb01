// CLI module
// Command-line interface, argument parsing and the end-to-end run

mod args;

pub use args::{CliArgs, LogFormat, StrategyType};

use crate::core::Bank;
use crate::io::{read_accounts, write_accounts_csv, write_statement_csv};
use crate::strategy::create_strategy;
use crate::types::{AccountRef, BankError};
use clap::Parser;
use std::io::Write;

/// Parse command-line arguments using clap
///
/// If parsing fails (invalid arguments, missing required arguments, or
/// --help), clap prints the error or help text and exits the process.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}

/// Run one CLI invocation end to end
///
/// Builds a multi-threaded tokio runtime, opens the seeded accounts,
/// applies the operations feed with the selected strategy and writes either
/// the account list or the requested statement to `output`.
///
/// # Returns
///
/// * `Ok(())` if the feed was processed and the output written
/// * `Err(BankError)` on a fatal error (unreadable file, bad account seed,
///   unknown statement account, runtime failure)
pub fn run(args: &CliArgs, output: &mut dyn Write) -> Result<(), BankError> {
    let batch_config = args.to_batch_config();
    let engine_config = args.to_engine_config();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(batch_config.max_concurrent)
        .enable_all()
        .build()
        .map_err(|e| BankError::IoError {
            message: format!("Failed to create tokio runtime: {}", e),
        })?;

    runtime.block_on(async {
        let bank = Bank::builder().config(engine_config.clone()).build();

        if let Some(path) = &args.accounts_file {
            for account in read_accounts(path, engine_config.opening_balance)? {
                bank.directory().register(account).await?;
            }
        }

        let strategy = create_strategy(args.strategy, Some(batch_config));
        strategy.process(&bank, &args.input_file).await?;

        match &args.statement {
            Some(number) => {
                let statement = bank
                    .statements()
                    .get_statement(&AccountRef::number(number.as_str()), args.from, args.to)
                    .await?;
                write_statement_csv(&statement, output)
            }
            None => {
                let accounts = bank.directory().list().await?;
                write_accounts_csv(&accounts, output)
            }
        }
    })
}
