//! Bank Ledger CLI
//!
//! Command-line interface for applying money movements from CSV files.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --accounts accounts.csv operations.csv > accounts_out.csv
//! cargo run -- --accounts accounts.csv --strategy concurrent --max-concurrent 8 operations.csv
//! cargo run -- --accounts accounts.csv --statement BANK1 operations.csv > statement.csv
//! ```
//!
//! The program opens the seeded accounts, applies every operation in the
//! feed and writes either the final account states or one account's
//! statement to stdout. Rejected operations are logged to stderr and do not
//! stop processing.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, bad account seed, etc.)

use bank_ledger_engine::{cli, telemetry};
use std::process;

fn main() {
    // Parse command-line arguments using clap
    let args = cli::parse_args();
    telemetry::init(args.log_format);

    // Output goes to stdout
    let mut output = std::io::stdout();
    if let Err(e) = cli::run(&args, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
