//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over operations from a CSV file, plus a
//! loader for the accounts seed file. Delegates CSV format concerns to the
//! csv_format module.
//!
//! # Iterator Interface
//!
//! SyncReader implements the Iterator trait, yielding
//! `Result<Operation, BankError>` for each CSV row:
//!
//! ```no_run
//! use bank_ledger_engine::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("operations.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(operation) => println!("Applying {}", operation.name()),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Individual row errors are yielded as `Err(BankError::ParseError)` with
//!   the line number, and iteration continues with the next row

use crate::core::Operation;
use crate::io::csv_format::{
    convert_account_record, convert_operation_record, AccountCsvRecord, OperationCsvRecord,
};
use crate::types::{Account, BankError, Money};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

fn open_csv(path: &Path) -> Result<csv::Reader<File>, BankError> {
    let file = File::open(path).map_err(|e| BankError::IoError {
        message: format!("Failed to open file '{}': {}", path.display(), e),
    })?;

    Ok(ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .buffer_capacity(8 * 1024)
        .from_reader(file))
}

/// Attach a line number to a row error
fn at_line(error: BankError, line: u64) -> BankError {
    match error {
        BankError::ParseError { line: None, message } => BankError::parse_error(Some(line), message),
        BankError::ParseError { .. } => error,
        other => BankError::parse_error(Some(line), other),
    }
}

/// Synchronous operations reader
///
/// Reads one CSV row per `next()` call, so memory use does not grow with
/// the file.
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: u64,
}

impl SyncReader {
    /// Open an operations CSV file
    ///
    /// # Returns
    ///
    /// * `Ok(SyncReader)` if the file opened successfully
    /// * `Err(BankError::IoError)` if the file could not be opened
    pub fn new(path: &Path) -> Result<Self, BankError> {
        Ok(Self {
            reader: open_csv(path)?,
            line_num: 1,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<Operation, BankError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<OperationCsvRecord>();
        let row = deserializer.next()?;
        self.line_num += 1;

        Some(
            row.map_err(BankError::from)
                .and_then(convert_operation_record)
                .map_err(|e| at_line(e, self.line_num)),
        )
    }
}

/// Load every account from an accounts CSV file
///
/// Unlike operations, a bad account row is fatal: the whole load fails.
/// Rows with a blank balance start at `opening_balance`.
pub fn read_accounts(path: &Path, opening_balance: Money) -> Result<Vec<Account>, BankError> {
    let mut reader = open_csv(path)?;
    let mut accounts = Vec::new();

    for (index, row) in reader.deserialize::<AccountCsvRecord>().enumerate() {
        let line = index as u64 + 2;
        let account = row
            .map_err(BankError::from)
            .and_then(|record| convert_account_record(record, opening_balance))
            .map_err(|e| at_line(e, line))?;
        accounts.push(account);
    }

    Ok(accounts)
}
