//! # Bank Reconciliation
//!
//! Reconciles a bank statement against the books of account, both supplied
//! as loosely formatted delimited text exports.
//!
//! ## Features
//!
//! - **Tolerant parsing**: header, delimiter and date format are inferred, or
//!   columns are mapped by hand; preamble, wrapped rows and totals rows are handled
//! - **Normalized entries**: integer minor units, bank debits/credits flipped to
//!   the customer's side
//! - **Automatic matching**: equal entries are paired after skipping the prefix
//!   where running balances already agree
//! - **Manual matching**: many-to-many groups committed once their amounts agree
//! - **Suggestions and summaries**: candidate books entries per unmatched bank
//!   entry, and money totals in major units
//!
//! ## Quick Start
//!
//! ```rust
//! use bank_reconciliation::{LedgerSide, Reconciler};
//! use std::io::Cursor;
//!
//! let bank = "Date,Narration,Debit,Credit,Balance\n05-01-24,ATM,,500.00,9500.00\n";
//! let books = "Date,Particulars,Debit,Credit,Balance\n05-01-24,Cash,500.00,,9500.00\n";
//!
//! let mut session = Reconciler::default();
//! session.load(LedgerSide::Bank, Cursor::new(bank)).unwrap();
//! session.load(LedgerSide::Books, Cursor::new(books)).unwrap();
//!
//! let result = session.run_from(0, 0);
//! assert_eq!(result.matches.len(), 1);
//! ```

pub mod ledger;
pub mod parse;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use ledger::*;
pub use parse::*;
pub use reconciliation::*;
pub use traits::*;
pub use types::*;
pub use utils::money::MoneyFormat;
