//! Core types and data structures for the reconciliation system

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::utils::validation::validate_debit_credit;

/// Which of the two ledgers an entry (or a reference to one) belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LedgerSide {
    /// Statement issued by the bank
    Bank,
    /// Internal books of account
    Books,
}

impl fmt::Display for LedgerSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerSide::Bank => write!(f, "bank"),
            LedgerSide::Books => write!(f, "books"),
        }
    }
}

/// One normalized ledger line
///
/// Money is held in minor currency units. Entries are immutable once built;
/// the only way to obtain one is [`Entry::new`], which enforces that exactly
/// one of debit/credit is nonzero.
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    source: LedgerSide,
    date: NaiveDate,
    narration: String,
    debit: i64,
    credit: i64,
    balance: i64,
}

impl Entry {
    /// Create a new entry from raw column values
    ///
    /// Bank statements record money leaving the account as a debit from the
    /// bank's point of view; for bank-sourced entries debit and credit are
    /// swapped so both ledgers share the customer's perspective.
    pub fn new(
        source: LedgerSide,
        date: NaiveDate,
        narration: impl Into<String>,
        debit: i64,
        credit: i64,
        balance: i64,
    ) -> ParseResult<Self> {
        validate_debit_credit(debit, credit)?;

        let (debit, credit) = match source {
            LedgerSide::Bank => (credit, debit),
            LedgerSide::Books => (debit, credit),
        };

        Ok(Self {
            source,
            date,
            narration: narration.into(),
            debit,
            credit,
            balance,
        })
    }

    pub fn source(&self) -> LedgerSide {
        self.source
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn narration(&self) -> &str {
        &self.narration
    }

    pub fn debit(&self) -> i64 {
        self.debit
    }

    pub fn credit(&self) -> i64 {
        self.credit
    }

    /// Running balance; credit balances are negative
    pub fn balance(&self) -> i64 {
        self.balance
    }

    /// The transaction amount: the debit if nonzero, else the credit
    pub fn amount(&self) -> i64 {
        if self.debit != 0 {
            self.debit
        } else {
            self.credit
        }
    }

    /// Whether this entry moves money on the debit side
    pub fn is_debit(&self) -> bool {
        self.debit != 0
    }
}

/// Entries are equal when they fall on the same calendar day and carry the
/// same debit and credit. Balance and narration do not take part.
impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.date.day() == other.date.day()
            && self.date.month() == other.date.month()
            && self.date.year() == other.date.year()
            && self.credit == other.credit
            && self.debit == other.debit
    }
}

impl Eq for Entry {}

/// By-index reference into one ledger's passed entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryPointer {
    pub side: LedgerSide,
    pub index: usize,
}

impl EntryPointer {
    pub fn new(side: LedgerSide, index: usize) -> Self {
        Self { side, index }
    }

    pub fn bank(index: usize) -> Self {
        Self::new(LedgerSide::Bank, index)
    }

    pub fn books(index: usize) -> Self {
        Self::new(LedgerSide::Books, index)
    }
}

/// Errors raised while inferring a schema or parsing ledger rows
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
    #[error("Date format could not be determined: {0}")]
    DateFormat(String),
    #[error("Column error: {0}")]
    ColNumber(String),
    #[error("Both debit and credit can't be zero")]
    DebitCreditZero,
    #[error("Both debit and credit can't be non-zero")]
    DebitCreditNonZero,
    #[error("Balance format error: {0}")]
    BalanceFormat(String),
    #[error("Amount format error: {0}")]
    AmountFormat(String),
    #[error("No data found in {0} file")]
    NoData(LedgerSide),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ParseError {
    /// Row-level errors skip the row into the failed list and parsing goes on
    pub fn is_row_level(&self) -> bool {
        matches!(
            self,
            ParseError::ColNumber(_)
                | ParseError::DebitCreditZero
                | ParseError::DebitCreditNonZero
                | ParseError::BalanceFormat(_)
                | ParseError::AmountFormat(_)
        )
    }

    /// Schema errors reject the whole file; retrying with other settings may help
    pub fn is_schema(&self) -> bool {
        matches!(self, ParseError::InvalidHeader(_) | ParseError::DateFormat(_))
    }

    /// Short title suitable for an error dialog
    pub fn user_message(&self) -> &'static str {
        match self {
            ParseError::NoData(_) => "No data found",
            ParseError::Io(_) => "File could not be read",
            _ => "Invalid argument",
        }
    }
}

/// Errors raised by match mutation and aggregate queries
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("The {0} ledger has no entries")]
    EmptyLedger(LedgerSide),
    #[error("Index {index} is out of range for the {side} ledger of {len} entries")]
    IndexOutOfRange {
        side: LedgerSide,
        index: usize,
        len: usize,
    },
    #[error("Index {index} of the {side} ledger is not unmatched")]
    NotUnmatched { side: LedgerSide, index: usize },
    #[error("Match not found: {0}")]
    MatchNotFound(Uuid),
    #[error("The {0} amounts of the match overflow their total")]
    AmountOverflow(LedgerSide),
}

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for match operations
pub type MatchResult<T> = Result<T, MatchError>;
