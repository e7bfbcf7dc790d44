//! Per-ledger entry storage
//!
//! Each ledger owns one growable list of parsed entries; everything else
//! refers to entries by `(side, index)`. The list is only ever cleared and
//! repopulated as a whole, so indices stay meaningful between re-parses.

use chrono::NaiveDate;
use std::io::{BufRead, Seek};

use crate::parse::{parse_entries, ParseOptions};
use crate::types::*;

/// Passed and failed rows of one ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    side: LedgerSide,
    passed: Vec<Entry>,
    failed: Vec<String>,
}

impl Ledger {
    /// Create an empty ledger
    pub fn new(side: LedgerSide) -> Self {
        Self {
            side,
            passed: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Create a ledger from already built entries
    pub fn from_entries(side: LedgerSide, entries: Vec<Entry>) -> ParseResult<Self> {
        if let Some(stray) = entries.iter().find(|e| e.source() != side) {
            return Err(ParseError::Unexpected(format!(
                "{} entry dated {} cannot be stored in the {} ledger",
                stray.source(),
                stray.date(),
                side
            )));
        }

        Ok(Self {
            side,
            passed: entries,
            failed: Vec::new(),
        })
    }

    pub fn side(&self) -> LedgerSide {
        self.side
    }

    /// Successfully parsed entries, in file order
    pub fn entries(&self) -> &[Entry] {
        &self.passed
    }

    /// Raw lines that could not be parsed
    pub fn failed(&self) -> &[String] {
        &self.failed
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.passed.get(index)
    }

    pub fn len(&self) -> usize {
        self.passed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passed.is_empty()
    }

    /// Drop all passed and failed rows
    pub fn clear(&mut self) {
        self.passed.clear();
        self.failed.clear();
    }

    /// Re-parse this ledger from a file, replacing its contents
    ///
    /// On any error the ledger is left empty. A file without a single
    /// parseable entry yields [`ParseError::NoData`].
    pub fn load<R: BufRead + Seek>(
        &mut self,
        reader: R,
        options: &ParseOptions,
    ) -> ParseResult<usize> {
        self.clear();

        let parsed = parse_entries(reader, self.side, options)?;
        if parsed.passed.is_empty() {
            return Err(ParseError::NoData(self.side));
        }

        self.passed.extend(parsed.passed);
        self.failed.extend(parsed.failed);
        Ok(self.passed.len())
    }

    /// Dates of the first and last entries
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.passed.first(), self.passed.last()) {
            (Some(first), Some(last)) => Some((first.date(), last.date())),
            _ => None,
        }
    }
}

/// The bank and books ledgers side by side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledgers {
    pub bank: Ledger,
    pub books: Ledger,
}

impl Default for Ledgers {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledgers {
    pub fn new() -> Self {
        Self {
            bank: Ledger::new(LedgerSide::Bank),
            books: Ledger::new(LedgerSide::Books),
        }
    }

    /// Build from entry lists, checking each list holds its own side only
    pub fn from_entries(bank: Vec<Entry>, books: Vec<Entry>) -> ParseResult<Self> {
        Ok(Self {
            bank: Ledger::from_entries(LedgerSide::Bank, bank)?,
            books: Ledger::from_entries(LedgerSide::Books, books)?,
        })
    }

    pub fn side(&self, side: LedgerSide) -> &Ledger {
        match side {
            LedgerSide::Bank => &self.bank,
            LedgerSide::Books => &self.books,
        }
    }

    pub fn side_mut(&mut self, side: LedgerSide) -> &mut Ledger {
        match side {
            LedgerSide::Bank => &mut self.bank,
            LedgerSide::Books => &mut self.books,
        }
    }

    /// Look up the entry a pointer refers to
    pub fn entry(&self, pointer: EntryPointer) -> Option<&Entry> {
        self.side(pointer.side).get(pointer.index)
    }
}
