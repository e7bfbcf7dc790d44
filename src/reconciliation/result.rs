//! Outcome of a reconciliation run and the bookkeeping of committed matches

use bigdecimal::BigDecimal;
use serde::Serialize;
use uuid::Uuid;

use crate::ledger::Ledgers;
use crate::reconciliation::entry_match::EntryMatch;
use crate::types::*;
use crate::utils::money::MoneyFormat;

/// Matches and unmatched indices for both ledgers
///
/// Every index of both ledgers is either part of exactly one match or listed
/// as missing on its side. The offsets record where the pairing scan began.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    pub matches: Vec<EntryMatch>,
    /// Bank indices with no books counterpart, ascending
    pub missing_in_books: Vec<usize>,
    /// Books indices with no bank counterpart, ascending
    pub missing_in_bank: Vec<usize>,
    pub bank_offset: usize,
    pub books_offset: usize,
}

/// Counts and totals of a result, in major currency units
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationSummary {
    pub matched: usize,
    pub missing_in_books: usize,
    pub missing_in_bank: usize,
    pub matched_bank_total: BigDecimal,
    pub missing_in_books_total: BigDecimal,
    pub missing_in_bank_total: BigDecimal,
}

impl ReconciliationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unmatched indices of one ledger
    pub fn missing_for(&self, side: LedgerSide) -> &[usize] {
        match side {
            LedgerSide::Bank => &self.missing_in_books,
            LedgerSide::Books => &self.missing_in_bank,
        }
    }

    fn missing_for_mut(&mut self, side: LedgerSide) -> &mut Vec<usize> {
        match side {
            LedgerSide::Bank => &mut self.missing_in_books,
            LedgerSide::Books => &mut self.missing_in_bank,
        }
    }

    /// Whether the entry is still waiting for a counterpart
    pub fn is_missing(&self, pointer: EntryPointer) -> bool {
        self.missing_for(pointer.side).contains(&pointer.index)
    }

    /// Remove an index from its missing list; false if it was not there
    pub(crate) fn take_missing(&mut self, pointer: EntryPointer) -> bool {
        let missing = self.missing_for_mut(pointer.side);
        match missing.iter().position(|i| *i == pointer.index) {
            Some(pos) => {
                missing.remove(pos);
                true
            }
            None => false,
        }
    }

    fn restore_missing(&mut self, pointer: EntryPointer) {
        let missing = self.missing_for_mut(pointer.side);
        if let Err(pos) = missing.binary_search(&pointer.index) {
            missing.insert(pos, pointer.index);
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
            && self.missing_in_books.is_empty()
            && self.missing_in_bank.is_empty()
    }

    pub fn match_by_id(&self, id: Uuid) -> Option<&EntryMatch> {
        self.matches.iter().find(|m| m.id() == id)
    }

    /// The committed match an entry belongs to, if any
    pub fn match_for(&self, pointer: EntryPointer) -> Option<&EntryMatch> {
        self.matches.iter().find(|m| m.contains(pointer))
    }

    /// Undo a committed match, returning its entries to the missing lists
    pub fn unmatch(&mut self, id: Uuid) -> MatchResult<EntryMatch> {
        let pos = self
            .matches
            .iter()
            .position(|m| m.id() == id)
            .ok_or(MatchError::MatchNotFound(id))?;

        let removed = self.matches.remove(pos);
        for pointer in removed.pointers() {
            self.restore_missing(*pointer);
        }
        Ok(removed)
    }

    /// Counts and money totals for reporting
    ///
    /// Pointers that do not resolve against `ledgers` are left out of the totals.
    pub fn summary(&self, ledgers: &Ledgers, money: &MoneyFormat) -> ReconciliationSummary {
        let matched_bank = self
            .matches
            .iter()
            .flat_map(|m| m.pointers().iter())
            .filter(|p| p.side == LedgerSide::Bank)
            .map(|p| p.index);

        ReconciliationSummary {
            matched: self.matches.len(),
            missing_in_books: self.missing_in_books.len(),
            missing_in_bank: self.missing_in_bank.len(),
            matched_bank_total: side_total(ledgers, money, LedgerSide::Bank, matched_bank),
            missing_in_books_total: side_total(
                ledgers,
                money,
                LedgerSide::Bank,
                self.missing_in_books.iter().copied(),
            ),
            missing_in_bank_total: side_total(
                ledgers,
                money,
                LedgerSide::Books,
                self.missing_in_bank.iter().copied(),
            ),
        }
    }
}

fn side_total(
    ledgers: &Ledgers,
    money: &MoneyFormat,
    side: LedgerSide,
    indices: impl Iterator<Item = usize>,
) -> BigDecimal {
    let ledger = ledgers.side(side);
    indices
        .filter_map(|i| ledger.get(i))
        .map(|entry| money.to_major(entry.amount()))
        .sum()
}
