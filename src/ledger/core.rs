//! Reconciliation session that coordinates both ledgers, the result and the
//! manual match being built

use std::io::{BufRead, Seek};

use tracing::info;
use uuid::Uuid;

use crate::ledger::{Ledger, Ledgers};
use crate::parse::ParseSettings;
use crate::reconciliation::*;
use crate::types::*;

/// Main reconciliation session
///
/// Owns the parsed ledgers and the current result. A front end drives it
/// one call at a time: load both files, run, then build manual matches from
/// selections and commit or discard them.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    settings: ParseSettings,
    ledgers: Ledgers,
    result: ReconciliationResult,
    candidate: EntryMatch,
}

impl Reconciler {
    /// Create a session with the given parse settings
    pub fn new(settings: ParseSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &ParseSettings {
        &self.settings
    }

    /// Settings used by the next [`Reconciler::load`]
    pub fn settings_mut(&mut self) -> &mut ParseSettings {
        &mut self.settings
    }

    pub fn ledgers(&self) -> &Ledgers {
        &self.ledgers
    }

    pub fn ledger(&self, side: LedgerSide) -> &Ledger {
        self.ledgers.side(side)
    }

    pub fn result(&self) -> &ReconciliationResult {
        &self.result
    }

    /// The manual match under construction
    pub fn candidate(&self) -> &EntryMatch {
        &self.candidate
    }

    // Ledger operations
    /// Parse a ledger file, replacing that ledger's entries
    ///
    /// Any previous result refers to the old entries by index, so it is
    /// dropped along with the candidate.
    pub fn load<R: BufRead + Seek>(
        &mut self,
        side: LedgerSide,
        reader: R,
    ) -> ParseResult<usize> {
        self.result.clear();
        self.candidate = EntryMatch::manual();

        let options = self.settings.options_for(side);
        let count = self.ledgers.side_mut(side).load(reader, &options)?;
        info!(%side, entries = count, "ledger loaded");
        Ok(count)
    }

    /// Replace both ledgers with already built entries
    pub fn set_ledgers(&mut self, ledgers: Ledgers) {
        self.ledgers = ledgers;
        self.result.clear();
        self.candidate = EntryMatch::manual();
    }

    /// Whether both ledgers have entries
    pub fn can_reconcile(&self) -> bool {
        !self.ledgers.bank.is_empty() && !self.ledgers.books.is_empty()
    }

    // Reconciliation operations
    /// Reconcile from the latest point where both running balances agree
    ///
    /// The agreeing pair is only used when neither index is the first row;
    /// otherwise pairing starts at the top of both ledgers.
    pub fn run(&mut self) -> &ReconciliationResult {
        let (bank_begin, books_begin) = match find_last_matching_balance(
            self.ledgers.bank.entries(),
            self.ledgers.books.entries(),
        ) {
            (bank, books) if bank > 0 && books > 0 => (bank, books),
            _ => (0, 0),
        };
        self.run_from(bank_begin, books_begin)
    }

    /// Reconcile from explicit offsets
    pub fn run_from(&mut self, bank_begin: usize, books_begin: usize) -> &ReconciliationResult {
        self.result = run_reconciliation(&self.ledgers, bank_begin, books_begin);
        self.candidate = EntryMatch::manual();
        &self.result
    }

    // Manual match operations
    /// Add an unmatched bank entry to the candidate; false if refused
    pub fn select_bank(&mut self, index: usize) -> bool {
        self.select(EntryPointer::bank(index))
    }

    /// Add an unmatched books entry to the candidate; false if refused
    pub fn select_books(&mut self, index: usize) -> bool {
        self.select(EntryPointer::books(index))
    }

    fn select(&mut self, pointer: EntryPointer) -> bool {
        if self.candidate.contains(pointer) {
            return true;
        }
        self.candidate
            .try_insert(pointer, &self.ledgers, &self.result)
            .is_ok()
    }

    pub fn deselect_bank(&mut self, index: usize) {
        self.candidate.erase_bank_idx(index);
    }

    pub fn deselect_books(&mut self, index: usize) {
        self.candidate.erase_books_idx(index);
    }

    /// Revalidate the candidate
    pub fn candidate_is_valid(&mut self) -> bool {
        self.candidate.is_valid(&self.ledgers)
    }

    /// Bank and books amount totals of the candidate
    pub fn candidate_totals(&self) -> MatchResult<(i64, i64)> {
        Ok((
            self.candidate.bank_sum(&self.ledgers)?,
            self.candidate.books_sum(&self.ledgers)?,
        ))
    }

    /// Commit the candidate if valid; the candidate is emptied either way
    pub fn commit_candidate(&mut self) -> bool {
        save_manual_match(&mut self.result, &mut self.candidate, &self.ledgers)
    }

    pub fn discard_candidate(&mut self) {
        self.candidate.clear();
    }

    /// Undo a committed match
    pub fn unmatch(&mut self, id: Uuid) -> MatchResult<EntryMatch> {
        self.result.unmatch(id)
    }

    /// Books entries that may explain each unmatched bank entry
    pub fn suggestions(&self, window_days: i64) -> Vec<PossibleRelation> {
        find_related_records(&self.result, &self.ledgers, window_days)
    }

    /// Counts and totals of the current result
    pub fn summary(&self) -> ReconciliationSummary {
        self.result.summary(&self.ledgers, &self.settings.money)
    }
}
