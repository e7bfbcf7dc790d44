//! Automatic pairing of bank and books entries, manual commits and suggestions

use chrono::Duration;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::ledger::Ledgers;
use crate::reconciliation::entry_match::EntryMatch;
use crate::reconciliation::result::ReconciliationResult;
use crate::types::*;

/// Default look-ahead, in days, when suggesting related records
pub const DEFAULT_RELATION_WINDOW_DAYS: i64 = 5;

/// Find the latest pair of entries whose running balances agree
///
/// Both sequences are walked from the end: for each bank index, newest
/// first, every books index is tried newest first. Returns `(0, 0)` if either
/// side is empty or no balances agree.
pub fn find_last_matching_balance(bank: &[Entry], books: &[Entry]) -> (usize, usize) {
    for (bank_idx, bank_entry) in bank.iter().enumerate().rev() {
        for (books_idx, books_entry) in books.iter().enumerate().rev() {
            if bank_entry.balance() == books_entry.balance() {
                return (bank_idx, books_idx);
            }
        }
    }
    (0, 0)
}

/// Pair entries of both ledgers starting at the given offsets
///
/// Each bank entry from `bank_begin` on takes the first unconsumed books
/// entry at or after `books_begin` equal to it; ties go to the lowest books
/// index. The offsets only bound the pairing scan: every unpaired index of
/// either ledger, including those before its offset, ends up in a missing
/// list. Offsets past the end of a ledger are clamped to its length.
pub fn run_reconciliation(
    ledgers: &Ledgers,
    bank_begin: usize,
    books_begin: usize,
) -> ReconciliationResult {
    let bank = ledgers.bank.entries();
    let books = ledgers.books.entries();
    let bank_begin = bank_begin.min(bank.len());
    let books_begin = books_begin.min(books.len());

    let mut result = ReconciliationResult {
        bank_offset: bank_begin,
        books_offset: books_begin,
        ..ReconciliationResult::default()
    };
    let mut consumed = vec![false; books.len()];

    // unpaired by construction
    result.missing_in_books.extend(0..bank_begin);

    for (bank_idx, bank_entry) in bank.iter().enumerate().skip(bank_begin) {
        let found =
            (books_begin..books.len()).find(|&k| !consumed[k] && books[k] == *bank_entry);

        match found {
            Some(books_idx) => {
                consumed[books_idx] = true;
                result.matches.push(EntryMatch::automatic(bank_idx, books_idx));
            }
            None => result.missing_in_books.push(bank_idx),
        }
    }

    result.missing_in_bank = (0..books.len()).filter(|&k| !consumed[k]).collect();

    info!(
        bank_offset = bank_begin,
        books_offset = books_begin,
        matches = result.matches.len(),
        missing_in_books = result.missing_in_books.len(),
        missing_in_bank = result.missing_in_bank.len(),
        "reconciliation finished"
    );
    result
}

/// Commit a manual match if it is valid
///
/// A valid candidate's indices leave the missing lists and the match is
/// appended to the result. The candidate is cleared either way. Returns
/// whether it was committed.
pub fn save_manual_match(
    result: &mut ReconciliationResult,
    candidate: &mut EntryMatch,
    ledgers: &Ledgers,
) -> bool {
    let committed = candidate.is_valid(ledgers);

    if committed {
        for side in [LedgerSide::Bank, LedgerSide::Books] {
            for index in candidate.indices(side) {
                if !result.take_missing(EntryPointer::new(side, index)) {
                    warn!(
                        %side,
                        index,
                        match_id = %candidate.id(),
                        "committed index was not in the missing list"
                    );
                }
            }
        }
        result.matches.push(candidate.clone());
    }

    candidate.clear();
    committed
}

/// A bank entry and the unmatched books entries that may account for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PossibleRelation {
    pub bank_index: usize,
    pub books_indices: BTreeSet<usize>,
    /// The single books entry carries exactly the bank amount
    pub is_exact: bool,
}

/// Suggest books entries that could explain each unmatched bank entry
///
/// Candidates move money in the same direction, are dated no later than
/// `window_days` after the bank entry and are not larger than it. An equal
/// amount makes the relation exact; a books entry is offered as an exact
/// counterpart only once. Bank entries without candidates are left out.
pub fn find_related_records(
    result: &ReconciliationResult,
    ledgers: &Ledgers,
    window_days: i64,
) -> Vec<PossibleRelation> {
    let mut relations = Vec::new();
    let mut exact_taken = BTreeSet::new();

    for &bank_idx in &result.missing_in_books {
        let Some(bank_entry) = ledgers.bank.get(bank_idx) else {
            continue;
        };
        let latest = bank_entry.date() + Duration::days(window_days);
        let amount = bank_entry.amount();

        let mut relation = PossibleRelation {
            bank_index: bank_idx,
            books_indices: BTreeSet::new(),
            is_exact: false,
        };

        for &books_idx in &result.missing_in_bank {
            let Some(books_entry) = ledgers.books.get(books_idx) else {
                continue;
            };
            if exact_taken.contains(&books_idx)
                || books_entry.is_debit() != bank_entry.is_debit()
                || books_entry.date() > latest
                || books_entry.amount() > amount
            {
                continue;
            }

            if books_entry.amount() == amount {
                relation.is_exact = true;
                relation.books_indices = BTreeSet::from([books_idx]);
                exact_taken.insert(books_idx);
                break;
            }
            relation.books_indices.insert(books_idx);
        }

        if !relation.books_indices.is_empty() {
            relations.push(relation);
        }
    }

    relations
}
