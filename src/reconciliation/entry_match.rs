//! Groups of bank and books entries believed to be the same money movement

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;
use uuid::Uuid;

use crate::ledger::Ledgers;
use crate::reconciliation::result::ReconciliationResult;
use crate::types::*;
use crate::utils::validation::validate_entry_index;

/// A candidate or committed match
///
/// Holds `(side, index)` pointers only; entry data is always looked up in the
/// [`Ledgers`] passed to each call. Automatic matches are valid from the start,
/// manual matches only after [`EntryMatch::is_valid`] says so.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryMatch {
    id: Uuid,
    pointers: Vec<EntryPointer>,
    is_manual: bool,
    is_valid: bool,
}

impl Default for EntryMatch {
    fn default() -> Self {
        Self::manual()
    }
}

impl EntryMatch {
    /// Create a match from a list of pointers
    pub fn new(pointers: Vec<EntryPointer>, is_manual: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            pointers,
            is_manual,
            is_valid: !is_manual,
        }
    }

    /// An empty manual match, ready for selections
    pub fn manual() -> Self {
        Self::new(Vec::new(), true)
    }

    /// A one-to-one match found by the reconciliation engine
    pub fn automatic(bank_index: usize, books_index: usize) -> Self {
        Self::new(
            vec![EntryPointer::bank(bank_index), EntryPointer::books(books_index)],
            false,
        )
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_manual(&self) -> bool {
        self.is_manual
    }

    /// Validity as of the last [`EntryMatch::is_valid`] call
    pub fn valid(&self) -> bool {
        self.is_valid
    }

    pub fn pointers(&self) -> &[EntryPointer] {
        &self.pointers
    }

    /// Add a pointer after checking it may be part of this match
    ///
    /// The index must be in range for its ledger. A manual match may only take
    /// entries that are still unmatched in `result`.
    pub fn try_insert(
        &mut self,
        pointer: EntryPointer,
        ledgers: &Ledgers,
        result: &ReconciliationResult,
    ) -> MatchResult<()> {
        validate_entry_index(pointer.side, pointer.index, ledgers.side(pointer.side).len())?;

        if self.is_manual && !result.is_missing(pointer) {
            return Err(MatchError::NotUnmatched {
                side: pointer.side,
                index: pointer.index,
            });
        }

        self.pointers.push(pointer);
        Ok(())
    }

    /// Add a bank entry; false if it was refused
    ///
    /// Duplicates are not filtered, check [`EntryMatch::contains_bank_idx`] first.
    pub fn insert_bank(
        &mut self,
        index: usize,
        ledgers: &Ledgers,
        result: &ReconciliationResult,
    ) -> bool {
        self.insert_logged(EntryPointer::bank(index), ledgers, result)
    }

    /// Add a books entry; false if it was refused
    pub fn insert_books(
        &mut self,
        index: usize,
        ledgers: &Ledgers,
        result: &ReconciliationResult,
    ) -> bool {
        self.insert_logged(EntryPointer::books(index), ledgers, result)
    }

    fn insert_logged(
        &mut self,
        pointer: EntryPointer,
        ledgers: &Ledgers,
        result: &ReconciliationResult,
    ) -> bool {
        match self.try_insert(pointer, ledgers, result) {
            Ok(()) => true,
            Err(e) => {
                debug!(match_id = %self.id, error = %e, "insert refused");
                false
            }
        }
    }

    pub fn contains(&self, pointer: EntryPointer) -> bool {
        self.pointers.contains(&pointer)
    }

    pub fn contains_bank_idx(&self, index: usize) -> bool {
        self.contains(EntryPointer::bank(index))
    }

    pub fn contains_books_idx(&self, index: usize) -> bool {
        self.contains(EntryPointer::books(index))
    }

    /// Remove every pointer to the given bank index
    pub fn erase_bank_idx(&mut self, index: usize) {
        self.pointers.retain(|p| *p != EntryPointer::bank(index));
    }

    /// Remove every pointer to the given books index
    pub fn erase_books_idx(&mut self, index: usize) {
        self.pointers.retain(|p| *p != EntryPointer::books(index));
    }

    /// Recompute and cache validity
    ///
    /// A match is valid when its bank amounts sum to more than zero and equal
    /// its books amounts. A pointer that no longer resolves, or a total that
    /// overflows, makes it invalid.
    pub fn is_valid(&mut self, ledgers: &Ledgers) -> bool {
        self.is_valid = self.balanced_totals(ledgers);
        self.is_valid
    }

    fn balanced_totals(&self, ledgers: &Ledgers) -> bool {
        let mut bank_sum = 0i64;
        let mut books_sum = 0i64;

        for pointer in &self.pointers {
            let Some(entry) = ledgers.entry(*pointer) else {
                return false;
            };
            let total = match pointer.side {
                LedgerSide::Bank => &mut bank_sum,
                LedgerSide::Books => &mut books_sum,
            };
            let Some(next) = total.checked_add(entry.amount()) else {
                debug!(match_id = %self.id, side = %pointer.side, "match total overflows");
                return false;
            };
            *total = next;
        }

        bank_sum > 0 && bank_sum == books_sum
    }

    /// Empty the match and mark it invalid; it gets a fresh id
    pub fn clear(&mut self) {
        self.pointers.clear();
        self.is_valid = false;
        self.id = Uuid::new_v4();
    }

    pub fn bank_count(&self) -> usize {
        self.count(LedgerSide::Bank)
    }

    pub fn books_count(&self) -> usize {
        self.count(LedgerSide::Books)
    }

    fn count(&self, side: LedgerSide) -> usize {
        self.pointers.iter().filter(|p| p.side == side).count()
    }

    /// Total number of pointers on both sides
    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }

    /// Distinct indices on one side, ascending
    pub fn indices(&self, side: LedgerSide) -> BTreeSet<usize> {
        self.pointers
            .iter()
            .filter(|p| p.side == side)
            .map(|p| p.index)
            .collect()
    }

    pub fn bank_indices(&self) -> BTreeSet<usize> {
        self.indices(LedgerSide::Bank)
    }

    pub fn books_indices(&self) -> BTreeSet<usize> {
        self.indices(LedgerSide::Books)
    }

    /// Sum of the debits of the bank entries
    pub fn bank_debit_sum(&self, ledgers: &Ledgers) -> MatchResult<i64> {
        self.sum(LedgerSide::Bank, ledgers, |e| e.debit())
    }

    /// Sum of the credits of the bank entries
    pub fn bank_credit_sum(&self, ledgers: &Ledgers) -> MatchResult<i64> {
        self.sum(LedgerSide::Bank, ledgers, |e| e.credit())
    }

    /// Sum of the transaction amounts of the bank entries
    pub fn bank_sum(&self, ledgers: &Ledgers) -> MatchResult<i64> {
        self.sum(LedgerSide::Bank, ledgers, Entry::amount)
    }

    /// Sum of the transaction amounts of the books entries
    pub fn books_sum(&self, ledgers: &Ledgers) -> MatchResult<i64> {
        self.sum(LedgerSide::Books, ledgers, Entry::amount)
    }

    fn sum(
        &self,
        side: LedgerSide,
        ledgers: &Ledgers,
        value: impl Fn(&Entry) -> i64,
    ) -> MatchResult<i64> {
        let ledger = ledgers.side(side);
        if ledger.is_empty() {
            return Err(MatchError::EmptyLedger(side));
        }

        self.pointers
            .iter()
            .filter(|p| p.side == side)
            .try_fold(0i64, |total, p| {
                let entry = ledger.get(p.index).ok_or(MatchError::IndexOutOfRange {
                    side,
                    index: p.index,
                    len: ledger.len(),
                })?;
                total
                    .checked_add(value(entry))
                    .ok_or(MatchError::AmountOverflow(side))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(side: LedgerSide, day: u32, debit: i64, credit: i64) -> Entry {
        Entry::new(
            side,
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            "row",
            debit,
            credit,
            0,
        )
        .unwrap()
    }

    /// Bank: 500 debit, 200 debit; books: 300, 200, 500 debits
    fn ledgers() -> Ledgers {
        Ledgers::from_entries(
            vec![
                entry(LedgerSide::Bank, 1, 0, 50000),
                entry(LedgerSide::Bank, 2, 0, 20000),
            ],
            vec![
                entry(LedgerSide::Books, 3, 30000, 0),
                entry(LedgerSide::Books, 3, 20000, 0),
                entry(LedgerSide::Books, 4, 50000, 0),
            ],
        )
        .unwrap()
    }

    fn all_missing() -> ReconciliationResult {
        ReconciliationResult {
            missing_in_books: vec![0, 1],
            missing_in_bank: vec![0, 1, 2],
            ..ReconciliationResult::default()
        }
    }

    #[test]
    fn test_automatic_match_is_valid_from_start() {
        let m = EntryMatch::automatic(0, 2);
        assert!(m.valid());
        assert!(!m.is_manual());
        assert_eq!(m.bank_count(), 1);
        assert_eq!(m.books_count(), 1);

        let manual = EntryMatch::manual();
        assert!(!manual.valid());
        assert!(manual.is_manual());
    }

    #[test]
    fn test_manual_many_to_one_is_valid() {
        let ledgers = ledgers();
        let result = all_missing();
        let mut m = EntryMatch::manual();

        assert!(m.insert_bank(0, &ledgers, &result));
        assert!(m.insert_books(0, &ledgers, &result));
        assert!(!m.is_valid(&ledgers));
        assert!(m.insert_books(1, &ledgers, &result));
        assert!(m.is_valid(&ledgers));
        assert!(m.valid());

        assert_eq!(m.bank_sum(&ledgers).unwrap(), 50000);
        assert_eq!(m.books_sum(&ledgers).unwrap(), 50000);
        assert_eq!(m.bank_debit_sum(&ledgers).unwrap(), 50000);
        assert_eq!(m.bank_credit_sum(&ledgers).unwrap(), 0);
        assert_eq!(m.len(), 3);
    }

    #[test]
    fn test_overflowing_totals_are_invalid() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let big = i64::MAX - 1;
        let ledgers = Ledgers::from_entries(
            vec![
                Entry::new(LedgerSide::Bank, d, "a", 0, big, 0).unwrap(),
                Entry::new(LedgerSide::Bank, d, "b", 0, big, 0).unwrap(),
            ],
            vec![
                Entry::new(LedgerSide::Books, d, "a", big, 0, 0).unwrap(),
                Entry::new(LedgerSide::Books, d, "b", big, 0, 0).unwrap(),
            ],
        )
        .unwrap();
        let result = ReconciliationResult {
            missing_in_books: vec![0, 1],
            missing_in_bank: vec![0, 1],
            ..ReconciliationResult::default()
        };

        let mut m = EntryMatch::manual();
        for index in 0..2 {
            assert!(m.insert_bank(index, &ledgers, &result));
            assert!(m.insert_books(index, &ledgers, &result));
        }
        assert!(!m.is_valid(&ledgers));
        assert!(!m.valid());
        assert_eq!(m.bank_sum(&ledgers), Err(MatchError::AmountOverflow(LedgerSide::Bank)));
        assert_eq!(m.books_sum(&ledgers), Err(MatchError::AmountOverflow(LedgerSide::Books)));
        assert_eq!(m.bank_credit_sum(&ledgers).unwrap(), 0);
    }

    #[test]
    fn test_mismatched_sums_are_invalid() {
        let ledgers = ledgers();
        let result = all_missing();
        let mut m = EntryMatch::manual();
        m.insert_bank(1, &ledgers, &result);
        m.insert_books(2, &ledgers, &result);
        assert!(!m.is_valid(&ledgers));
    }

    #[test]
    fn test_books_only_match_is_invalid() {
        let ledgers = ledgers();
        let result = all_missing();
        let mut m = EntryMatch::manual();
        m.insert_books(2, &ledgers, &result);
        assert!(!m.is_valid(&ledgers));
    }

    #[test]
    fn test_insert_out_of_range_is_refused() {
        let ledgers = ledgers();
        let result = all_missing();
        let mut m = EntryMatch::manual();

        assert!(!m.insert_bank(2, &ledgers, &result));
        assert_eq!(
            m.try_insert(EntryPointer::books(7), &ledgers, &result),
            Err(MatchError::IndexOutOfRange {
                side: LedgerSide::Books,
                index: 7,
                len: 3
            })
        );
        assert!(m.is_empty());
    }

    #[test]
    fn test_manual_insert_requires_unmatched_entry() {
        let ledgers = ledgers();
        let result = ReconciliationResult {
            missing_in_books: vec![1],
            missing_in_bank: vec![0],
            ..ReconciliationResult::default()
        };

        let mut manual = EntryMatch::manual();
        assert_eq!(
            manual.try_insert(EntryPointer::bank(0), &ledgers, &result),
            Err(MatchError::NotUnmatched {
                side: LedgerSide::Bank,
                index: 0
            })
        );
        assert!(manual.insert_bank(1, &ledgers, &result));
        assert!(!manual.insert_books(2, &ledgers, &result));

        let mut automatic = EntryMatch::new(Vec::new(), false);
        assert!(automatic.insert_books(2, &ledgers, &result));
    }

    #[test]
    fn test_insert_into_empty_ledger() {
        let ledgers = Ledgers::new();
        let mut m = EntryMatch::manual();
        assert_eq!(
            m.try_insert(EntryPointer::bank(0), &ledgers, &ReconciliationResult::default()),
            Err(MatchError::EmptyLedger(LedgerSide::Bank))
        );
    }

    #[test]
    fn test_contains_and_erase() {
        let ledgers = ledgers();
        let result = all_missing();
        let mut m = EntryMatch::manual();
        m.insert_bank(0, &ledgers, &result);
        m.insert_books(0, &ledgers, &result);
        m.insert_books(0, &ledgers, &result);

        assert!(m.contains_bank_idx(0));
        assert!(!m.contains_bank_idx(1));
        assert!(m.contains_books_idx(0));
        assert_eq!(m.books_count(), 2);

        m.erase_books_idx(0);
        assert!(!m.contains_books_idx(0));
        assert_eq!(m.books_count(), 0);
        m.erase_bank_idx(0);
        assert!(m.is_empty());
    }

    #[test]
    fn test_sums_over_empty_ledger_fail() {
        let m = EntryMatch::manual();
        let empty = Ledgers::new();
        assert_eq!(m.bank_sum(&empty), Err(MatchError::EmptyLedger(LedgerSide::Bank)));
        assert_eq!(m.books_sum(&empty), Err(MatchError::EmptyLedger(LedgerSide::Books)));
        assert_eq!(m.bank_sum(&ledgers()), Ok(0));
    }

    #[test]
    fn test_stale_pointer_makes_match_invalid() {
        let mut m = EntryMatch::automatic(0, 9);
        assert!(!m.is_valid(&ledgers()));
        assert!(matches!(
            m.books_sum(&ledgers()),
            Err(MatchError::IndexOutOfRange { index: 9, .. })
        ));
    }

    #[test]
    fn test_clear_twice() {
        let ledgers = ledgers();
        let result = all_missing();
        let mut m = EntryMatch::manual();
        m.insert_bank(0, &ledgers, &result);
        m.insert_books(2, &ledgers, &result);
        assert!(m.is_valid(&ledgers));
        let first_id = m.id();

        m.clear();
        assert!(m.is_empty());
        assert!(!m.valid());
        assert_ne!(m.id(), first_id);

        m.clear();
        assert!(m.is_empty());
        assert!(!m.valid());
    }

    #[test]
    fn test_indices_are_sorted_sets() {
        let m = EntryMatch::new(
            vec![
                EntryPointer::books(2),
                EntryPointer::bank(1),
                EntryPointer::books(0),
                EntryPointer::books(2),
            ],
            true,
        );
        assert_eq!(m.books_indices().into_iter().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(m.bank_indices().into_iter().collect::<Vec<_>>(), vec![1]);
    }
}
