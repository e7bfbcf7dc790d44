//! Validation utilities

use crate::types::*;

/// Validate the debit/credit pair of a single ledger line
///
/// Amounts are non-negative minor units and exactly one of them must be nonzero.
pub fn validate_debit_credit(debit: i64, credit: i64) -> ParseResult<()> {
    if debit < 0 || credit < 0 {
        return Err(ParseError::AmountFormat(format!(
            "debit and credit must not be negative: debit = {}, credit = {}",
            debit, credit
        )));
    }

    if debit > 0 && credit > 0 {
        return Err(ParseError::DebitCreditNonZero);
    }

    if debit == 0 && credit == 0 {
        return Err(ParseError::DebitCreditZero);
    }

    Ok(())
}

/// Validate that an index addresses an entry of a ledger holding `len` entries
pub fn validate_entry_index(side: LedgerSide, index: usize, len: usize) -> MatchResult<()> {
    if len == 0 {
        return Err(MatchError::EmptyLedger(side));
    }

    if index >= len {
        return Err(MatchError::IndexOutOfRange { side, index, len });
    }

    Ok(())
}
