//! Delimited row tokenizing and the two row parse strategies

use chrono::NaiveDate;

use crate::parse::settings::*;
use crate::traits::RowParser;
use crate::types::*;
use crate::utils::money::MoneyFormat;
use crate::utils::validation::validate_debit_credit;

/// Marker that ends the data part of a statement
const TOTALS_MARKER: &str = "Total";

/// Result of parsing one data row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// A data row; debit/credit already satisfy the entry invariant
    Parsed(ParsedRow),
    /// A totals/summary row: no more data follows
    Totals,
}

/// Field values of one row, before the date has been resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    pub side: LedgerSide,
    /// `None` when the date column could not be parsed
    pub date: Option<NaiveDate>,
    pub narration: String,
    pub debit: i64,
    pub credit: i64,
    pub balance: i64,
}

impl ParsedRow {
    /// Whether the date was unparseable, as on a wrapped continuation line
    pub fn bad_date(&self) -> bool {
        self.date.is_none()
    }

    /// Build the entry, borrowing `fallback` when the row has no date of its own
    ///
    /// Returns `Ok(None)` if there is neither a date nor a fallback.
    pub fn into_entry(self, fallback: Option<NaiveDate>) -> ParseResult<Option<Entry>> {
        let Some(date) = self.date.or(fallback) else {
            return Ok(None);
        };
        Entry::new(
            self.side,
            date,
            self.narration,
            self.debit,
            self.credit,
            self.balance,
        )
        .map(Some)
    }
}

/// Split one line into trimmed, unquoted fields
///
/// Delimiters inside double quotes belong to the field; a doubled quote is a
/// literal quote. A blank line has no fields.
pub(crate) fn split_record(line: &str, delimiter: Delimiter) -> ParseResult<Vec<String>> {
    let record = csv::ReaderBuilder::new()
        .delimiter(delimiter.as_byte())
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .transpose()
        .map_err(|e| ParseError::ColNumber(format!("unreadable record: {}", e)))?;

    Ok(record
        .map(|r| r.iter().map(str::to_string).collect())
        .unwrap_or_default())
}

/// Whether the row is a totals/summary row
pub fn is_totals_row(line: &str) -> bool {
    line.contains(TOTALS_MARKER)
}

/// Parse a balance with an optional `Cr`/`Dr` suffix
///
/// Credit balances come out negative; `Dr` and unsuffixed balances keep their
/// parsed sign.
pub fn parse_balance(value: &str, money: &MoneyFormat) -> ParseResult<i64> {
    let to_balance_error = |e: ParseError| ParseError::BalanceFormat(format!("{}: '{}'", e, value));

    if let Some(pos) = value.find("Cr") {
        money
            .parse_minor(&value[..pos])
            .map(|m| -m)
            .map_err(to_balance_error)
    } else if let Some(pos) = value.find("Dr") {
        money.parse_minor(&value[..pos]).map_err(to_balance_error)
    } else {
        money.parse_minor(value).map_err(to_balance_error)
    }
}

/// Split an amount into (debit, credit) using a transaction type flag
///
/// Any `D` in the flag (`Dr`, `DR`, `Debit`) makes it a debit.
fn split_by_transaction_type(amount: i64, transaction_type: &str) -> (i64, i64) {
    if transaction_type.contains('D') {
        (amount, 0)
    } else {
        (0, amount)
    }
}

/// Parse one row using delimiter counts discovered by schema inference
///
/// Rows may carry more (or fewer) delimiters than the header when narration
/// holds unquoted delimiters; fields after the narration are shifted by the
/// difference.
pub fn parse_with_auto_config(
    line: &str,
    side: LedgerSide,
    settings: &AutoParseSettings,
    money: &MoneyFormat,
) -> ParseResult<RowOutcome> {
    if is_totals_row(line) {
        return Ok(RowOutcome::Totals);
    }

    let fields = split_record(line, settings.delimiter)?;
    let row_delims = fields.len().saturating_sub(1);
    let diff = row_delims as i64 - settings.header_delims as i64;

    let field = |offset: usize| -> ParseResult<String> {
        let shifted = if offset > settings.narration {
            offset as i64 + diff
        } else {
            offset as i64
        };
        if shifted < 0 {
            return Err(ParseError::ColNumber(format!(
                "row has {} delimiters, header has {}",
                row_delims, settings.header_delims
            )));
        }
        Ok(fields.get(shifted as usize).cloned().unwrap_or_default())
    };

    let date = settings.date_format.parse(&field(settings.date)?);

    let (debit, credit) = match settings.amounts {
        AmountColumns::DebitCredit { debit, credit } => (
            money.parse_minor(&field(debit)?)?,
            money.parse_minor(&field(credit)?)?,
        ),
        AmountColumns::Single {
            amount,
            transaction_type,
        } => {
            let flag = field(transaction_type)?;
            split_by_transaction_type(money.parse_minor(&field(amount)?)?, &flag)
        }
    };

    validate_debit_credit(debit, credit)?;

    let balance = parse_balance(&field(settings.balance)?, money)?;
    let narration = field(settings.narration)?;

    Ok(RowOutcome::Parsed(ParsedRow {
        side,
        date,
        narration,
        debit,
        credit,
        balance,
    }))
}

/// Parse one row using a manually configured column map
pub fn parse_with_manual_config(
    line: &str,
    side: LedgerSide,
    settings: &ManualParseSettings,
    money: &MoneyFormat,
) -> ParseResult<RowOutcome> {
    let columns = split_record(line, settings.delimiter)?;

    if is_totals_row(line) {
        return Ok(RowOutcome::Totals);
    }

    let layout = settings.columns.resolve()?;
    if layout.max_index() >= columns.len() {
        return Err(ParseError::ColNumber(format!(
            "column index {} exceeds the {} parsed columns",
            layout.max_index(),
            columns.len()
        )));
    }

    let date = settings.date_format.parse(&columns[layout.date]);
    let narration = columns[layout.narration].clone();

    let (debit, credit) = match layout.amounts {
        AmountColumns::DebitCredit { debit, credit } => (
            money.parse_minor(&columns[debit])?,
            money.parse_minor(&columns[credit])?,
        ),
        AmountColumns::Single {
            amount,
            transaction_type,
        } => split_by_transaction_type(
            money.parse_minor(&columns[amount])?,
            &columns[transaction_type],
        ),
    };

    let balance = parse_balance(&columns[layout.balance], money)?;

    validate_debit_credit(debit, credit)?;

    Ok(RowOutcome::Parsed(ParsedRow {
        side,
        date,
        narration,
        debit,
        credit,
        balance,
    }))
}

impl RowParser for AutoParseSettings {
    fn parse_row(
        &self,
        line: &str,
        side: LedgerSide,
        money: &MoneyFormat,
    ) -> ParseResult<RowOutcome> {
        parse_with_auto_config(line, side, self, money)
    }

    fn delimiter(&self) -> Delimiter {
        self.delimiter
    }

    fn first_data_row(&self) -> usize {
        self.header_at + 1
    }
}

impl RowParser for ManualParseSettings {
    fn parse_row(
        &self,
        line: &str,
        side: LedgerSide,
        money: &MoneyFormat,
    ) -> ParseResult<RowOutcome> {
        parse_with_manual_config(line, side, self, money)
    }

    fn delimiter(&self) -> Delimiter {
        self.delimiter
    }

    fn first_data_row(&self) -> usize {
        self.first_row
    }
}
