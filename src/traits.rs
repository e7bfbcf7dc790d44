//! Traits for plugging row parse strategies into the parse driver

use crate::parse::row::RowOutcome;
use crate::parse::settings::Delimiter;
use crate::types::*;
use crate::utils::money::MoneyFormat;

/// A strategy that turns one raw data line into field values
///
/// Implemented by [`AutoParseSettings`](crate::parse::AutoParseSettings)
/// (layout inferred from the header) and
/// [`ManualParseSettings`](crate::parse::ManualParseSettings) (explicit column
/// map). The parse driver is written once against this trait.
pub trait RowParser {
    /// Parse a single data line
    ///
    /// Row-level failures (see [`ParseError::is_row_level`]) make the driver
    /// skip the line; any other error aborts the file.
    fn parse_row(&self, line: &str, side: LedgerSide, money: &MoneyFormat)
        -> ParseResult<RowOutcome>;

    /// Delimiter a line must contain to be considered a data row
    fn delimiter(&self) -> Delimiter;

    /// Zero-based line number of the first data row
    fn first_data_row(&self) -> usize;
}
