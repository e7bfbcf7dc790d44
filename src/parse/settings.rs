//! Parse configuration: auto-detected and manually configured layouts

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::*;
use crate::utils::money::MoneyFormat;

/// Number of leading lines schema inference looks at by default
pub const DEFAULT_SCAN_LIMIT: usize = 50;

/// Supported field delimiters, in auto-detection priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Delimiter {
    Pipe,
    Tab,
    #[default]
    Comma,
}

impl Delimiter {
    /// Every delimiter, in the order a header row is checked for them
    pub const ALL: [Delimiter; 3] = [Delimiter::Pipe, Delimiter::Tab, Delimiter::Comma];

    pub fn as_char(&self) -> char {
        match self {
            Delimiter::Pipe => '|',
            Delimiter::Tab => '\t',
            Delimiter::Comma => ',',
        }
    }

    pub fn as_byte(&self) -> u8 {
        self.as_char() as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            Delimiter::Pipe => "pipe ( | )",
            Delimiter::Tab => "tab ( ->| )",
            Delimiter::Comma => "comma ( , )",
        }
    }
}

/// Date layouts recognised in ledger files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DateFormat {
    /// dd-mm-yy
    #[default]
    DashShortYear,
    /// dd/mm/yy
    SlashShortYear,
    /// dd-mm-yyyy
    DashLongYear,
    /// dd/mm/yyyy
    SlashLongYear,
}

impl DateFormat {
    pub const ALL: [DateFormat; 4] = [
        DateFormat::DashShortYear,
        DateFormat::SlashShortYear,
        DateFormat::DashLongYear,
        DateFormat::SlashLongYear,
    ];

    /// chrono format string
    pub fn pattern(&self) -> &'static str {
        match self {
            DateFormat::DashShortYear => "%d-%m-%y",
            DateFormat::SlashShortYear => "%d/%m/%y",
            DateFormat::DashLongYear => "%d-%m-%Y",
            DateFormat::SlashLongYear => "%d/%m/%Y",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DateFormat::DashShortYear => "dd-mm-yy",
            DateFormat::SlashShortYear => "dd/mm/yy",
            DateFormat::DashLongYear => "dd-mm-yyyy",
            DateFormat::SlashLongYear => "dd/mm/yyyy",
        }
    }

    pub fn parse(&self, value: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(value.trim(), self.pattern()).ok()
    }

    /// Find the format a raw date value is written in
    ///
    /// A four-digit-year pattern happily reads `05-01-24` as year 24, so
    /// formats whose label is as long as the value are tried first.
    pub fn detect(value: &str) -> Option<DateFormat> {
        let value = value.trim();
        let len = value.chars().count();
        let (same_len, others): (Vec<DateFormat>, Vec<DateFormat>) = Self::ALL
            .iter()
            .copied()
            .partition(|f| f.label().len() == len);

        same_len
            .into_iter()
            .chain(others)
            .find(|f| f.parse(value).is_some())
    }
}

/// Column positions of the money fields
///
/// Used both for manual column indices and for auto-detected delimiter counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmountColumns {
    /// Separate debit and credit columns
    DebitCredit { debit: usize, credit: usize },
    /// One amount column plus a transaction type (Dr/Cr) column
    Single {
        amount: usize,
        transaction_type: usize,
    },
}

impl AmountColumns {
    fn max_index(&self) -> usize {
        match self {
            AmountColumns::DebitCredit { debit, credit } => (*debit).max(*credit),
            AmountColumns::Single {
                amount,
                transaction_type,
            } => (*amount).max(*transaction_type),
        }
    }
}

/// User supplied column indices; `None` means the column is not assigned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub date: Option<usize>,
    pub narration: Option<usize>,
    pub debit: Option<usize>,
    pub credit: Option<usize>,
    pub balance: Option<usize>,
    pub amount: Option<usize>,
    pub transaction_type: Option<usize>,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            date: Some(0),
            narration: Some(1),
            debit: Some(2),
            credit: Some(3),
            balance: Some(4),
            amount: None,
            transaction_type: None,
        }
    }
}

impl ColumnMap {
    /// Check the assignment and turn it into a layout the row parser can use
    pub fn resolve(&self) -> ParseResult<ColumnLayout> {
        let (date, narration, balance) = match (self.date, self.narration, self.balance) {
            (Some(d), Some(n), Some(b)) => (d, n, b),
            _ => {
                return Err(ParseError::ColNumber(
                    "required columns not assigned: date, narration and balance are needed"
                        .to_string(),
                ))
            }
        };

        let debit_credit = match (self.debit, self.credit) {
            (Some(debit), Some(credit)) => Some(AmountColumns::DebitCredit { debit, credit }),
            _ => None,
        };
        let single = match (self.amount, self.transaction_type) {
            (Some(amount), Some(transaction_type)) => Some(AmountColumns::Single {
                amount,
                transaction_type,
            }),
            _ => None,
        };

        let amounts = match (debit_credit, single) {
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => {
                return Err(ParseError::ColNumber(
                    "both debit/credit and amount/transaction type columns are unassigned"
                        .to_string(),
                ))
            }
            (Some(_), Some(_)) => {
                return Err(ParseError::ColNumber(
                    "assign either debit/credit or amount/transaction type columns, not both"
                        .to_string(),
                ))
            }
        };

        Ok(ColumnLayout {
            date,
            narration,
            balance,
            amounts,
        })
    }
}

/// A validated column assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub date: usize,
    pub narration: usize,
    pub balance: usize,
    pub amounts: AmountColumns,
}

impl ColumnLayout {
    /// Highest column index the layout reads
    pub fn max_index(&self) -> usize {
        self.date
            .max(self.narration)
            .max(self.balance)
            .max(self.amounts.max_index())
    }
}

/// Manually configured parse settings for one ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualParseSettings {
    pub columns: ColumnMap,
    pub delimiter: Delimiter,
    pub date_format: DateFormat,
    /// Zero-based line number of the first data row
    pub first_row: usize,
}

impl Default for ManualParseSettings {
    fn default() -> Self {
        Self {
            columns: ColumnMap::default(),
            delimiter: Delimiter::default(),
            date_format: DateFormat::default(),
            first_row: 1,
        }
    }
}

/// Layout discovered by schema inference
///
/// Field positions are counts of delimiters preceding the field in the header
/// row, not literal column indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoParseSettings {
    /// Zero-based line number of the header row
    pub header_at: usize,
    pub delimiter: Delimiter,
    pub date_format: DateFormat,
    /// Total delimiters in the header row
    pub header_delims: usize,
    pub date: usize,
    pub narration: usize,
    pub balance: usize,
    pub amounts: AmountColumns,
}

impl AutoParseSettings {
    pub fn single_amount_col(&self) -> bool {
        matches!(self.amounts, AmountColumns::Single { .. })
    }
}

/// How one ledger file is to be parsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    /// Infer the layout from the file itself
    Auto { scan_limit: usize },
    /// Use the given column assignment
    Manual(ManualParseSettings),
}

/// Everything the parse driver needs for one ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    pub mode: ParseMode,
    pub money: MoneyFormat,
}

impl ParseOptions {
    pub fn auto() -> Self {
        Self {
            mode: ParseMode::Auto {
                scan_limit: DEFAULT_SCAN_LIMIT,
            },
            money: MoneyFormat::default(),
        }
    }

    pub fn manual(settings: ManualParseSettings) -> Self {
        Self {
            mode: ParseMode::Manual(settings),
            money: MoneyFormat::default(),
        }
    }

    pub fn with_money(mut self, money: MoneyFormat) -> Self {
        self.money = money;
        self
    }
}

/// Settings for both ledgers as edited by a settings collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseSettings {
    auto_parse: bool,
    pub scan_limit: usize,
    pub money: MoneyFormat,
    pub bank: ManualParseSettings,
    pub books: ManualParseSettings,
}

impl Default for ParseSettings {
    fn default() -> Self {
        Self {
            auto_parse: true,
            scan_limit: DEFAULT_SCAN_LIMIT,
            money: MoneyFormat::default(),
            bank: ManualParseSettings::default(),
            books: ManualParseSettings::default(),
        }
    }
}

impl ParseSettings {
    pub fn set_auto_parse(&mut self, value: bool) {
        self.auto_parse = value;
    }

    pub fn is_auto_parse_enabled(&self) -> bool {
        self.auto_parse
    }

    pub fn manual_for(&self, side: LedgerSide) -> &ManualParseSettings {
        match side {
            LedgerSide::Bank => &self.bank,
            LedgerSide::Books => &self.books,
        }
    }

    pub fn manual_for_mut(&mut self, side: LedgerSide) -> &mut ManualParseSettings {
        match side {
            LedgerSide::Bank => &mut self.bank,
            LedgerSide::Books => &mut self.books,
        }
    }

    /// Parse options for one ledger under the current settings
    pub fn options_for(&self, side: LedgerSide) -> ParseOptions {
        let mode = if self.auto_parse {
            ParseMode::Auto {
                scan_limit: self.scan_limit,
            }
        } else {
            ParseMode::Manual(self.manual_for(side).clone())
        };

        ParseOptions {
            mode,
            money: self.money.clone(),
        }
    }
}
