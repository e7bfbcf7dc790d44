//! Schema inference: find the header row, delimiter, field offsets and date format

use std::io::{BufRead, Seek};

use tracing::debug;

use crate::parse::lines::decoded_lines;
use crate::parse::row::split_record;
use crate::parse::settings::*;
use crate::types::*;

const NARRATION_TOKENS: [&str; 5] = ["Narr", "Particulars", "Account", "Description", "Remarks"];
const TRANSACTION_TYPE_TOKENS: [&str; 3] = ["Cr/Dr", "Dr/Cr", "Transaction Type"];

/// Header layout before the date format is known
#[derive(Debug, Clone, PartialEq, Eq)]
struct HeaderLayout {
    header_at: usize,
    delimiter: Delimiter,
    header_delims: usize,
    date: usize,
    narration: usize,
    balance: usize,
    amounts: AmountColumns,
}

impl HeaderLayout {
    fn with_date_format(self, date_format: DateFormat) -> AutoParseSettings {
        AutoParseSettings {
            header_at: self.header_at,
            delimiter: self.delimiter,
            date_format,
            header_delims: self.header_delims,
            date: self.date,
            narration: self.narration,
            balance: self.balance,
            amounts: self.amounts,
        }
    }
}

/// Infer how a ledger file is laid out by scanning at most `scan_limit` lines
///
/// The reader is rewound to the start before returning, whether inference
/// succeeded or not.
pub fn infer_schema<R: BufRead + Seek>(
    reader: &mut R,
    scan_limit: usize,
) -> ParseResult<AutoParseSettings> {
    let outcome = scan(reader, scan_limit);
    reader.rewind()?;
    outcome
}

fn scan<R: BufRead>(reader: &mut R, scan_limit: usize) -> ParseResult<AutoParseSettings> {
    let mut header: Option<HeaderLayout> = None;

    for (row, line) in decoded_lines(reader).take(scan_limit).enumerate() {
        let line = line?;
        let line = line.as_str();

        match &header {
            None => {
                header = detect_header(line, row)?;
                if let Some(layout) = &header {
                    debug!(
                        row,
                        delimiter = layout.delimiter.label(),
                        "header row found"
                    );
                }
            }
            Some(layout) => {
                if line.trim().is_empty() || !line.contains(layout.delimiter.as_char()) {
                    continue;
                }
                let fields = split_record(line, layout.delimiter)?;
                let raw_date = fields.get(layout.date).map(String::as_str).unwrap_or("");
                if let Some(format) = DateFormat::detect(raw_date) {
                    debug!(row, date_format = format.label(), "date format found");
                    return Ok(layout.clone().with_date_format(format));
                }
            }
        }
    }

    match header {
        None => Err(ParseError::InvalidHeader(format!(
            "headers not found in the first {} lines; \
             looking for date, amount or debit/credit, balance",
            scan_limit
        ))),
        Some(_) => Err(ParseError::DateFormat(
            "no row below the header has a date in a known format".to_string(),
        )),
    }
}

/// Check whether `line` is the header row and, if so, record its layout
///
/// Field positions are the number of delimiters in front of the field that
/// holds each header token.
fn detect_header(line: &str, row: usize) -> ParseResult<Option<HeaderLayout>> {
    if !line.contains("Date") {
        return Ok(None);
    }
    let has_amount = line.contains("Amount");
    let has_debit_credit = (line.contains("Debit") || line.contains("Withdraw"))
        && (line.contains("Credit") || line.contains("Deposit"));
    if !has_amount && !has_debit_credit {
        return Ok(None);
    }

    let delimiter = Delimiter::ALL
        .into_iter()
        .find(|d| line.contains(d.as_char()))
        .unwrap_or(Delimiter::Comma);
    let fields = split_record(line, delimiter)?;
    let position = |token: &str| fields.iter().position(|f| f.contains(token));

    let Some(date) = position("Date") else {
        return Ok(None);
    };

    let amounts = if has_debit_credit {
        let debit = position("Debit").or_else(|| position("Withdraw"));
        let credit = position("Credit").or_else(|| position("Deposit"));
        match (debit, credit) {
            (Some(debit), Some(credit)) => AmountColumns::DebitCredit { debit, credit },
            _ => return Ok(None),
        }
    } else {
        let amount = position("Amount").ok_or_else(|| {
            ParseError::InvalidHeader("amount column not found".to_string())
        })?;
        let transaction_type = TRANSACTION_TYPE_TOKENS
            .iter()
            .find_map(|&token| position(token))
            .ok_or_else(|| {
                ParseError::InvalidHeader(
                    "couldn't find transaction type for single column amount format".to_string(),
                )
            })?;
        AmountColumns::Single {
            amount,
            transaction_type,
        }
    };

    // narration is looked for from the date column onwards
    let narration = NARRATION_TOKENS
        .iter()
        .find_map(|token| {
            fields.iter().enumerate().skip(date).find_map(|(i, f)| {
                let haystack = if i == date {
                    f.find("Date").map_or(f.as_str(), |p| &f[p + "Date".len()..])
                } else {
                    f.as_str()
                };
                haystack.contains(token).then_some(i)
            })
        })
        .ok_or_else(|| ParseError::InvalidHeader("narration not found".to_string()))?;

    let balance = position("Balance")
        .ok_or_else(|| ParseError::InvalidHeader("balance not found".to_string()))?;

    Ok(Some(HeaderLayout {
        header_at: row,
        delimiter,
        header_delims: fields.len().saturating_sub(1),
        date,
        narration,
        balance,
        amounts,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    #[test]
    fn test_pipe_header_offsets() {
        let mut file = Cursor::new(
            "Date|Narration|Debit|Credit|Balance\n05-01-24|Salary|0|5000|15000\n".to_string(),
        );
        let settings = infer_schema(&mut file, DEFAULT_SCAN_LIMIT).unwrap();

        assert_eq!(settings.delimiter, Delimiter::Pipe);
        assert_eq!(settings.header_at, 0);
        assert_eq!(settings.header_delims, 4);
        assert_eq!(settings.date, 0);
        assert_eq!(settings.narration, 1);
        assert_eq!(settings.amounts, AmountColumns::DebitCredit { debit: 2, credit: 3 });
        assert_eq!(settings.balance, 4);
        assert_eq!(settings.date_format, DateFormat::DashShortYear);
        assert!(!settings.single_amount_col());
    }

    #[test]
    fn test_preamble_and_tab_delimiter() {
        let text = "Account statement\nCustomer: A N Other\n\n\
Txn Date\tValue Date\tDescription\tWithdrawal Amt.\tDeposit Amt.\tBalance\n\
05/01/2024\t05/01/2024\tATM\t500.00\t\t9,500.00\n";
        let mut file = Cursor::new(text.to_string());
        let settings = infer_schema(&mut file, DEFAULT_SCAN_LIMIT).unwrap();

        assert_eq!(settings.delimiter, Delimiter::Tab);
        assert_eq!(settings.header_at, 3);
        assert_eq!(settings.date, 0);
        assert_eq!(settings.narration, 2);
        assert_eq!(settings.amounts, AmountColumns::DebitCredit { debit: 3, credit: 4 });
        assert_eq!(settings.balance, 5);
        assert_eq!(settings.date_format, DateFormat::SlashLongYear);
    }

    #[test]
    fn test_delimiter_priority() {
        let text = "Date\tNarration, remarks\tDebit\tCredit\tBalance\n\
05-01-24\tSalary, Jan\t0\t5000\t15000\n";
        let settings =
            infer_schema(&mut Cursor::new(text.to_string()), DEFAULT_SCAN_LIMIT).unwrap();
        assert_eq!(settings.delimiter, Delimiter::Tab);
        assert_eq!(settings.balance, 4);

        let text = "Date|Narration\tfree text|Debit|Credit|Balance\n\
05-01-24|Salary|0|5000|15000\n";
        let settings =
            infer_schema(&mut Cursor::new(text.to_string()), DEFAULT_SCAN_LIMIT).unwrap();
        assert_eq!(settings.delimiter, Delimiter::Pipe);
        assert_eq!(settings.narration, 1);
    }

    #[test]
    fn test_single_amount_header() {
        let text = "Date,Particulars,Amount,Cr/Dr,Balance\n05-01-2024,Fuel,250.00,DR,750.00\n";
        let mut file = Cursor::new(text.to_string());
        let settings = infer_schema(&mut file, DEFAULT_SCAN_LIMIT).unwrap();

        assert_eq!(settings.delimiter, Delimiter::Comma);
        assert!(settings.single_amount_col());
        assert_eq!(
            settings.amounts,
            AmountColumns::Single {
                amount: 2,
                transaction_type: 3
            }
        );
        assert_eq!(settings.date_format, DateFormat::DashLongYear);
    }

    #[test]
    fn test_single_amount_without_type_is_invalid_header() {
        let mut file = Cursor::new("Date,Particulars,Amount,Balance\n05-01-24,x,1,1\n".to_string());
        assert!(matches!(
            infer_schema(&mut file, DEFAULT_SCAN_LIMIT),
            Err(ParseError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_missing_header_is_invalid_and_stream_rewound() {
        let text = "no header here\njust,some,values\n";
        let mut file = Cursor::new(text.to_string());
        assert!(matches!(
            infer_schema(&mut file, DEFAULT_SCAN_LIMIT),
            Err(ParseError::InvalidHeader(_))
        ));

        let mut rest = String::new();
        file.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, text);
    }

    #[test]
    fn test_header_beyond_scan_limit_is_not_found() {
        let mut text = "preamble\n".repeat(5);
        text.push_str("Date,Narration,Debit,Credit,Balance\n05-01-24,x,1,,1\n");
        let mut file = Cursor::new(text);
        assert!(matches!(
            infer_schema(&mut file, 5),
            Err(ParseError::InvalidHeader(_))
        ));
        assert!(infer_schema(&mut file, 10).is_ok());
    }

    #[test]
    fn test_unknown_date_format() {
        let text = "Date,Narration,Debit,Credit,Balance\n2024.01.05,x,1,,1\n";
        let mut file = Cursor::new(text.to_string());
        assert!(matches!(
            infer_schema(&mut file, DEFAULT_SCAN_LIMIT),
            Err(ParseError::DateFormat(_))
        ));
        assert_eq!(file.position(), 0);
    }

    #[test]
    fn test_date_found_after_continuation_line() {
        let text = "Date,Narration,Debit,Credit,Balance\n\
,opening note,,,\n\
05-01-24,Rent,100,,900\n";
        let mut file = Cursor::new(text.to_string());
        let settings = infer_schema(&mut file, DEFAULT_SCAN_LIMIT).unwrap();
        assert_eq!(settings.date_format, DateFormat::DashShortYear);
    }
}
