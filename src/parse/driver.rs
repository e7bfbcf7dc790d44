//! File-level parse driver

use std::io::{BufRead, Seek};

use tracing::{error, info, warn};

use crate::parse::lines::decoded_lines;
use crate::parse::row::RowOutcome;
use crate::parse::schema::infer_schema;
use crate::parse::settings::{AutoParseSettings, ParseMode, ParseOptions};
use crate::traits::RowParser;
use crate::types::*;

/// Entries parsed from one file plus the raw lines that could not be parsed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedEntries {
    pub passed: Vec<Entry>,
    pub failed: Vec<String>,
}

/// Parse every data row of a ledger file
///
/// The reader is consumed and dropped once parsing ends, successfully or not.
/// Row-level errors move the raw line to `failed`; a totals row stops parsing;
/// any other error aborts the file. An empty `passed` list is not an error
/// here; callers decide how to report it.
pub fn parse_entries<R: BufRead + Seek>(
    mut reader: R,
    side: LedgerSide,
    options: &ParseOptions,
) -> ParseResult<ParsedEntries> {
    let auto: AutoParseSettings;
    let parser: &dyn RowParser = match &options.mode {
        ParseMode::Auto { scan_limit } => {
            auto = infer_schema(&mut reader, *scan_limit)?;
            &auto
        }
        ParseMode::Manual(manual) => manual,
    };

    let delim = parser.delimiter().as_char();
    let first_row = parser.first_data_row();
    let mut parsed = ParsedEntries::default();

    for (row, line) in decoded_lines(reader).enumerate() {
        let line = line.map_err(|e| {
            error!(%side, row, error = %e, "aborting parse: read failure");
            ParseError::Io(e)
        })?;
        let line = line.as_str();

        if row < first_row || line.trim().is_empty() || !line.contains(delim) {
            continue;
        }

        let outcome = parser
            .parse_row(line, side, &options.money)
            .and_then(|outcome| match outcome {
                RowOutcome::Parsed(fields) => {
                    // Continuation lines carry no date of their own
                    let fallback = parsed.passed.last().map(Entry::date);
                    fields.into_entry(fallback).map(Some)
                }
                RowOutcome::Totals => Ok(None),
            });

        match outcome {
            Ok(Some(Some(entry))) => parsed.passed.push(entry),
            Ok(Some(None)) => {
                warn!(%side, row, line, "no date and no previous entry to take it from");
                parsed.failed.push(line.to_string());
            }
            Ok(None) => {
                info!(%side, row, line, "stopping parse; found totals row");
                break;
            }
            Err(e) if e.is_row_level() => {
                warn!(%side, row, line, error = %e, "skipping row");
                parsed.failed.push(line.to_string());
            }
            Err(e) => {
                error!(%side, row, line, error = %e, "aborting parse");
                return Err(e);
            }
        }
    }

    info!(
        %side,
        passed = parsed.passed.len(),
        failed = parsed.failed.len(),
        "parse finished"
    );
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::settings::{ColumnMap, Delimiter, ManualParseSettings};
    use chrono::NaiveDate;
    use std::io::{BufReader, Cursor, Read, SeekFrom};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cursor(text: &str) -> Cursor<String> {
        Cursor::new(text.to_string())
    }

    #[test]
    fn test_manual_parse_skips_header_row() {
        let text = "Date,Narration,Debit,Credit,Balance\n\
05-01-24,Salary,0,5000,15000\n\
06-01-24,Rent,2000,0,13000\n";
        let parsed = parse_entries(
            cursor(text),
            LedgerSide::Books,
            &ParseOptions::manual(ManualParseSettings::default()),
        )
        .unwrap();

        assert_eq!(parsed.passed.len(), 2);
        assert!(parsed.failed.is_empty());
        assert_eq!(parsed.passed[0].credit(), 500000);
        assert_eq!(parsed.passed[1].debit(), 200000);
        assert_eq!(parsed.passed[1].balance(), 1300000);
    }

    #[test]
    fn test_row_errors_go_to_failed_list() {
        let text = "header\n\
05-01-24,Salary,0,5000,15000\n\
05-01-24,Nothing,0,0,15000\n\
05-01-24,short\n\
06-01-24,Rent,2000,0,13000\n";
        let parsed = parse_entries(
            cursor(text),
            LedgerSide::Books,
            &ParseOptions::manual(ManualParseSettings::default()),
        )
        .unwrap();

        assert_eq!(parsed.passed.len(), 2);
        assert_eq!(
            parsed.failed,
            vec!["05-01-24,Nothing,0,0,15000", "05-01-24,short"]
        );
    }

    #[test]
    fn test_totals_row_stops_without_failing_rest() {
        let text = "Date|Narration|Debit|Credit|Balance\n\
05-01-24|Salary|0|5000|15000\n\
|Total|0|5000|\n\
07-01-24|After total|0|1|0\n\
not a row|x\n";
        let parsed = parse_entries(cursor(text), LedgerSide::Books, &ParseOptions::auto()).unwrap();

        assert_eq!(parsed.passed.len(), 1);
        assert!(parsed.failed.is_empty());
    }

    #[test]
    fn test_continuation_line_takes_previous_date() {
        let text = "Date,Narration,Debit,Credit,Balance\n\
05-01-24,Card,100,,900\n\
,wrapped line,50,,850\n";
        let parsed = parse_entries(cursor(text), LedgerSide::Books, &ParseOptions::auto()).unwrap();

        assert_eq!(parsed.passed.len(), 2);
        assert_eq!(parsed.passed[1].date(), date(2024, 1, 5));
        assert_eq!(parsed.passed[1].narration(), "wrapped line");
    }

    #[test]
    fn test_leading_dateless_row_fails() {
        let text = "Date,Narration,Debit,Credit,Balance\n,orphan,50,,850\n05-01-24,Card,100,,900\n";
        let options = ParseOptions::manual(ManualParseSettings::default());
        let parsed = parse_entries(cursor(text), LedgerSide::Books, &options).unwrap();

        assert_eq!(parsed.failed, vec![",orphan,50,,850"]);
        assert_eq!(parsed.passed.len(), 1);
    }

    #[test]
    fn test_schema_error_aborts() {
        let options = ParseOptions::auto();
        let result = parse_entries(cursor("nothing useful\n"), LedgerSide::Bank, &options);
        assert!(matches!(result, Err(ParseError::InvalidHeader(_))));
    }

    #[test]
    fn test_windows_1252_row_is_decoded() {
        let bytes = b"Date,Narration,Debit,Credit,Balance\n\
05-01-24,Card,100,,900\n\
06-01-24,Caf\xe9,50,,850\n\
07-01-24,Rent,20,,830\n"
            .to_vec();
        let manual = ParseOptions::manual(ManualParseSettings::default());
        for options in [ParseOptions::auto(), manual] {
            let parsed = parse_entries(Cursor::new(bytes.clone()), LedgerSide::Books, &options)
                .unwrap();
            assert_eq!(parsed.passed.len(), 3);
            assert!(parsed.failed.is_empty());
            assert_eq!(parsed.passed[1].narration(), "Café");
            assert_eq!(parsed.passed[1].debit(), 5000);
        }
    }

    struct FailingSource;

    impl Read for FailingSource {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("device gone"))
        }
    }

    impl Seek for FailingSource {
        fn seek(&mut self, _pos: SeekFrom) -> std::io::Result<u64> {
            Ok(0)
        }
    }

    #[test]
    fn test_read_failure_aborts() {
        let options = ParseOptions::manual(ManualParseSettings::default());
        let result = parse_entries(BufReader::new(FailingSource), LedgerSide::Books, &options);
        assert!(matches!(result, Err(ParseError::Io(_))));
    }

    #[test]
    fn test_manual_pipe_with_first_row_offset() {
        let settings = ManualParseSettings {
            delimiter: Delimiter::Pipe,
            first_row: 2,
            columns: ColumnMap {
                date: Some(1),
                narration: Some(2),
                debit: Some(3),
                credit: Some(4),
                balance: Some(5),
                ..ColumnMap::default()
            },
            ..ManualParseSettings::default()
        };
        let text = "Bank of Somewhere|||||\nSl|Date|Details|Dr|Cr|Bal\n1|05-01-24|Fee|10||990\n";
        let options = ParseOptions::manual(settings);
        let parsed = parse_entries(cursor(text), LedgerSide::Bank, &options).unwrap();

        assert_eq!(parsed.passed.len(), 1);
        let entry = &parsed.passed[0];
        // bank debits are the customer's credits
        assert_eq!(entry.credit(), 1000);
        assert_eq!(entry.debit(), 0);
        assert_eq!(entry.balance(), 99000);
    }
}
