//! Parsing of delimited ledger files into normalized entries

pub mod driver;
pub mod lines;
pub mod row;
pub mod schema;
pub mod settings;

pub use driver::*;
pub use lines::{decode_line, decoded_lines, DecodedLines};
pub use row::{
    parse_balance, parse_with_auto_config, parse_with_manual_config, ParsedRow, RowOutcome,
};
pub use schema::*;
pub use settings::*;
