//! Money parsing and display in integer minor units

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Explicit money convention threaded through parsing and display
///
/// `grouping` lists digit group sizes from the decimal point leftwards; the
/// last size repeats. `[3, 2]` gives South Asian grouping (`12,34,567.89`),
/// `[3]` gives Western grouping (`1,234,567.89`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoneyFormat {
    pub decimal_point: char,
    pub separator: char,
    pub grouping: Vec<u8>,
    pub frac_digits: u32,
}

impl Default for MoneyFormat {
    fn default() -> Self {
        Self::indian()
    }
}

impl MoneyFormat {
    /// Indian numbering: thousands grouped 3-then-2, two fraction digits
    pub fn indian() -> Self {
        Self {
            decimal_point: '.',
            separator: ',',
            grouping: vec![3, 2],
            frac_digits: 2,
        }
    }

    /// Western numbering: groups of three, two fraction digits
    pub fn western() -> Self {
        Self {
            grouping: vec![3],
            ..Self::indian()
        }
    }

    /// Number of minor units in one major unit
    pub fn scale(&self) -> i64 {
        10i64.pow(self.frac_digits)
    }

    /// Parse a monetary string into minor units
    ///
    /// Text without any digit is zero. Currency markers around the number are
    /// ignored, a leading `-` or surrounding parentheses negate, and extra
    /// fraction digits are rounded half-up.
    pub fn parse_minor(&self, raw: &str) -> ParseResult<i64> {
        let trimmed = raw.trim();
        if !trimmed.chars().any(|c| c.is_ascii_digit()) {
            return Ok(0);
        }

        let mut negative = false;
        let mut body = trimmed;
        if body.starts_with('(') && body.ends_with(')') {
            negative = true;
            body = &body[1..body.len() - 1];
        }

        let body = self.numeric_span(body);
        let body = if let Some(rest) = body.strip_prefix('-') {
            negative = !negative;
            rest
        } else {
            body.strip_prefix('+').unwrap_or(body)
        };

        let mut parts = body.split(self.decimal_point);
        let int_part = parts.next().unwrap_or("");
        let frac_part = parts.next().unwrap_or("");
        if parts.next().is_some() {
            return Err(ParseError::AmountFormat(format!(
                "more than one decimal point in '{}'",
                raw
            )));
        }

        let mut units: i64 = 0;
        for c in int_part.chars() {
            if c == self.separator {
                continue;
            }
            let digit = c.to_digit(10).ok_or_else(|| {
                ParseError::AmountFormat(format!("unexpected character '{}' in '{}'", c, raw))
            })?;
            units = units
                .checked_mul(10)
                .and_then(|u| u.checked_add(i64::from(digit)))
                .ok_or_else(|| ParseError::AmountFormat(format!("amount too large: '{}'", raw)))?;
        }

        let mut fraction: i64 = 0;
        let mut round_up = false;
        for (i, c) in frac_part.chars().enumerate() {
            let digit = c.to_digit(10).ok_or_else(|| {
                ParseError::AmountFormat(format!("unexpected character '{}' in '{}'", c, raw))
            })?;
            let i = i as u32;
            if i < self.frac_digits {
                fraction = fraction * 10 + i64::from(digit);
            } else if i == self.frac_digits {
                round_up = digit >= 5;
            }
        }
        let given = frac_part.chars().count() as u32;
        if given < self.frac_digits {
            fraction *= 10i64.pow(self.frac_digits - given);
        }

        let minor = units
            .checked_mul(self.scale())
            .and_then(|m| m.checked_add(fraction))
            .and_then(|m| m.checked_add(i64::from(round_up)))
            .ok_or_else(|| ParseError::AmountFormat(format!("amount too large: '{}'", raw)))?;

        Ok(if negative { -minor } else { minor })
    }

    /// Format minor units with this convention's grouping, e.g. `12,34,567.89`
    pub fn format_minor(&self, minor: i64) -> String {
        let magnitude = minor.unsigned_abs();
        let scale = self.scale().unsigned_abs();
        let digits = (magnitude / scale).to_string();

        let mut groups: Vec<&str> = Vec::new();
        let mut end = digits.len();
        let mut sizes = self.grouping.iter().copied().filter(|s| *s > 0);
        let mut size = sizes.next().map(usize::from);
        while let Some(width) = size {
            if end <= width {
                break;
            }
            groups.push(&digits[end - width..end]);
            end -= width;
            if let Some(next) = sizes.next() {
                size = Some(usize::from(next));
            }
        }
        groups.push(&digits[..end]);
        groups.reverse();

        let mut out = String::new();
        if minor < 0 {
            out.push('-');
        }
        out.push_str(&groups.join(&self.separator.to_string()));
        if self.frac_digits > 0 {
            out.push(self.decimal_point);
            out.push_str(&format!(
                "{:0width$}",
                magnitude % scale,
                width = self.frac_digits as usize
            ));
        }
        out
    }

    /// Convert minor units into a major-unit decimal for reporting
    pub fn to_major(&self, minor: i64) -> BigDecimal {
        BigDecimal::from(minor) / BigDecimal::from(self.scale())
    }

    /// Slice from the first character that can start a number to the last digit
    fn numeric_span<'a>(&self, s: &'a str) -> &'a str {
        let chars: Vec<(usize, char)> = s.char_indices().collect();
        let start = chars
            .iter()
            .enumerate()
            .find(|(i, (_, c))| {
                c.is_ascii_digit()
                    || *c == '-'
                    || *c == '+'
                    || (*c == self.decimal_point
                        && chars.get(i + 1).is_some_and(|(_, n)| n.is_ascii_digit()))
            })
            .map(|(_, (pos, _))| *pos)
            .unwrap_or(0);
        let end = s
            .char_indices()
            .filter(|(_, c)| c.is_ascii_digit())
            .last()
            .map(|(pos, c)| pos + c.len_utf8())
            .unwrap_or(s.len());
        if start >= end {
            return "";
        }
        &s[start..end]
    }
}
