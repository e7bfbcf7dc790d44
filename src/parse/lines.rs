//! Line reading for exports that are not always UTF-8

use std::io::{self, BufRead};

/// Lines of a reader, decoded one at a time
///
/// A line that is not valid UTF-8 is decoded as Windows-1252, the usual
/// encoding of spreadsheet exports. Line endings (`\n` or `\r\n`) are removed.
#[derive(Debug)]
pub struct DecodedLines<R> {
    reader: R,
    buf: Vec<u8>,
}

pub fn decoded_lines<R: BufRead>(reader: R) -> DecodedLines<R> {
    DecodedLines {
        reader,
        buf: Vec::new(),
    }
}

impl<R: BufRead> Iterator for DecodedLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                }
                if self.buf.last() == Some(&b'\r') {
                    self.buf.pop();
                }
                Some(Ok(decode_line(&self.buf)))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Decode one line as UTF-8, falling back to Windows-1252
pub fn decode_line(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}
