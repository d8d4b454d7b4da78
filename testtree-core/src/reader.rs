// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Line-oriented reading of event streams.

use bstr::ByteSlice;
use std::io::{self, BufRead};

/// Reads an event stream one line at a time.
///
/// Lines are returned without their trailing `\n` or `\r\n`. Lines that contain only ASCII
/// whitespace are skipped, but still counted towards [`line_number`](Self::line_number).
#[derive(Debug)]
pub struct LineReader<R> {
    reader: R,
    line_buf: Vec<u8>,
    line_number: usize,
}

impl<R: BufRead> LineReader<R> {
    /// Creates a new `LineReader` wrapping `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_buf: Vec::new(),
            line_number: 0,
        }
    }

    /// Returns the 1-based line number of the line most recently returned by
    /// [`next_line`](Self::next_line), or of the line being read when it returned an error.
    ///
    /// Returns 0 before the first line has been read.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Returns the next non-blank line, `None` at the end of the stream, or the error produced by
    /// the underlying reader.
    pub fn next_line(&mut self) -> Option<io::Result<&[u8]>> {
        loop {
            self.line_buf.clear();
            self.line_number += 1;

            match self.reader.read_until(b'\n', &mut self.line_buf) {
                Ok(0) => {
                    // No line was read, so don't count it.
                    self.line_number -= 1;
                    return None;
                }
                Ok(_) => {
                    let line = self.line_buf.trim_end_with(|c| c == '\n' || c == '\r');
                    let (len, is_blank) = (line.len(), line.trim_ascii().is_empty());
                    if is_blank {
                        continue;
                    }
                    return Some(Ok(&self.line_buf[..len]));
                }
                Err(error) => return Some(Err(error)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::FailAfter;
    use std::io::BufReader;

    fn read_all(input: &[u8]) -> Vec<(usize, String)> {
        let mut reader = LineReader::new(input);
        let mut lines = Vec::new();
        while let Some(line) = reader.next_line() {
            let line = line.expect("reading from a slice succeeds").to_str_lossy().into_owned();
            lines.push((reader.line_number(), line));
        }
        lines
    }

    #[test]
    fn strips_line_endings() {
        assert_eq!(
            read_all(b"a\nb\r\nc"),
            vec![
                (1, "a".to_owned()),
                (2, "b".to_owned()),
                (3, "c".to_owned())
            ]
        );
    }

    #[test]
    fn skips_blank_lines_but_counts_them() {
        assert_eq!(
            read_all(b"\n  \t\nfirst\n\r\n\nsecond\n\n"),
            vec![(3, "first".to_owned()), (6, "second".to_owned())]
        );
    }

    #[test]
    fn empty_input() {
        let mut reader = LineReader::new(&b""[..]);
        assert!(reader.next_line().is_none());
        assert_eq!(reader.line_number(), 0);
    }

    #[test]
    fn read_error_reports_line_number() {
        let mut reader = LineReader::new(BufReader::new(FailAfter {
            data: b"one\ntwo\n",
        }));
        assert_eq!(reader.next_line().unwrap().unwrap(), b"one");
        assert_eq!(reader.next_line().unwrap().unwrap(), b"two");
        let error = reader
            .next_line()
            .expect("an error is returned")
            .expect_err("reading fails");
        assert_eq!(error.to_string(), "stream closed");
        assert_eq!(reader.line_number(), 3);
    }
}
