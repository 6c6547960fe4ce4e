//! Quote tracking for the raw CSV byte stream.
//!
//! The `csv` crate reads a quote left open at end of input as one field
//! holding the rest of the stream. [`QuoteTracker`] watches the bytes on
//! their way to the reader and remembers where such a field started, so the
//! converter can reject it.

use std::io::{self, Read};

const QUOTE: u8 = b'"';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    FieldStart,
    Unquoted,
    Quoted,
    /// A quote seen inside a quoted field: either closing or the first half
    /// of a doubled quote.
    QuoteInQuoted,
}

/// Pass-through reader that follows RFC 4180 quoting.
#[derive(Debug)]
pub struct QuoteTracker<R> {
    inner: R,
    delimiter: u8,
    state: State,
    line: u64,
    open_line: u64,
    at_eof: bool,
}

impl<R: Read> QuoteTracker<R> {
    pub fn new(inner: R, delimiter: u8) -> Self {
        Self {
            inner,
            delimiter,
            state: State::FieldStart,
            line: 1,
            open_line: 1,
            at_eof: false,
        }
    }

    /// Line of the opening quote when the stream ended inside a quoted field.
    pub fn unterminated_quote(&self) -> Option<u64> {
        (self.at_eof && self.state == State::Quoted).then_some(self.open_line)
    }

    fn scan(&mut self, bytes: &[u8]) {
        for &b in bytes {
            if b == b'\n' {
                self.line += 1;
            }
            self.state = match self.state {
                State::Quoted => {
                    if b == QUOTE {
                        State::QuoteInQuoted
                    } else {
                        State::Quoted
                    }
                }
                State::QuoteInQuoted if b == QUOTE => State::Quoted,
                State::FieldStart if b == QUOTE => {
                    self.open_line = self.line;
                    State::Quoted
                }
                _ if b == self.delimiter || b == b'\n' || b == b'\r' => State::FieldStart,
                _ => State::Unquoted,
            };
        }
    }
}

impl<R: Read> Read for QuoteTracker<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 && !buf.is_empty() {
            self.at_eof = true;
        }
        self.scan(&buf[..n]);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(input: &str, delimiter: u8) -> Option<u64> {
        let mut tracker = QuoteTracker::new(input.as_bytes(), delimiter);
        io::copy(&mut tracker, &mut io::sink()).unwrap();
        tracker.unterminated_quote()
    }

    #[test]
    fn test_balanced_quotes() {
        assert_eq!(track("a,b\n\"x\",\"y\"\n", b','), None);
        assert_eq!(track("a\n\"two\nlines\"\n", b','), None);
        assert_eq!(track("a\n\"say \"\"hi\"\"\"\n", b','), None);
        assert_eq!(track("a\n\"\"\n", b','), None);
    }

    #[test]
    fn test_open_quote_reports_its_line() {
        assert_eq!(track("a,b\n1,\"x\n2,3\n", b','), Some(2));
        assert_eq!(track("a\n1\n2\n\"open", b','), Some(4));
    }

    #[test]
    fn test_quote_inside_unquoted_field_ignored() {
        assert_eq!(track("a,b\n5\"6,x\n", b','), None);
    }

    #[test]
    fn test_custom_delimiter() {
        assert_eq!(track("a;b\n1;\"x\n", b';'), Some(2));
        // With `;` as delimiter the comma does not start a field
        assert_eq!(track("a;b\n1,\"x;y\n", b';'), None);
    }

    #[test]
    fn test_not_reported_before_eof() {
        let mut tracker = QuoteTracker::new("a\n\"open".as_bytes(), b',');
        let mut buf = [0u8; 3];
        tracker.read(&mut buf).unwrap();
        assert_eq!(tracker.unterminated_quote(), None);
    }
}
