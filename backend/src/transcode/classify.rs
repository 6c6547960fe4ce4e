//! Literal encoding of a single CSV field.

use std::fmt;

/// SQL literal form of one raw field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedValue {
    /// Empty field, rendered as `NULL`.
    Null,
    /// Non-empty field made only of ASCII digits, rendered verbatim.
    Numeric(String),
    /// Anything else, already wrapped in single quotes with `'` doubled.
    QuotedText(String),
}

/// Classify a raw field value.
///
/// Only unsigned digit strings count as numeric: `-5` and `3.14` become
/// quoted text, and `007` is emitted as the bare token `007`.
pub fn classify(raw: &str) -> EncodedValue {
    if raw.is_empty() {
        EncodedValue::Null
    } else if raw.bytes().all(|b| b.is_ascii_digit()) {
        EncodedValue::Numeric(raw.to_string())
    } else {
        EncodedValue::QuotedText(quote_text(raw))
    }
}

/// Wrap `raw` in single quotes, doubling every embedded quote.
pub fn quote_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('\'');
    for c in raw.chars() {
        if c == '\'' {
            out.push('\'');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

impl EncodedValue {
    pub fn as_sql(&self) -> &str {
        match self {
            EncodedValue::Null => "NULL",
            EncodedValue::Numeric(s) | EncodedValue::QuotedText(s) => s,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            EncodedValue::Null => "null",
            EncodedValue::Numeric(_) => "numeric",
            EncodedValue::QuotedText(_) => "text",
        }
    }
}

impl fmt::Display for EncodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}
