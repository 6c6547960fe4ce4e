//! Streaming CSV to SQL INSERT transcoder.
//!
//! Reads a header-delimited CSV stream once, classifies every field, and
//! writes one multi-row `INSERT` statement per batch. Memory use is bounded
//! by a single batch regardless of input size.
//!
//! # Example
//!
//! ```
//! use csvsql::transcode::{convert, ConvertOptions};
//!
//! let csv = "id,name\n1,Anne\n2,O'Brien\n";
//! let mut out = Vec::new();
//! let summary = convert(csv.as_bytes(), "people", &mut out, &ConvertOptions::default()).unwrap();
//!
//! assert_eq!(summary.row_count, 2);
//! assert_eq!(
//!     String::from_utf8(out).unwrap(),
//!     "INSERT INTO `people` (`id`, `name`) VALUES\n(1, 'Anne'),\n(2, 'O''Brien');\n"
//! );
//! ```

pub mod batch;
pub mod classify;
mod quotes;

use std::io::{BufRead, BufReader, Cursor, Read, Write};

use serde::Serialize;

use crate::error::{ConvertError, ConvertResult};

pub use batch::{BatchWriter, DEFAULT_BATCH_SIZE};
pub use classify::{classify, quote_text, EncodedValue};

use quotes::QuoteTracker;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Options for a single conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Rows per INSERT statement (0 is treated as 1)
    pub batch_size: usize,

    /// Field delimiter byte
    pub delimiter: u8,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            delimiter: b',',
        }
    }
}

impl ConvertOptions {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

/// What a conversion produced.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertSummary {
    /// Column names in header order
    pub columns: Vec<String>,
    /// Data rows converted
    pub row_count: usize,
    /// INSERT statements written
    pub batch_count: usize,
}

/// Convert a CSV stream into batched INSERT statements for `table`.
///
/// The first line is the header. Fails with [`ConvertError::NoColumns`]
/// before writing anything when the input is empty or starts with a blank
/// line. A first line holding only whitespace counts as blank.
///
/// A quoted field still open at end of input is a
/// [`ConvertError::Parse`] reported at the line of its opening quote; the
/// row it swallowed is never written. Statements flushed before a later
/// error remain in `output`.
pub fn convert<R: Read, W: Write>(
    input: R,
    table: &str,
    output: W,
    options: &ConvertOptions,
) -> ConvertResult<ConvertSummary> {
    let mut input = BufReader::new(input);

    // The CSV reader skips blank lines, so the first line is checked by hand
    // and then replayed in front of the rest of the stream.
    let mut first_line = Vec::new();
    input.read_until(b'\n', &mut first_line)?;
    if first_line.starts_with(UTF8_BOM) {
        first_line.drain(..UTF8_BOM.len());
    }
    if first_line.iter().all(u8::is_ascii_whitespace) {
        return Err(ConvertError::NoColumns);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(false)
        .delimiter(options.delimiter)
        .from_reader(QuoteTracker::new(
            Cursor::new(first_line).chain(input),
            options.delimiter,
        ));

    let mut record = csv::StringRecord::new();
    if !reader.read_record(&mut record)? {
        return Err(ConvertError::NoColumns);
    }
    check_quotes(reader.get_ref())?;
    let columns: Vec<String> = record.iter().map(str::to_string).collect();

    let mut writer = BatchWriter::new(output, table, &columns, options.batch_size);
    let mut encoded = Vec::with_capacity(columns.len());
    let mut row_count = 0;

    while reader.read_record(&mut record)? {
        check_quotes(reader.get_ref())?;
        encoded.clear();
        encoded.extend(record.iter().map(classify));
        writer.push_row(&encoded)?;
        row_count += 1;
    }

    let (_, batch_count) = writer.finish()?;

    Ok(ConvertSummary {
        columns,
        row_count,
        batch_count,
    })
}

fn check_quotes<R: Read>(tracker: &QuoteTracker<R>) -> ConvertResult<()> {
    match tracker.unterminated_quote() {
        Some(line) => Err(ConvertError::parse(line, "unterminated quoted field")),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(csv: &str, options: &ConvertOptions) -> ConvertResult<(String, ConvertSummary)> {
        let mut out = Vec::new();
        let summary = convert(csv.as_bytes(), "t", &mut out, options)?;
        Ok((String::from_utf8(out).unwrap(), summary))
    }

    fn numbered_rows(n: usize) -> String {
        let mut csv = String::from("n\n");
        for i in 0..n {
            csv.push_str(&format!("{}\n", i));
        }
        csv
    }

    #[test]
    fn test_mixed_values() {
        let csv = "id,name,score\n1,Anne,10\n,Bo O'Brien,\n";
        let (out, summary) = run(csv, &ConvertOptions::default()).unwrap();

        assert_eq!(
            out,
            "INSERT INTO `t` (`id`, `name`, `score`) VALUES\n\
             (1, 'Anne', 10),\n\
             (NULL, 'Bo O''Brien', NULL);\n"
        );
        assert_eq!(summary.columns, vec!["id", "name", "score"]);
        assert_eq!(summary.row_count, 2);
        assert_eq!(summary.batch_count, 1);
    }

    #[test]
    fn test_exactly_one_full_batch() {
        let (out, summary) = run(&numbered_rows(500), &ConvertOptions::default()).unwrap();
        assert_eq!(summary.batch_count, 1);
        assert_eq!(out.matches("INSERT INTO").count(), 1);
        assert_eq!(out.lines().count(), 501);
    }

    #[test]
    fn test_one_row_past_batch() {
        let (out, summary) = run(&numbered_rows(501), &ConvertOptions::default()).unwrap();
        assert_eq!(summary.batch_count, 2);
        let blocks: Vec<&str> = out.split_inclusive(";\n").collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].matches("),\n(").count(), 499);
        assert_eq!(blocks[1], "INSERT INTO `t` (`n`) VALUES\n(500);\n");
    }

    #[test]
    fn test_block_count_across_batch_sizes() {
        for batch_size in [1, 2, 3, 7, 10, 500] {
            for rows in [0, 1, 9, 10, 11, 25] {
                let options = ConvertOptions::default().with_batch_size(batch_size);
                let (out, summary) = run(&numbered_rows(rows), &options).unwrap();
                let expected = (rows + batch_size - 1) / batch_size;
                assert_eq!(summary.batch_count, expected, "rows={} batch={}", rows, batch_size);
                assert_eq!(out.matches("INSERT INTO").count(), expected);
            }
        }
    }

    #[test]
    fn test_row_order_preserved() {
        let options = ConvertOptions::default().with_batch_size(3);
        let (out, _) = run(&numbered_rows(10), &options).unwrap();
        let values: Vec<String> = out
            .lines()
            .filter(|l| l.starts_with('('))
            .map(|l| l.trim_end_matches([',', ';']).trim_matches(['(', ')']).to_string())
            .collect();
        let expected: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        assert_eq!(values, expected);
    }

    #[test]
    fn test_column_order_follows_header() {
        let options = ConvertOptions::default().with_batch_size(1);
        let (out, _) = run("z,a,m\nx,1,\ny,2,q\n", &options).unwrap();
        for block in out.split_inclusive(";\n") {
            assert!(block.starts_with("INSERT INTO `t` (`z`, `a`, `m`) VALUES\n"));
        }
        assert!(out.contains("('x', 1, NULL);"));
        assert!(out.contains("('y', 2, 'q');"));
    }

    #[test]
    fn test_header_only_writes_nothing() {
        let (out, summary) = run("id,name\n", &ConvertOptions::default()).unwrap();
        assert!(out.is_empty());
        assert_eq!(summary.batch_count, 0);
        assert_eq!(summary.columns.len(), 2);
    }

    #[test]
    fn test_empty_input_has_no_columns() {
        let err = run("", &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, ConvertError::NoColumns));
    }

    #[test]
    fn test_blank_first_line_has_no_columns() {
        for csv in ["\nid,name\n1,a\n", "\r\nid\n1\n", "   \nid\n"] {
            let mut out = Vec::new();
            let err = convert(csv.as_bytes(), "t", &mut out, &ConvertOptions::default()).unwrap_err();
            assert!(matches!(err, ConvertError::NoColumns));
            assert!(out.is_empty());
        }
    }

    #[test]
    fn test_bom_stripped_from_header() {
        let (out, summary) = run("\u{feff}id\n1\n", &ConvertOptions::default()).unwrap();
        assert_eq!(summary.columns, vec!["id"]);
        assert!(out.starts_with("INSERT INTO `t` (`id`)"));
    }

    #[test]
    fn test_field_count_mismatch_is_parse_error() {
        let err = run("a,b\n1,2\n3\n", &ConvertOptions::default()).unwrap_err();
        match err {
            ConvertError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_flushed_batches_survive_later_error() {
        let options = ConvertOptions::default().with_batch_size(1);
        let mut out = Vec::new();
        let result = convert("a,b\n1,2\n3\n".as_bytes(), "t", &mut out, &options);
        assert!(result.is_err());
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "INSERT INTO `t` (`a`, `b`) VALUES\n(1, 2);\n"
        );
    }

    #[test]
    fn test_unterminated_quote_is_parse_error() {
        let mut out = Vec::new();
        let err = convert(
            "a,b\n1,\"x\n2,3\n".as_bytes(),
            "t",
            &mut out,
            &ConvertOptions::default(),
        )
        .unwrap_err();
        match err {
            ConvertError::Parse { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("unterminated"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(out.is_empty());
    }

    #[test]
    fn test_unterminated_quote_keeps_earlier_batches() {
        let options = ConvertOptions::default().with_batch_size(1);
        let mut out = Vec::new();
        let err = convert("a\n1\n\"open\n2\n".as_bytes(), "t", &mut out, &options).unwrap_err();
        assert!(matches!(err, ConvertError::Parse { line: 3, .. }));
        assert_eq!(String::from_utf8(out).unwrap(), "INSERT INTO `t` (`a`) VALUES\n(1);\n");
    }

    #[test]
    fn test_unterminated_quote_in_header() {
        let err = run("\"a,b\n1,2\n", &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, ConvertError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_unterminated_quote_with_custom_delimiter() {
        let options = ConvertOptions::default().with_delimiter(b';');
        let err = run("a;b\n1;\"x\n", &options).unwrap_err();
        assert!(matches!(err, ConvertError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_quoted_fields() {
        let csv = "name,note\n\"Smith, J\",\"said \"\"hi\"\"\"\n\"multi\nline\",x\n";
        let (out, summary) = run(csv, &ConvertOptions::default()).unwrap();
        assert_eq!(summary.row_count, 2);
        assert!(out.contains("('Smith, J', 'said \"hi\"')"));
        assert!(out.contains("('multi\nline', 'x')"));
    }

    #[test]
    fn test_blank_data_lines_skipped() {
        let (_, summary) = run("a\n1\n\n2\n", &ConvertOptions::default()).unwrap();
        assert_eq!(summary.row_count, 2);
    }

    #[test]
    fn test_custom_delimiter() {
        let options = ConvertOptions::default().with_delimiter(b';');
        let (out, _) = run("a;b\n1;x,y\n", &options).unwrap();
        assert!(out.contains("(1, 'x,y')"));
    }

    #[test]
    fn test_write_failure_is_io_error() {
        struct FailingSink;
        impl Write for FailingSink {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "sink closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let err = convert("a\n1\n".as_bytes(), "t", FailingSink, &ConvertOptions::default())
            .unwrap_err();
        assert!(matches!(err, ConvertError::Io(_)));
    }
}
