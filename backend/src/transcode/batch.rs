//! Bounded accumulation of encoded rows, flushed as multi-row INSERT blocks.

use std::io::Write;

use super::classify::EncodedValue;

/// Default number of rows per INSERT statement.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Collects encoded row tuples and writes one INSERT block per full batch.
///
/// Table and column names are wrapped in backticks without escaping, so
/// names containing a backtick produce invalid SQL.
pub struct BatchWriter<W: Write> {
    sink: W,
    /// `INSERT INTO ... VALUES\n`, rendered once per conversion
    prefix: String,
    rows: Vec<String>,
    capacity: usize,
    blocks_written: usize,
}

impl<W: Write> BatchWriter<W> {
    /// A capacity of 0 is treated as 1.
    pub fn new<S: AsRef<str>>(sink: W, table: &str, columns: &[S], capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let column_list = columns
            .iter()
            .map(|c| format!("`{}`", c.as_ref()))
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            sink,
            prefix: format!("INSERT INTO `{}` ({}) VALUES\n", table, column_list),
            rows: Vec::with_capacity(capacity.min(DEFAULT_BATCH_SIZE)),
            capacity,
            blocks_written: 0,
        }
    }

    /// Append one row; writes the batch out when it reaches capacity.
    pub fn push_row(&mut self, values: &[EncodedValue]) -> std::io::Result<()> {
        let tuple = values
            .iter()
            .map(EncodedValue::as_sql)
            .collect::<Vec<_>>()
            .join(", ");
        self.rows.push(format!("({})", tuple));

        if self.rows.len() >= self.capacity {
            self.flush_batch()?;
        }
        Ok(())
    }

    /// Write the pending rows as one INSERT block. No-op when empty.
    pub fn flush_batch(&mut self) -> std::io::Result<()> {
        if self.rows.is_empty() {
            return Ok(());
        }

        self.sink.write_all(self.prefix.as_bytes())?;
        self.sink.write_all(self.rows.join(",\n").as_bytes())?;
        self.sink.write_all(b";\n")?;
        self.rows.clear();
        self.blocks_written += 1;
        Ok(())
    }

    pub fn pending(&self) -> usize {
        self.rows.len()
    }

    pub fn blocks_written(&self) -> usize {
        self.blocks_written
    }

    /// Flush the final partial batch and hand back the sink.
    pub fn finish(mut self) -> std::io::Result<(W, usize)> {
        self.flush_batch()?;
        self.sink.flush()?;
        Ok((self.sink, self.blocks_written))
    }
}
