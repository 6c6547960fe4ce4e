//! File-level driver around the transcoder.
//!
//! Derives the artifact name from the destination table, opens the output
//! file and streams the conversion into it. An existing artifact with the
//! same name is overwritten; concurrent conversions to the same table race
//! and the last writer wins.
//!
//! # Example
//!
//! ```rust,ignore
//! use csvsql::pipeline::generate_sql_file;
//! use csvsql::transcode::ConvertOptions;
//!
//! let generated = generate_sql_file(
//!     "people.csv".as_ref(),
//!     "people",
//!     "output".as_ref(),
//!     &ConvertOptions::default(),
//! )?;
//! println!("{} rows -> {}", generated.summary.row_count, generated.path.display());
//! ```

use std::fs::{self, File};
use std::io::{BufWriter, Read};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::DEFAULT_TABLE;
use crate::error::PipelineResult;
use crate::parser::sniff;
use crate::transcode::{convert, ConvertOptions, ConvertSummary};

/// A written `.sql` artifact
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedSql {
    /// Full path of the artifact
    pub path: PathBuf,
    /// File name inside the output directory
    pub file_name: String,
    pub summary: ConvertSummary,
    /// Encoding of the source data
    pub encoding: String,
    pub delimiter: u8,
}

/// File name for the artifact of `table`.
///
/// Keeps ASCII alphanumerics, `-`, `_` and `.`, maps everything else to `_`,
/// collapses runs of dots and strips dots at both ends, so the name never
/// contains `..`. The SQL itself still uses `table` verbatim.
pub fn artifact_name(table: &str) -> String {
    let mut stem = String::with_capacity(table.len());
    for c in table.chars() {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
            c
        } else {
            '_'
        };
        if c == '.' && stem.ends_with('.') {
            continue;
        }
        stem.push(c);
    }
    let stem = stem.trim_matches('.');

    if stem.is_empty() {
        format!("{}.sql", DEFAULT_TABLE)
    } else {
        format!("{}.sql", stem)
    }
}

/// Convert the CSV file at `csv_path` into `<output_dir>/<table>.sql`.
pub fn generate_sql_file(
    csv_path: &Path,
    table: &str,
    output_dir: &Path,
    options: &ConvertOptions,
) -> PipelineResult<GeneratedSql> {
    let input = File::open(csv_path)?;
    generate_sql(input, table, output_dir, options, "utf-8".to_string())
}

/// Convert uploaded bytes, re-encoding them to UTF-8 first.
///
/// With `auto_delimiter` the sniffed delimiter replaces `options.delimiter`.
pub fn generate_sql_bytes(
    bytes: &[u8],
    table: &str,
    output_dir: &Path,
    options: &ConvertOptions,
    auto_delimiter: bool,
) -> PipelineResult<GeneratedSql> {
    let sniffed = sniff(bytes);
    let mut options = options.clone();
    if auto_delimiter {
        options.delimiter = sniffed.delimiter;
    }

    generate_sql(
        sniffed.content.as_bytes(),
        table,
        output_dir,
        &options,
        sniffed.encoding,
    )
}

/// Convert an upload previously stored at `upload_path`.
///
/// Same as [`generate_sql_bytes`] on the file's contents.
pub fn generate_sql_upload(
    upload_path: &Path,
    table: &str,
    output_dir: &Path,
    options: &ConvertOptions,
    auto_delimiter: bool,
) -> PipelineResult<GeneratedSql> {
    let bytes = fs::read(upload_path)?;
    generate_sql_bytes(&bytes, table, output_dir, options, auto_delimiter)
}

fn generate_sql<R: Read>(
    input: R,
    table: &str,
    output_dir: &Path,
    options: &ConvertOptions,
    encoding: String,
) -> PipelineResult<GeneratedSql> {
    fs::create_dir_all(output_dir)?;

    let file_name = artifact_name(table);
    let path = output_dir.join(&file_name);
    let output = BufWriter::new(File::create(&path)?);

    let summary = convert(input, table, output, options)?;

    Ok(GeneratedSql {
        path,
        file_name,
        summary,
        encoding,
        delimiter: options.delimiter,
    })
}
