//! # csvsql - CSV to SQL INSERT scripts
//!
//! csvsql turns an uploaded CSV file into a script of batched
//! `INSERT INTO` statements that recreate the same rows in a table.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Upload    │────▶│   Sniffer   │────▶│ Transcoder  │────▶│  table.sql  │
//! │  (ISO/UTF8) │     │ (enc/delim) │     │ (batches)   │     │ (download)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use csvsql::{convert, ConvertOptions};
//!
//! let mut sql = Vec::new();
//! let summary = convert("id,name\n1,Anne\n".as_bytes(), "people", &mut sql, &ConvertOptions::default()).unwrap();
//! assert_eq!(summary.batch_count, 1);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types
//! - [`transcode`] - Field classification and batched INSERT generation
//! - [`parser`] - Encoding and delimiter sniffing for uploads
//! - [`pipeline`] - CSV file or upload to `.sql` artifact
//! - [`config`] - Server configuration
//! - [`api`] - HTTP API server
//!
//! ## Known limitations
//!
//! Only unsigned digit strings are emitted as numbers; `-5` and `3.14` are
//! quoted text and `007` is emitted as `007`. Table and column names are
//! wrapped in backticks without escaping.

// Core modules
pub mod error;
pub mod transcode;

// Input handling
pub mod parser;
pub mod pipeline;

// HTTP API
pub mod api;
pub mod config;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ConfigError, ConvertError, PipelineError, ServerError};

// =============================================================================
// Re-exports - Transcoder
// =============================================================================

pub use transcode::{
    classify,
    convert,
    BatchWriter,
    ConvertOptions,
    ConvertSummary,
    EncodedValue,
    DEFAULT_BATCH_SIZE,
};

// =============================================================================
// Re-exports - Sniffing
// =============================================================================

pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    sniff,
    SniffedInput,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use pipeline::{
    artifact_name, generate_sql_bytes, generate_sql_file, generate_sql_upload, GeneratedSql,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, ConversionMetadata, ConversionResponse};
pub use config::ServerConfig;

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}
