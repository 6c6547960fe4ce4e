//! REST API types.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::parser::format_delimiter;
use crate::pipeline::GeneratedSql;

/// Response of `POST /api/upload`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResponse {
    /// Unique job identifier, also used to tag log entries
    pub job_id: String,

    /// "ready" when rows were converted, "empty" for a header-only file
    pub status: String,

    /// Destination table, as embedded in the statements
    pub table: String,

    /// Artifact file name
    pub file: String,

    /// Relative URL of the artifact
    pub download_url: String,

    /// When the artifact was written (RFC 3339)
    pub created_at: String,

    pub metadata: ConversionMetadata,
}

/// Details about the converted upload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionMetadata {
    pub encoding: String,
    pub delimiter: String,
    pub columns: Vec<String>,
    pub row_count: usize,
    pub batch_count: usize,
}

impl ConversionResponse {
    pub fn new(job_id: String, table: &str, generated: GeneratedSql) -> Self {
        let status = if generated.summary.row_count == 0 {
            "empty"
        } else {
            "ready"
        };

        Self {
            job_id,
            status: status.to_string(),
            table: table.to_string(),
            download_url: download_url(&generated.file_name),
            file: generated.file_name,
            created_at: chrono::Utc::now().to_rfc3339(),
            metadata: ConversionMetadata {
                encoding: generated.encoding,
                delimiter: format_delimiter(generated.delimiter),
                columns: generated.summary.columns,
                row_count: generated.summary.row_count,
                batch_count: generated.summary.batch_count,
            },
        }
    }
}

/// Relative download URL for an artifact file name
pub fn download_url(file_name: &str) -> String {
    format!("/download/{}", file_name)
}

/// Create an error response body
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}
