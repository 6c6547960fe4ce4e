//! HTTP Server for csvsql.
//!
//! Accepts CSV uploads, converts them into `.sql` artifacts on disk and
//! serves those artifacts back for download.
//!
//! # API Endpoints
//!
//! | Method | Path                   | Description                                  |
//! |--------|------------------------|----------------------------------------------|
//! | GET    | `/`                    | Upload form                                  |
//! | GET    | `/health`              | Health check                                 |
//! | POST   | `/upload`              | Form upload, redirects to the download       |
//! | POST   | `/api/upload`          | Upload returning a JSON conversion report    |
//! | GET    | `/download/{filename}` | Download a generated `.sql` file             |
//! | GET    | `/api/logs`            | SSE stream for real-time logs                |

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Html, IntoResponse, Json, Redirect, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use super::logs::{log_info, log_success, JobLog, LOG_BROADCASTER};
use super::types::{download_url, error_response, ConversionResponse};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::parser::format_delimiter;
use crate::pipeline::{generate_sql_upload, GeneratedSql};

type SharedConfig = Arc<ServerConfig>;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>CSV to SQL</title>
</head>
<body>
  <h1>CSV to SQL</h1>
  <form action="/upload" method="post" enctype="multipart/form-data">
    <p><label>CSV file <input type="file" name="file" accept=".csv,text/csv" required></label></p>
    <p><label>Table name <input type="text" name="table_name" placeholder="tabla"></label></p>
    <p><button type="submit">Generate SQL</button></p>
  </form>
</body>
</html>
"#;

/// Build the router with its shared configuration.
pub fn router(config: SharedConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/upload", post(upload_form))
        .route("/api/upload", post(upload_api))
        .route("/download/{filename}", get(download))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
        .with_state(config)
}

/// Start the HTTP server
pub async fn start_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.ensure_dirs()?;

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log_success(format!("csvsql server running on http://{}", addr));
    log_info(format!("Uploads: {}", config.upload_dir.display()));
    log_info(format!("Output:  {}", config.output_dir.display()));
    log_info("POST /upload       - Upload CSV (form, redirects to download)");
    log_info("POST /api/upload   - Upload CSV (JSON report)");
    log_info("GET  /download/:f  - Download generated SQL");
    log_info("GET  /api/logs     - SSE log stream");

    axum::serve(listener, router(Arc::new(config))).await?;

    Ok(())
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Pipeline(e) if e.is_input_error() => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Pipeline(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(error_response(&self.to_string()))).into_response()
    }
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "csvsql",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "POST /upload",
            "apiUpload": "POST /api/upload",
            "download": "GET /download/{filename}",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Form upload: converts, then redirects to the artifact
async fn upload_form(
    State(config): State<SharedConfig>,
    multipart: Multipart,
) -> ServerResult<Redirect> {
    let upload = read_upload(multipart).await?;
    let converted = convert_upload(&config, upload).await?;
    let generated = converted.generated;
    Ok(Redirect::to(&download_url(&generated.file_name)))
}

/// JSON upload: converts and reports what was generated
async fn upload_api(
    State(config): State<SharedConfig>,
    multipart: Multipart,
) -> ServerResult<Json<ConversionResponse>> {
    let upload = read_upload(multipart).await?;
    let converted = convert_upload(&config, upload).await?;
    Ok(Json(ConversionResponse::new(
        converted.job.job_id().to_string(),
        &converted.table,
        converted.generated,
    )))
}

/// Serve a generated artifact as an attachment
async fn download(
    State(config): State<SharedConfig>,
    Path(filename): Path<String>,
) -> ServerResult<impl IntoResponse> {
    if !is_plain_file_name(&filename) {
        return Err(ServerError::BadRequest(format!(
            "Invalid file name: {}",
            filename
        )));
    }

    let path = config.output_dir.join(&filename);
    let body = match tokio::fs::read(&path).await {
        Ok(body) => body,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ServerError::NotFound(filename));
        }
        Err(e) => return Err(ServerError::Internal(e.to_string())),
    };

    let headers = [
        (header::CONTENT_TYPE, "application/sql; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];
    Ok((headers, body))
}

/// Multipart fields of an upload
struct Upload {
    file_name: String,
    bytes: Vec<u8>,
    /// `None` when the form left the table name blank
    table: Option<String>,
}

async fn read_upload(mut multipart: Multipart) -> ServerResult<Upload> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut table: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some((file_name, bytes.to_vec()));
            }
            "table_name" => {
                let value = field.text().await.map_err(multipart_error)?;
                let value = value.trim();
                if !value.is_empty() {
                    table = Some(value.to_string());
                }
            }
            _ => {}
        }
    }

    let (file_name, bytes) =
        file.ok_or_else(|| ServerError::BadRequest("No file provided".to_string()))?;
    if file_name.trim().is_empty() {
        return Err(ServerError::BadRequest("Uploaded file has no name".to_string()));
    }

    Ok(Upload {
        file_name,
        bytes,
        table,
    })
}

fn multipart_error(e: MultipartError) -> ServerError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge(e.body_text())
    } else {
        ServerError::BadRequest(format!("Multipart error: {}", e.body_text()))
    }
}

/// Outcome of a successful upload conversion
struct ConvertedUpload {
    job: JobLog,
    table: String,
    generated: GeneratedSql,
}

/// Store the raw upload, then convert the stored file on the blocking pool.
async fn convert_upload(config: &ServerConfig, upload: Upload) -> ServerResult<ConvertedUpload> {
    let job = JobLog::new(Uuid::new_v4().to_string());
    let table = upload
        .table
        .unwrap_or_else(|| config.default_table.clone());

    job.info(format!(
        "📄 New upload: {} ({} bytes) -> table `{}`",
        upload.file_name,
        upload.bytes.len(),
        table
    ));

    let stored = config.upload_dir.join(stored_upload_name(&upload.file_name));
    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?;
    tokio::fs::write(&stored, &upload.bytes)
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?;
    job.info(format!("Saved upload to {}", stored.display()));

    let output_dir = config.output_dir.clone();
    let options = config.convert_options();
    let auto_delimiter = config.auto_delimiter;
    let destination = table.clone();
    let result = tokio::task::spawn_blocking(move || {
        generate_sql_upload(&stored, &destination, &output_dir, &options, auto_delimiter)
    })
    .await
    .map_err(|e| ServerError::Internal(format!("Conversion task failed: {}", e)))?;

    let generated = match result {
        Ok(generated) => generated,
        Err(e) => {
            job.error(format!("Conversion failed: {}", e));
            return Err(e.into());
        }
    };

    job.success(format!("Detected encoding: {}", generated.encoding));
    job.success(format!(
        "Delimiter: '{}'",
        format_delimiter(generated.delimiter)
    ));
    job.info(format!("📋 {} columns:", generated.summary.columns.len()));
    for (i, col) in generated.summary.columns.iter().enumerate() {
        job.info_indent(format!("[{:2}] {}", i + 1, col), 1);
    }

    if generated.summary.row_count == 0 {
        job.warning("Header only, no INSERT statements written");
    } else {
        job.success(format!(
            "{} rows -> {} INSERT statements in {}",
            generated.summary.row_count,
            generated.summary.batch_count,
            generated.file_name
        ));
    }

    Ok(ConvertedUpload {
        job,
        table,
        generated,
    })
}

/// Final path component of a client-supplied file name.
fn stored_upload_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    match base.trim() {
        "" | "." | ".." => "upload.csv".to_string(),
        other => other.to_string(),
    }
}

/// True for names that stay inside the output directory.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}
