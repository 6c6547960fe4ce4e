//! Server configuration.
//!
//! Built once at startup and handed to the router as shared state.

use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ConfigError;
use crate::transcode::{ConvertOptions, DEFAULT_BATCH_SIZE};

/// Table name used when an upload does not name one
pub const DEFAULT_TABLE: &str = "tabla";

/// 50 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Runtime settings for the HTTP server
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Where raw uploads are stored
    pub upload_dir: PathBuf,
    /// Where generated `.sql` files are written
    pub output_dir: PathBuf,
    /// Request body limit
    pub max_upload_bytes: usize,
    pub default_table: String,
    pub batch_size: usize,
    /// Use the sniffed delimiter instead of a comma
    pub auto_delimiter: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 10000,
            upload_dir: PathBuf::from("uploads"),
            output_dir: PathBuf::from("output"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            default_table: DEFAULT_TABLE.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            auto_delimiter: false,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `CSVSQL_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(host) = lookup("CSVSQL_HOST") {
            config.host = host;
        }
        if let Some(port) = parse_var(&lookup, "CSVSQL_PORT")? {
            config.port = port;
        }
        if let Some(dir) = lookup("CSVSQL_UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("CSVSQL_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(limit) = parse_var(&lookup, "CSVSQL_MAX_UPLOAD_BYTES")? {
            config.max_upload_bytes = limit;
        }
        if let Some(table) = lookup("CSVSQL_DEFAULT_TABLE") {
            config.default_table = table;
        }
        if let Some(batch_size) = parse_var(&lookup, "CSVSQL_BATCH_SIZE")? {
            config.batch_size = batch_size;
        }
        if let Some(auto) = parse_var(&lookup, "CSVSQL_AUTO_DELIMITER")? {
            config.auto_delimiter = auto;
        }

        Ok(config)
    }

    /// Create the upload and output directories if missing.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.upload_dir)?;
        std::fs::create_dir_all(&self.output_dir)
    }

    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions::default().with_batch_size(self.batch_size)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) => {
            let parsed = value.trim().parse();
            parsed.map(Some).map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 10000);
        assert_eq!(config.max_upload_bytes, 50 * 1024 * 1024);
        assert_eq!(config.default_table, "tabla");
        assert_eq!(config.batch_size, 500);
        assert!(!config.auto_delimiter);
    }

    #[test]
    fn test_env_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("CSVSQL_PORT", "8080"),
            ("CSVSQL_OUTPUT_DIR", "/tmp/sql"),
            ("CSVSQL_BATCH_SIZE", "100"),
            ("CSVSQL_AUTO_DELIMITER", "true"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/sql"));
        assert_eq!(config.convert_options().batch_size, 100);
        assert!(config.auto_delimiter);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
    }

    #[test]
    fn test_convert_options_follow_config() {
        let config = ServerConfig {
            batch_size: 25,
            ..ServerConfig::default()
        };
        assert_eq!(
            config.convert_options(),
            ConvertOptions::default().with_batch_size(25)
        );
        assert_eq!(config.convert_options().delimiter, b',');
    }

    #[test]
    fn test_invalid_number_rejected() {
        let err = ServerConfig::from_lookup(lookup(&[("CSVSQL_PORT", "http")])).unwrap_err();
        assert!(err.to_string().contains("CSVSQL_PORT"));
    }

    #[test]
    fn test_ensure_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            upload_dir: dir.path().join("in"),
            output_dir: dir.path().join("out"),
            ..ServerConfig::default()
        };
        config.ensure_dirs().unwrap();
        assert!(config.upload_dir.is_dir());
        assert!(config.output_dir.is_dir());
    }
}
