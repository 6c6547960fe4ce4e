//! HTTP API module.
//!
//! Upload, download and log-streaming endpoints around the pipeline.

pub mod logs;
pub mod server;
pub mod types;

pub use server::{router, start_server};
pub use types::*;
pub use logs::*;
