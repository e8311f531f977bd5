use std::path::PathBuf;

use thiserror::Error;

/// Failure at the ingestion boundary. The whole session has no channels
/// when one of these occurs; nothing inside the parser produces them.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("HTTP error: status {0}")]
    Status(u16),

    #[error("read failed: {0}")]
    Read(String),

    #[error("cannot read {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
