//! Error types for the digest pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Startup configuration failures. Fatal before any I/O.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing API credential: pass --api-key or set BREVO_API_KEY")]
    MissingCredential,
}

/// Failures while retrieving contacts. Any of these aborts the run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} at offset {offset} after {attempts} attempts")]
    RetriesExhausted {
        status: u16,
        attempts: u32,
        offset: usize,
    },
    #[error("HTTP {status} at offset {offset}\n{body}")]
    ClientError {
        status: u16,
        offset: usize,
        body: String,
    },
    #[error("malformed response at offset {offset}: {reason}")]
    MalformedResponse { offset: usize, reason: String },
    #[error("transport failure at offset {offset}: {reason}")]
    Transport { offset: usize, reason: String },
}

impl FetchError {
    /// Whether the failure came from running out of retries on a
    /// rate-limit or server error.
    pub fn is_transient_exhausted(&self) -> bool {
        matches!(self, FetchError::RetriesExhausted { .. })
    }
}

/// Failures of a whole pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("failed to serialize datasets: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failures reading an existing artifact for display.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
