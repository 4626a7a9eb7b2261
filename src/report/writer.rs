//! Artifact persistence.
//!
//! The document is written to a temporary file next to the destination
//! and then renamed over it, so readers never observe a partial file.

use crate::error::{LoadError, PipelineError};
use crate::models::OutputDocument;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Serialize the document as JSON.
pub fn generate_json(document: &OutputDocument, pretty: bool) -> Result<String, PipelineError> {
    let json = if pretty {
        serde_json::to_string_pretty(document)?
    } else {
        serde_json::to_string(document)?
    };
    Ok(json)
}

/// Atomically replace the artifact at `path`.
pub fn write_document(
    document: &OutputDocument,
    path: &Path,
    pretty: bool,
) -> Result<(), PipelineError> {
    // Serialize first so a serialization failure never touches disk.
    let json = generate_json(document, pretty)?;

    let io_err = |source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(json.as_bytes()).map_err(io_err)?;
    tmp.write_all(b"\n").map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    debug!("Staged artifact at {}", tmp.path().display());

    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

/// Read an existing artifact.
///
/// A missing file means nothing has been generated yet and is reported
/// as `Ok(None)`.
pub fn load_document(path: &Path) -> Result<Option<OutputDocument>, LoadError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(LoadError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
}
