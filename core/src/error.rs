//! Launcher error taxonomy.

use std::io;

use swanboot_shared::SaveKind;
use thiserror::Error;

/// Errors raised while inspecting, relocating or booting a ROM.
///
/// Every variant is returned to the immediate caller; nothing in this crate
/// retries on its own.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("{path} is truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        path: String,
        expected: u64,
        actual: u64,
    },

    #[error("{path} has the wrong size: expected {expected} bytes, found {actual}")]
    SizeMismatch {
        path: String,
        expected: u64,
        actual: u64,
    },

    #[error("malformed save manifest at line {line}: {reason}")]
    MalformedManifest { line: usize, reason: &'static str },

    #[error("save path cannot be stored in the manifest: {0}")]
    InvalidPath(String),

    #[error("{0} save media is not supported")]
    Unsupported(SaveKind),

    #[error("internal error: {0}")]
    Internal(&'static str),
}

impl LaunchError {
    /// Wrap an I/O error with the path it happened on.
    ///
    /// `NotFound` errors become [`LaunchError::NotFound`].
    pub fn io(path: &str, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            LaunchError::NotFound(path.to_string())
        } else {
            LaunchError::Io {
                path: path.to_string(),
                source,
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LaunchError::NotFound(_))
    }
}

/// Attach a card path to `io::Result`s.
pub trait IoResultExt<T> {
    fn at(self, path: &str) -> Result<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn at(self, path: &str) -> Result<T> {
        self.map_err(|e| LaunchError::io(path, e))
    }
}

pub type Result<T, E = LaunchError> = std::result::Result<T, E>;
