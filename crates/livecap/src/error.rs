//! Capture errors.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Boxed error returned by a [`StreamSource`](crate::StreamSource) when the
/// request could not be issued at all.
pub type SourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Everything that can end a capture session early.
///
/// Segments written before the failure stay on disk.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("output path has no file name: {}", path.display())]
    InvalidOutputPath { path: PathBuf },

    #[error("failed to request live stream {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: SourceError,
    },

    #[error("live stream {url} responded {status} {reason}")]
    Status {
        url: String,
        status: u16,
        reason: String,
    },

    #[error("failed to read live stream: {0}")]
    Read(#[source] io::Error),

    #[error("failed to create segment {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write segment {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to close segment {}: {source}", path.display())]
    Close {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to rename segment {} to {}: {source}", from.display(), to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("segment handler failed for {}: {source:#}", path.display())]
    Handler {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("capture session already terminated")]
    SessionReused,
}

impl CaptureError {
    /// True when the remote end answered with a non-success status.
    pub fn is_status(&self) -> bool {
        matches!(self, CaptureError::Status { .. })
    }

    /// True for failures of the local filesystem (create, write, close, rename).
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            CaptureError::Create { .. }
                | CaptureError::Write { .. }
                | CaptureError::Close { .. }
                | CaptureError::Rename { .. }
        )
    }
}
