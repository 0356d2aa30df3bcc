//! Segment files on disk.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::CaptureError;

/// A segment that finished writing, as handed to a
/// [`SegmentHandler`](crate::SegmentHandler).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedSegment {
    /// 1-based position in the capture.
    pub index: usize,
    /// Final on-disk path, after any rename.
    pub path: PathBuf,
    pub bytes: u64,
}

/// The segment currently being written.
///
/// Owns the file handle. Dropping it closes the file, so every early return
/// out of the capture loop releases the handle; [`SegmentFile::close`] is the
/// explicit path that also surfaces deferred write errors.
#[derive(Debug)]
pub struct SegmentFile {
    path: PathBuf,
    file: Option<File>,
    bytes_written: u64,
}

impl SegmentFile {
    /// Create (or truncate) the file at `path` for writing.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|source| CaptureError::Create {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            path,
            file: Some(file),
            bytes_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Write the whole chunk.
    ///
    /// On error, [`bytes_written`](Self::bytes_written) still counts the part
    /// of `data` that reached the file.
    pub fn write(&mut self, data: &[u8]) -> Result<(), CaptureError> {
        let Some(file) = self.file.as_mut() else {
            return Err(CaptureError::Write {
                path: self.path.clone(),
                source: io::Error::other("segment already closed"),
            });
        };

        write_counted(file, data, &mut self.bytes_written).map_err(|source| CaptureError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Flush and sync, then release the handle.
    ///
    /// The handle is released even when syncing fails.
    pub fn close(mut self) -> Result<u64, CaptureError> {
        if let Some(mut file) = self.file.take() {
            file.flush()
                .and_then(|()| file.sync_all())
                .map_err(|source| CaptureError::Close {
                    path: self.path.clone(),
                    source,
                })?;
            debug!(
                "closed segment {} ({} bytes)",
                self.path.display(),
                self.bytes_written
            );
        }
        Ok(self.bytes_written)
    }
}

/// `write_all` that keeps `written` in step with every accepted partial write.
fn write_counted<W: Write>(writer: &mut W, mut data: &[u8], written: &mut u64) -> io::Result<()> {
    while !data.is_empty() {
        match writer.write(data) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => {
                *written += n as u64;
                data = &data[n..];
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
