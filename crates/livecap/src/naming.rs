//! Segment naming.
//!
//! An unrotated capture lands at `dir/base.format`. Once a second segment is
//! needed every file carries a 1-based, zero-padded sequence number:
//!
//! ```text
//! dir/base.flv            (only segment)
//! dir/base_01.flv         (renamed when segment 2 opens)
//! dir/base_02.flv
//! dir/base_03.flv
//! ```

use std::path::{Path, PathBuf};

use crate::error::CaptureError;

/// Naming template derived once from the caller's output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentNaming {
    target_dir: PathBuf,
    base_name: String,
    format: String,
}

impl SegmentNaming {
    /// Split `output` into directory, file stem and extension.
    ///
    /// No filesystem access happens here. An output without an extension
    /// produces segment names without a trailing dot.
    pub fn from_output_path(output: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let output = output.as_ref();

        let base_name = output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CaptureError::InvalidOutputPath {
                path: output.to_path_buf(),
            })?;

        let format = output
            .extension()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let target_dir = output
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok(Self {
            target_dir,
            base_name,
            format,
        })
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Extension without the dot, possibly empty.
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Path of the only segment of an unrotated capture.
    pub fn single_path(&self) -> PathBuf {
        self.target_dir.join(self.file_name(None))
    }

    /// Path of the 1-based segment `seq` once rotation has happened.
    pub fn numbered_path(&self, seq: usize) -> PathBuf {
        self.target_dir.join(self.file_name(Some(seq)))
    }

    /// Path for the next segment given how many already exist.
    pub fn next_segment_path(&self, existing: usize) -> PathBuf {
        if existing == 0 {
            self.single_path()
        } else {
            self.numbered_path(existing + 1)
        }
    }

    fn file_name(&self, seq: Option<usize>) -> String {
        let stem = match seq {
            Some(n) => format!("{}_{:02}", self.base_name, n),
            None => self.base_name.clone(),
        };
        if self.format.is_empty() {
            stem
        } else {
            format!("{}.{}", stem, self.format)
        }
    }
}
