//! Capture sessions.
//!
//! A [`CaptureSession`] owns everything mutable about one capture: the naming
//! template, byte counters, the ordered list of segments and the one open
//! segment file. [`CaptureSession::capture`] drives it through
//!
//! ```text
//! Idle → Connecting → Capturing(1) → [Rotating → Capturing(n+1)]* → Finalizing → Terminated
//! ```
//!
//! Every exit path goes through finalization: the open segment is closed and,
//! unless it was already handed over, reported to the handler. Each segment is
//! reported exactly once and in order.

use std::path::{Path, PathBuf};

use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::error::CaptureError;
use crate::handler::SegmentHandler;
use crate::naming::SegmentNaming;
use crate::rotation::RotationPolicy;
use crate::segment::{CompletedSegment, SegmentFile};
use crate::source::{Headers, StreamSource};

/// Read buffer size used unless overridden.
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 20;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Capturing { segment: usize },
    Rotating,
    Finalizing,
    Terminated,
}

/// Why a successful capture stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The remote end closed the stream.
    StreamEnded,
    /// The caller's cancellation token fired.
    Cancelled,
}

/// Result of a capture that ended without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSummary {
    pub segments: Vec<CompletedSegment>,
    pub total_bytes: u64,
    pub stop: StopReason,
}

/// One live capture from `url` into size-rotated segment files.
pub struct CaptureSession<S> {
    source: S,
    url: String,
    naming: SegmentNaming,
    policy: RotationPolicy,
    chunk_size: usize,
    total_bytes_written: u64,
    segments: Vec<CompletedSegment>,
    active: Option<SegmentFile>,
    /// Number of leading segments already handed to the handler.
    reported: usize,
    state: SessionState,
}

impl<S: StreamSource> CaptureSession<S> {
    /// Prepare a capture of `url` into files named after `output`.
    ///
    /// `max_segment_bytes` of 0 keeps everything in one file. Nothing touches
    /// the network or the filesystem until [`capture`](Self::capture).
    pub fn new(
        source: S,
        url: impl Into<String>,
        output: impl AsRef<Path>,
        max_segment_bytes: u64,
    ) -> Result<Self, CaptureError> {
        Ok(Self {
            source,
            url: url.into(),
            naming: SegmentNaming::from_output_path(output)?,
            policy: RotationPolicy::new(max_segment_bytes),
            chunk_size: DEFAULT_CHUNK_SIZE,
            total_bytes_written: 0,
            segments: Vec::new(),
            active: None,
            reported: 0,
            state: SessionState::Idle,
        })
    }

    /// Override the read buffer size. Zero is bumped to one byte.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn naming(&self) -> &SegmentNaming {
        &self.naming
    }

    pub fn policy(&self) -> RotationPolicy {
        self.policy
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn total_bytes_written(&self) -> u64 {
        self.total_bytes_written
    }

    /// Segments created so far, oldest first.
    pub fn segments(&self) -> &[CompletedSegment] {
        &self.segments
    }

    pub fn segment_paths(&self) -> Vec<&Path> {
        self.segments.iter().map(|s| s.path.as_path()).collect()
    }

    /// Path the next segment would be created at.
    pub fn next_segment_path(&self) -> PathBuf {
        self.naming.next_segment_path(self.segments.len())
    }

    /// Capture until the stream ends, fails, or `cancel` fires.
    ///
    /// `handler` sees every segment exactly once, in order. A session runs
    /// once; later calls fail with [`CaptureError::SessionReused`].
    pub async fn capture<H>(
        &mut self,
        headers: &Headers,
        handler: &mut H,
        cancel: &CancellationToken,
    ) -> Result<CaptureSummary, CaptureError>
    where
        H: SegmentHandler + ?Sized,
    {
        if self.state != SessionState::Idle {
            return Err(CaptureError::SessionReused);
        }

        let span = info_span!("capture", url = %self.url);
        async move {
            let outcome = self.run(headers, handler, cancel).await;
            let outcome = self.finish(handler, outcome).await;
            self.set_state(SessionState::Terminated);

            outcome.map(|stop| CaptureSummary {
                segments: self.segments.clone(),
                total_bytes: self.total_bytes_written,
                stop,
            })
        }
        .instrument(span)
        .await
    }

    async fn run<H>(
        &mut self,
        headers: &Headers,
        handler: &mut H,
        cancel: &CancellationToken,
    ) -> Result<StopReason, CaptureError>
    where
        H: SegmentHandler + ?Sized,
    {
        self.set_state(SessionState::Connecting);

        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(StopReason::Cancelled),
            opened = self.source.open(&self.url, headers) => opened,
        };
        let response = opened.map_err(|source| CaptureError::Connect {
            url: self.url.clone(),
            source,
        })?;

        if !response.is_success() {
            return Err(CaptureError::Status {
                url: self.url.clone(),
                status: response.status,
                reason: response.reason,
            });
        }

        let mut body = response.body;
        let mut buf = vec![0u8; self.chunk_size];

        loop {
            let n = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("capture cancelled after {} bytes", self.total_bytes_written);
                    return Ok(StopReason::Cancelled);
                }
                read = body.read(&mut buf) => read.map_err(CaptureError::Read)?,
            };

            if n == 0 {
                info!("live stream ended after {} bytes", self.total_bytes_written);
                return Ok(StopReason::StreamEnded);
            }

            if self
                .policy
                .should_rotate(self.total_bytes_written, self.segments.len())
            {
                self.rotate(handler).await?;
            }

            self.write_chunk(&buf[..n])?;
        }
    }

    /// Close the current segment (if any), hand it over, open the next one.
    async fn rotate<H>(&mut self, handler: &mut H) -> Result<(), CaptureError>
    where
        H: SegmentHandler + ?Sized,
    {
        let existing = self.segments.len();

        if existing > 0 {
            self.set_state(SessionState::Rotating);
            self.close_active()?;
            self.rename_first_segment_if_needed()?;
            self.report(handler, existing - 1).await?;
        }

        let path = self.naming.next_segment_path(existing);
        info!("writing segment {} to {}", existing + 1, path.display());

        let file = SegmentFile::create(&path)?;
        self.segments.push(CompletedSegment {
            index: existing + 1,
            path,
            bytes: 0,
        });
        self.active = Some(file);
        self.set_state(SessionState::Capturing {
            segment: existing + 1,
        });

        Ok(())
    }

    /// Move `base.format` to `base_01.format` once a second segment is due.
    fn rename_first_segment_if_needed(&mut self) -> Result<(), CaptureError> {
        if self.segments.len() != 1 {
            return Ok(());
        }

        let to = self.naming.numbered_path(1);
        let first = &mut self.segments[0];
        std::fs::rename(&first.path, &to).map_err(|source| CaptureError::Rename {
            from: first.path.clone(),
            to: to.clone(),
            source,
        })?;

        debug!("renamed {} to {}", first.path.display(), to.display());
        first.path = to;
        Ok(())
    }

    /// Bytes that reached the file are counted even when the write fails.
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), CaptureError> {
        match self.active.as_mut() {
            Some(active) => {
                let before = active.bytes_written();
                let result = active.write(chunk);
                self.total_bytes_written += active.bytes_written() - before;
                result
            }
            None => Err(CaptureError::Write {
                path: self.next_segment_path(),
                source: std::io::Error::other("no open segment"),
            }),
        }
    }

    fn close_active(&mut self) -> Result<(), CaptureError> {
        let Some(file) = self.active.take() else {
            return Ok(());
        };

        if let Some(last) = self.segments.last_mut() {
            last.bytes = file.bytes_written();
        }
        file.close().map(|_| ())
    }

    async fn report<H>(&mut self, handler: &mut H, index: usize) -> Result<(), CaptureError>
    where
        H: SegmentHandler + ?Sized,
    {
        let segment = self.segments[index].clone();
        self.reported = index + 1;

        info!(
            "segment {} complete: {} ({} bytes)",
            segment.index,
            segment.path.display(),
            segment.bytes
        );

        let result = handler.on_segment_complete(&segment).await;
        result.map_err(|source| CaptureError::Handler {
            path: segment.path,
            source,
        })
    }

    /// Close whatever is open and report the last segment if still pending.
    ///
    /// An error raised here only replaces the outcome when nothing failed
    /// before; otherwise it is logged and the first error wins.
    async fn finish<H>(
        &mut self,
        handler: &mut H,
        outcome: Result<StopReason, CaptureError>,
    ) -> Result<StopReason, CaptureError>
    where
        H: SegmentHandler + ?Sized,
    {
        self.set_state(SessionState::Finalizing);

        let mut outcome = outcome;

        if let Err(err) = self.close_active() {
            outcome = keep_first_error(outcome, err);
        }

        let count = self.segments.len();
        if count > self.reported {
            if let Err(err) = self.report(handler, count - 1).await {
                outcome = keep_first_error(outcome, err);
            }
        }

        outcome
    }

    fn set_state(&mut self, state: SessionState) {
        debug!(from = ?self.state, to = ?state, "session state");
        self.state = state;
    }
}

fn keep_first_error(
    outcome: Result<StopReason, CaptureError>,
    err: CaptureError,
) -> Result<StopReason, CaptureError> {
    match outcome {
        Ok(_) => Err(err),
        Err(primary) => {
            warn!("{} (while finalizing after: {})", err, primary);
            Err(primary)
        }
    }
}

impl<S> std::fmt::Debug for CaptureSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("url", &self.url)
            .field("naming", &self.naming)
            .field("policy", &self.policy)
            .field("total_bytes_written", &self.total_bytes_written)
            .field("segments", &self.segments)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
