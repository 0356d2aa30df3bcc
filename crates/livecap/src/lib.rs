//! Live stream capture into size-rotated segment files.
//!
//! Reads an unbounded HTTP body (a live FLV/TS/MP4 feed) and writes it to
//! disk, starting a new file each time the configured size is exceeded and
//! reporting every finished file to a [`SegmentHandler`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use livecap::{presets, CaptureSession, CompletedSegment, HttpSettings, HttpSource};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let source = HttpSource::from_settings(&HttpSettings::default())?;
//! let mut session = CaptureSession::new(
//!     source,
//!     "https://example.com/live/room.flv",
//!     "/tank/live/room.flv",
//!     1024 * 1024 * 1024,
//! )?;
//!
//! let cancel = CancellationToken::new();
//! let summary = session
//!     .capture(
//!         &presets::bilibili(),
//!         &mut |segment: &CompletedSegment| -> anyhow::Result<()> {
//!             println!("finished {}", segment.path.display());
//!             Ok(())
//!         },
//!         &cancel,
//!     )
//!     .await?;
//!
//! println!("{} bytes in {} segments", summary.total_bytes, summary.segments.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Naming
//!
//! A capture that never rotates produces exactly `room.flv`. As soon as a
//! second file is needed the first is renamed to `room_01.flv` and the rest
//! follow as `room_02.flv`, `room_03.flv`, ...

pub mod error;
pub mod handler;
pub mod naming;
pub mod presets;
pub mod rotation;
pub mod segment;
pub mod session;
pub mod source;

pub use error::{CaptureError, SourceError};
pub use handler::{ChannelHandler, SegmentHandler};
pub use naming::SegmentNaming;
pub use rotation::{should_rotate, RotationPolicy};
pub use segment::{CompletedSegment, SegmentFile};
pub use session::{CaptureSession, CaptureSummary, SessionState, StopReason, DEFAULT_CHUNK_SIZE};
pub use source::{BodyReader, Headers, HttpSettings, HttpSource, SourceResponse, StreamSource};
