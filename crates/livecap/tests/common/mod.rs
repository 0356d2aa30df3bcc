//! Scripted stream sources for capture tests.

#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use livecap::{BodyReader, CompletedSegment, Headers, SourceError, SourceResponse, StreamSource};
use tokio_util::io::StreamReader;

pub const MIB: usize = 1024 * 1024;

/// Serves one canned response, recording every request it receives.
pub struct ScriptedSource {
    status: u16,
    body: Mutex<Option<BoxStream<'static, io::Result<Bytes>>>>,
    pub requests: Mutex<Vec<(String, Headers)>>,
}

impl ScriptedSource {
    /// 200 OK with the given chunks, then end of stream.
    pub fn chunks(chunks: Vec<Bytes>) -> Self {
        Self::from_stream(stream::iter(chunks.into_iter().map(Ok)).boxed())
    }

    /// `count` chunks of `size` bytes each.
    pub fn uniform(count: usize, size: usize) -> Self {
        let chunk = Bytes::from(vec![0xABu8; size]);
        Self::chunks(vec![chunk; count])
    }

    /// `total` bytes split into `size`-byte chunks (last one shorter).
    pub fn total(total: usize, size: usize) -> Self {
        let mut chunks = Vec::new();
        let mut left = total;
        while left > 0 {
            let n = left.min(size);
            chunks.push(Bytes::from(vec![0xCDu8; n]));
            left -= n;
        }
        Self::chunks(chunks)
    }

    /// The given chunks followed by a read error.
    pub fn failing_after(chunks: Vec<Bytes>) -> Self {
        let items = chunks
            .into_iter()
            .map(Ok)
            .chain(std::iter::once(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            ))));
        Self::from_stream(stream::iter(items).boxed())
    }

    /// The given chunks, then a body that never produces more data.
    pub fn stalling_after(chunks: Vec<Bytes>) -> Self {
        let items = stream::iter(chunks.into_iter().map(Ok)).chain(stream::pending());
        Self::from_stream(items.boxed())
    }

    pub fn from_stream(body: BoxStream<'static, io::Result<Bytes>>) -> Self {
        Self {
            status: 200,
            body: Mutex::new(Some(body)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl StreamSource for ScriptedSource {
    async fn open(&self, url: &str, headers: &Headers) -> Result<SourceResponse, SourceError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), headers.clone()));

        let body = self
            .body
            .lock()
            .unwrap()
            .take()
            .ok_or("scripted source already consumed")?;

        let body: BodyReader = Box::pin(StreamReader::new(body));
        let reason = match self.status {
            200 => "OK",
            404 => "Not Found",
            503 => "Service Unavailable",
            _ => "",
        };

        Ok(SourceResponse {
            status: self.status,
            reason: reason.to_string(),
            body,
        })
    }
}

/// Fails before any response arrives.
pub struct UnreachableSource;

#[async_trait]
impl StreamSource for UnreachableSource {
    async fn open(&self, _url: &str, _headers: &Headers) -> Result<SourceResponse, SourceError> {
        Err(Box::new(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "connection refused",
        )))
    }
}

/// Collects every reported segment.
#[derive(Debug, Default)]
pub struct Recorder {
    pub seen: Vec<CompletedSegment>,
}

impl Recorder {
    pub fn paths(&self) -> Vec<PathBuf> {
        self.seen.iter().map(|s| s.path.clone()).collect()
    }
}

#[async_trait]
impl livecap::SegmentHandler for Recorder {
    async fn on_segment_complete(&mut self, segment: &CompletedSegment) -> anyhow::Result<()> {
        // Reported files are closed and complete on disk.
        let on_disk = std::fs::metadata(&segment.path)?.len();
        anyhow::ensure!(
            on_disk == segment.bytes,
            "{} has {} bytes on disk, reported {}",
            segment.path.display(),
            on_disk,
            segment.bytes
        );
        self.seen.push(segment.clone());
        Ok(())
    }
}

/// Sorted file names in `dir`.
pub fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

pub fn file_len(path: &Path) -> u64 {
    std::fs::metadata(path).unwrap().len()
}
