//! Per-segment completion callbacks.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::segment::CompletedSegment;

/// Receives each segment once it is closed and will not be written again.
///
/// Calls are sequential and in segment order. Returning an error aborts the
/// capture; segments already reported stay on disk.
#[async_trait]
pub trait SegmentHandler: Send {
    async fn on_segment_complete(&mut self, segment: &CompletedSegment) -> anyhow::Result<()>;
}

/// Plain closures work as handlers; captured state plays the role of any
/// extra payload the caller wants alongside the path.
#[async_trait]
impl<F> SegmentHandler for F
where
    F: FnMut(&CompletedSegment) -> anyhow::Result<()> + Send,
{
    async fn on_segment_complete(&mut self, segment: &CompletedSegment) -> anyhow::Result<()> {
        (self)(segment)
    }
}

/// Forwards completed segments to another task, e.g. an uploader.
#[derive(Debug, Clone)]
pub struct ChannelHandler(pub mpsc::Sender<CompletedSegment>);

#[async_trait]
impl SegmentHandler for ChannelHandler {
    async fn on_segment_complete(&mut self, segment: &CompletedSegment) -> anyhow::Result<()> {
        self.0
            .send(segment.clone())
            .await
            .map_err(|_| anyhow::anyhow!("segment receiver dropped"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn segment(index: usize) -> CompletedSegment {
        CompletedSegment {
            index,
            path: PathBuf::from(format!("base_{:02}.flv", index)),
            bytes: 10,
        }
    }

    #[tokio::test]
    async fn test_closure_handler_sees_payload() {
        let room = "8739477";
        let mut seen = Vec::new();
        let mut handler = |s: &CompletedSegment| -> anyhow::Result<()> {
            seen.push(format!("{room}:{}", s.path.display()));
            Ok(())
        };

        handler.on_segment_complete(&segment(1)).await.unwrap();
        handler.on_segment_complete(&segment(2)).await.unwrap();
        drop(handler);

        assert_eq!(seen, vec!["8739477:base_01.flv", "8739477:base_02.flv"]);
    }

    #[tokio::test]
    async fn test_channel_handler_forwards() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut tx = ChannelHandler(tx);
        tx.on_segment_complete(&segment(1)).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().index, 1);

        drop(rx);
        assert!(tx.on_segment_complete(&segment(2)).await.is_err());
    }
}
