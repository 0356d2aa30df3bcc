//! Rotation policy.
//!
//! The threshold is applied to the cumulative byte count rather than to the
//! current segment: with `n` segments open so far, the next one starts as soon
//! as more than `n * max_segment_bytes` bytes have been written in total.
//! Chunks are never split, so segments overshoot the limit by up to one chunk.

/// Decide whether a new segment must be opened before the next write.
///
/// Always true when no segment exists yet. A `max_segment_bytes` of 0 never
/// rotates after that.
pub fn should_rotate(
    total_bytes_written: u64,
    max_segment_bytes: u64,
    segment_count: usize,
) -> bool {
    if segment_count == 0 {
        return true;
    }
    if max_segment_bytes == 0 {
        return false;
    }
    total_bytes_written > max_segment_bytes.saturating_mul(segment_count as u64)
}

/// Size-based rotation settings for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RotationPolicy {
    max_segment_bytes: u64,
}

impl RotationPolicy {
    pub fn new(max_segment_bytes: u64) -> Self {
        Self { max_segment_bytes }
    }

    /// Never rotate: the whole capture goes to a single file.
    pub fn unbounded() -> Self {
        Self::new(0)
    }

    pub fn max_segment_bytes(&self) -> u64 {
        self.max_segment_bytes
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_segment_bytes == 0
    }

    pub fn should_rotate(&self, total_bytes_written: u64, segment_count: usize) -> bool {
        should_rotate(total_bytes_written, self.max_segment_bytes, segment_count)
    }
}
