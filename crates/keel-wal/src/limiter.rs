//! Write rate limiting seam.
//!
//! The limiter itself lives outside this crate; the writer only requests
//! tokens and accepts partial grants. A fixed-quota limiter for tests is in
//! [`test_support`](crate::test_support).

use serde::{Deserialize, Serialize};

/// Priority a write is issued at, forwarded to the rate limiter so it can
/// starve background I/O before foreground I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IoPriority {
    Low,
    Mid,
    High,
}

impl Default for IoPriority {
    fn default() -> Self {
        Self::High
    }
}

/// Token source shared across writers.
///
/// `request` may grant fewer bytes than asked for; callers must loop.
/// Implementations block until at least one byte (rounded up to `alignment`
/// when nonzero) can be granted.
pub trait RateLimiter: Send + Sync {
    /// Request permission to write up to `bytes` bytes at `priority`.
    ///
    /// Returns the number of bytes granted, in `1..=bytes`. `alignment` is a
    /// hint that grants smaller than one aligned unit are useless to the
    /// caller.
    fn request(&self, bytes: usize, alignment: usize, priority: IoPriority) -> usize;
}
