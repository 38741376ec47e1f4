//! Fixed-capacity trailing-byte window for magic-error detection.
//!
//! The producer has no side channel once payload bytes are flowing, so it
//! reports failure by writing [`MAGIC_ERROR`] as the last bytes of the
//! stream. The reader keeps the most recent bytes here and searches them
//! after every receive.
//!
//! # Modes
//!
//! - [`WindowMode::Sliding`] keeps the last `capacity` bytes of the stream
//!   across receives, so a marker split over two receives is still found.
//! - [`WindowMode::PerRead`] keeps only the tail of the most recent receive,
//!   overwriting the previous content. This matches producers that always
//!   emit the marker in a single final send.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::constants::{MAGIC_ERROR, TRAILING_WINDOW_CAPACITY};

/// How received bytes replace the window content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowMode {
    /// Last `capacity` bytes of the whole stream.
    #[default]
    Sliding,
    /// Last `min(n, capacity)` bytes of the most recent receive only.
    PerRead,
}

impl std::str::FromStr for WindowMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sliding" => Ok(Self::Sliding),
            "per_read" | "per-read" => Ok(Self::PerRead),
            other => Err(format!("unknown window mode: {other}")),
        }
    }
}

/// Trailing-byte window.
///
/// Memory is bounded at `capacity` bytes regardless of stream length.
#[derive(Debug, Clone)]
pub struct TrailingWindow {
    buf: VecDeque<u8>,
    capacity: usize,
    mode: WindowMode,
}

impl TrailingWindow {
    /// Create a window with the given byte capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is smaller than the magic marker.
    #[must_use]
    pub fn new(capacity: usize, mode: WindowMode) -> Self {
        assert!(
            capacity >= MAGIC_ERROR.len(),
            "TrailingWindow capacity must hold the magic marker"
        );
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
            mode,
        }
    }

    /// Create a window with [`TRAILING_WINDOW_CAPACITY`] (1 KiB).
    #[must_use]
    pub fn with_default_capacity(mode: WindowMode) -> Self {
        Self::new(TRAILING_WINDOW_CAPACITY, mode)
    }

    /// Record the bytes of one receive.
    ///
    /// An empty slice leaves the window unchanged in both modes.
    pub fn observe(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }

        if self.mode == WindowMode::PerRead || data.len() >= self.capacity {
            self.buf.clear();
            let start = data.len().saturating_sub(self.capacity);
            self.buf.extend(&data[start..]);
            return;
        }

        let needed = self.buf.len() + data.len();
        if needed > self.capacity {
            self.buf.drain(..needed - self.capacity);
        }
        self.buf.extend(data);
    }

    /// True if the window holds [`MAGIC_ERROR`] anywhere.
    ///
    /// Binary-safe: zero bytes in the window are searched like any other.
    #[must_use]
    pub fn contains_magic(&self) -> bool {
        let (front, back) = self.buf.as_slices();
        contains_split(front, back, MAGIC_ERROR)
    }

    /// Copy of the window content, oldest byte first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.buf.iter().copied().collect()
    }

    /// Number of bytes currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True if nothing has been observed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Configured capacity in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Window mode.
    #[must_use]
    pub fn mode(&self) -> WindowMode {
        self.mode
    }
}

fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Search `front ++ back` without joining the two halves of the ring.
///
/// Only the `needle.len() - 1` bytes on each side of the seam are copied.
fn contains_split(front: &[u8], back: &[u8], needle: &[u8]) -> bool {
    if contains_subslice(front, needle) || contains_subslice(back, needle) {
        return true;
    }
    if front.is_empty() || back.is_empty() || needle.len() < 2 {
        return false;
    }
    let reach = needle.len() - 1;
    let mut seam = Vec::with_capacity(2 * reach);
    seam.extend_from_slice(&front[front.len().saturating_sub(reach)..]);
    seam.extend_from_slice(&back[..back.len().min(reach)]);
    contains_subslice(&seam, needle)
}

// ─── Tests ──────────────────────────────────────────────────────────────────
