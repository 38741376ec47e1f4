//! Protocol-wide constants for the `llhls:` transport.
//!
//! This module centralizes the magic values shared between this transport
//! and the producer process. Constants are grouped by concern.
//!
//! # Categories
//!
//! - **Protocol**: scheme, sentinel, window and identifier capacities
//! - **Timeouts**: connect timeout and retry delays

use std::time::Duration;

// ============================================================================
// Protocol
// ============================================================================

/// Scheme name registered for this transport.
pub const SCHEME: &str = "llhls";

/// Locator prefix stripped before parsing (`scheme` + `:`).
pub const SCHEME_PREFIX: &str = "llhls:";

/// Separator that may follow the scheme prefix when a chunk is given
/// (`llhls://path?chunk`).
pub const SCHEME_SEPARATOR: &str = "//";

/// Marker the producer appends to the byte stream when it failed to serve
/// the requested chunk.
///
/// It must never occur inside legitimate TS/MP4 payload. The transport cannot
/// verify that; it is a reservation agreed with the producer.
pub const MAGIC_ERROR: &[u8] = b"<<<=== MAGIC_ERROR_STRING {SHOULDNT BE IN TS/MP4} ===>>>";

/// Capacity of the trailing-byte window searched for [`MAGIC_ERROR`].
pub const TRAILING_WINDOW_CAPACITY: usize = 1024;

/// Maximum chunk identifier length in bytes, excluding the NUL terminator
/// sent on the wire.
pub const MAX_CHUNK_ID_LEN: usize = 1023;

/// Bytes kept free below the platform `sun_path` size: the NUL terminator
/// plus one byte of slack.
pub const SOCKET_PATH_MARGIN: usize = 2;

// ============================================================================
// Timeouts
// ============================================================================

/// Connect timeout used when neither the transport timeout nor the caller's
/// read/write timeout is set.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(100);

/// Pause before the single connect retry.
///
/// Covers the short window in which a restarting producer has not yet
/// re-created its listening socket.
pub const CONNECT_RETRY_DELAY: Duration = Duration::from_micros(300);

/// Pause before the single request resend.
pub const SEND_RETRY_DELAY: Duration = Duration::from_micros(300);

/// Total attempts (first try + retries) for connect and request dispatch.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// How long `llhls fetch` waits for readiness before giving up.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5);
