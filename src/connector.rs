//! Connection establishment to the producer's listening socket.
//!
//! Socket allocation failures are returned immediately. A refused connect
//! (`ECONNREFUSED`, the listener is not accepting yet) is retried according to
//! the policy; every other connect failure is fatal. On any failure the
//! allocated descriptor is released before returning.

use std::io;
use std::os::unix::io::RawFd;
use std::path::Path;
use std::time::Duration;

use scopeguard::ScopeGuard;

use crate::error::{Result, TransportError};
use crate::retry::RetryPolicy;
use crate::socket::SocketOps;

/// Allocate a stream socket and connect it to `path`.
///
/// Returns the connected, non-blocking descriptor. Ownership passes to the
/// caller.
pub fn connect<S: SocketOps>(
    ops: &S,
    path: &Path,
    timeout: Duration,
    policy: &RetryPolicy,
) -> Result<RawFd> {
    let fd = ops.socket().map_err(|e| {
        log::info!("[llhls] socket() failed: {e}");
        TransportError::SocketCreate(e)
    })?;

    // Released on every early return below; disarmed on success.
    let guard = scopeguard::guard(fd, |fd| ops.close(fd));

    policy
        .run(
            "connect",
            |_| ops.connect(*guard, path, timeout),
            is_transient_connect_error,
        )
        .map_err(|source| {
            log::info!("[llhls] connect to {} failed: {source}", path.display());
            TransportError::Connect {
                path: path.to_path_buf(),
                source,
            }
        })?;

    log::debug!("[llhls] connected fd={fd} to {}", path.display());
    Ok(ScopeGuard::into_inner(guard))
}

/// True for the "listener not accepting yet" condition worth one retry.
pub fn is_transient_connect_error(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::ECONNREFUSED)
}

// ─── Tests ──────────────────────────────────────────────────────────────────
