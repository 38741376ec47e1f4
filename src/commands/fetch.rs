//! `llhls fetch`: drive a transport to end-of-stream.
//!
//! The transport never blocks on reads, so the loop waits for readability
//! on its raw descriptor with `poll(2)` and reads until end-of-stream. If
//! nothing becomes readable within the idle timeout the fetch is abandoned.
//!
//! [`fetch_to_file`] writes to `<file>.part` and renames it into place only
//! after end-of-stream, so a failed fetch never leaves a truncated chunk (or
//! the head of a split error marker) under the requested name.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};

use crate::registry::Transport;
use crate::session::ReadOutcome;
use crate::socket::poll_fd;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// What a completed fetch produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSummary {
    /// Payload bytes written to the output.
    pub bytes: u64,
    /// Reads that returned payload.
    pub reads: u64,
    /// Wall time from first read to end-of-stream.
    pub elapsed: Duration,
}

/// Copy the transport's payload into `out` until end-of-stream.
///
/// The transport is closed before returning, on success and on error.
///
/// # Errors
///
/// Returns the transport's error (a
/// [`TransportError`](crate::TransportError), reachable with
/// `downcast_ref`), an output write error, or an idle-timeout error.
pub fn fetch(
    transport: &mut dyn Transport,
    out: &mut dyn Write,
    idle_timeout: Duration,
) -> Result<FetchSummary> {
    let result = copy_to_end(transport, out, idle_timeout);
    if let Err(e) = transport.close() {
        log::warn!("[Fetch] close failed: {e}");
    }
    result
}

/// Fetch into `path`, replacing it only when the chunk arrived complete.
///
/// On any error the partial download is removed and `path` is left as it
/// was.
pub fn fetch_to_file(
    transport: &mut dyn Transport,
    path: &Path,
    idle_timeout: Duration,
) -> Result<FetchSummary> {
    let part = part_path(path);
    let file = match File::create(&part) {
        Ok(file) => file,
        Err(e) => {
            if let Err(close_err) = transport.close() {
                log::warn!("[Fetch] close failed: {close_err}");
            }
            return Err(e).with_context(|| format!("create output file: {}", part.display()));
        }
    };

    let mut out = BufWriter::new(file);
    let fetched = fetch(transport, &mut out, idle_timeout);
    drop(out);
    let result = fetched.and_then(|summary| {
        fs::rename(&part, path)
            .with_context(|| format!("move {} into place", part.display()))?;
        Ok(summary)
    });

    if result.is_err() {
        if let Err(e) = fs::remove_file(&part) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("[Fetch] could not remove {}: {e}", part.display());
            }
        }
    }
    result
}

/// `<path>.part`, next to the final file so the rename stays on one
/// filesystem.
fn part_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

fn copy_to_end(
    transport: &mut dyn Transport,
    out: &mut dyn Write,
    idle_timeout: Duration,
) -> Result<FetchSummary> {
    let started = Instant::now();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let mut summary = FetchSummary {
        bytes: 0,
        reads: 0,
        elapsed: Duration::ZERO,
    };

    loop {
        match transport.read(&mut buf)? {
            ReadOutcome::Data(n) => {
                out.write_all(&buf[..n]).context("write chunk output")?;
                summary.bytes += n as u64;
                summary.reads += 1;
            }
            ReadOutcome::EndOfStream => break,
            ReadOutcome::WouldBlock => {
                let Some(fd) = transport.raw_fd() else {
                    bail!("transport closed while fetching");
                };
                let readable = poll_fd(fd, libc::POLLIN, Some(idle_timeout))
                    .context("wait for chunk data")?;
                if !readable {
                    bail!("no data within {} ms", idle_timeout.as_millis());
                }
            }
        }
    }

    out.flush().context("flush chunk output")?;
    summary.elapsed = started.elapsed();
    log::info!(
        "[Fetch] {} bytes in {} reads ({:?})",
        summary.bytes,
        summary.reads,
        summary.elapsed
    );
    Ok(summary)
}

// ─── Tests ──────────────────────────────────────────────────────────────────
