//! One chunk fetch over one Unix socket connection.
//!
//! # Lifecycle
//!
//! ```text
//! Session::open(locator) ──parse──► Locator
//!                        ──connect (retry once on ECONNREFUSED)──► fd
//!                        ──send "<chunk>\0" (retry once, tolerated)──►
//!
//! read()*  ──recv (non-blocking)──► WouldBlock | Data(n) | EndOfStream
//!                                   └─ magic marker in trailing window ─► ProducerFailed
//! write()* ──[wait writable]──send──►
//!
//! close() / drop ──► fd released exactly once
//! ```
//!
//! The session never blocks on reads. Callers poll [`Session::raw_fd`] for
//! readability in their own event loop and call [`Session::read`] when it
//! fires.

// Rust guideline compliant 2026-02

use std::io;
use std::os::unix::io::RawFd;
use std::path::{Path, PathBuf};

use crate::config::TransportOptions;
use crate::connector;
use crate::dispatcher;
use crate::error::{Result, TransportError};
use crate::locator::Locator;
use crate::socket::{LibcSocket, SocketOps};
use crate::window::TrailingWindow;

/// Result of a successful [`Session::read`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n` payload bytes were written to the front of the caller's buffer.
    Data(usize),
    /// The producer closed the stream cleanly.
    EndOfStream,
    /// No data available yet; poll the descriptor and try again.
    WouldBlock,
}

/// A live connection to the producer for one chunk.
pub struct Session<S: SocketOps = LibcSocket> {
    ops: S,
    /// `None` once closed.
    fd: Option<RawFd>,
    socket_path: PathBuf,
    chunk_id: Option<String>,
    window: TrailingWindow,
    delivered: u64,
    options: TransportOptions,
}

impl<S: SocketOps> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("fd", &self.fd)
            .field("socket_path", &self.socket_path)
            .field("chunk_id", &self.chunk_id)
            .field("delivered", &self.delivered)
            .finish_non_exhaustive()
    }
}

impl Session<LibcSocket> {
    /// Open a session for `locator` using real sockets.
    ///
    /// # Errors
    ///
    /// Fails on a malformed locator, socket allocation failure, or connect
    /// failure. A request that could not be sent is logged, not returned.
    pub fn open(locator: &str, options: &TransportOptions) -> Result<Self> {
        Self::open_with(LibcSocket, locator, options)
    }
}

impl<S: SocketOps> Session<S> {
    /// Open a session for `locator` through the given socket primitives.
    pub fn open_with(ops: S, locator: &str, options: &TransportOptions) -> Result<Self> {
        let (socket_path, chunk_id) = Locator::parse(locator)?.into_parts();

        let fd = connector::connect(
            &ops,
            &socket_path,
            options.connect_timeout(),
            &options.connect_retry,
        )?;

        if let Some(chunk) = chunk_id.as_deref() {
            match dispatcher::dispatch(&ops, fd, chunk, &options.send_retry) {
                Ok(n) => log::info!("[llhls] requested chunk {chunk} on fd {fd} ({n} bytes)"),
                Err(e) => log::warn!(
                    "[llhls] request for chunk {chunk} on fd {fd} not sent: {e}; reading anyway"
                ),
            }
        }

        Ok(Self {
            ops,
            fd: Some(fd),
            socket_path,
            chunk_id,
            window: TrailingWindow::with_default_capacity(options.window_mode),
            delivered: 0,
            options: options.clone(),
        })
    }

    /// Receive the next bytes of the chunk into `buf`.
    ///
    /// Never blocks. Classification order: would-block, hard error, data
    /// (checked for the magic marker), end-of-stream (also checked).
    ///
    /// # Errors
    ///
    /// - [`TransportError::ProducerFailed`] when the trailing window holds
    ///   the magic marker, whatever the byte count of this receive.
    /// - [`TransportError::Io`] for receive failures other than would-block.
    /// - [`TransportError::Closed`] after [`Session::close`].
    pub fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome> {
        let fd = self.fd.ok_or(TransportError::Closed)?;
        if buf.is_empty() {
            // recv() would report 0 and look like end-of-stream.
            return Ok(ReadOutcome::Data(0));
        }

        let n = match self.ops.recv(fd, buf) {
            Ok(n) => n,
            Err(e) if is_retry_later(&e) => return Ok(ReadOutcome::WouldBlock),
            Err(e) => {
                log::debug!("[llhls] recv on fd {fd} failed: {e}");
                return Err(TransportError::Io(e));
            }
        };

        self.window.observe(&buf[..n]);
        if self.window.contains_magic() {
            log::info!(
                "[llhls] producer error for chunk {}, delivered {} bytes",
                self.chunk_label(),
                self.delivered
            );
            return Err(TransportError::ProducerFailed {
                chunk: self.chunk_id.clone(),
                delivered: self.delivered,
            });
        }

        if n == 0 {
            log::info!(
                "[llhls] done with chunk {}, delivered {} bytes",
                self.chunk_label(),
                self.delivered
            );
            return Ok(ReadOutcome::EndOfStream);
        }

        self.delivered += n as u64;
        Ok(ReadOutcome::Data(n))
    }

    /// Send `data` to the producer.
    ///
    /// In blocking mode (`nonblocking = false`) the socket is first awaited
    /// for writability, bounded by the read/write timeout.
    ///
    /// # Errors
    ///
    /// [`TransportError::Timeout`] if the wait expired,
    /// [`TransportError::WouldBlock`] if a non-blocking send made no
    /// progress, [`TransportError::Io`] otherwise.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        let fd = self.fd.ok_or(TransportError::Closed)?;

        if !self.options.nonblocking {
            let ready = self
                .ops
                .wait_writable(fd, self.options.rw_timeout())
                .map_err(TransportError::Io)?;
            if !ready {
                return Err(TransportError::Timeout);
            }
        }

        match self.ops.send(fd, data) {
            Ok(n) => Ok(n),
            Err(e) if is_retry_later(&e) => Err(TransportError::WouldBlock),
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    /// Release the socket.
    ///
    /// Calling `close` again is a no-op; the descriptor is never released
    /// twice.
    pub fn close(&mut self) -> Result<()> {
        match self.fd.take() {
            Some(fd) => {
                log::debug!(
                    "[llhls] closing fd {fd} for chunk {}, delivered {} bytes",
                    self.chunk_label(),
                    self.delivered
                );
                self.ops.close(fd);
            }
            None => log::debug!("[llhls] close on already-closed session"),
        }
        Ok(())
    }

    /// Raw descriptor for an external readiness loop; `None` once closed.
    pub fn raw_fd(&self) -> Option<RawFd> {
        self.fd
    }

    /// True until [`Session::close`] has been called.
    pub fn is_open(&self) -> bool {
        self.fd.is_some()
    }

    /// Socket path this session connected to.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Requested chunk identifier, if any.
    pub fn chunk_id(&self) -> Option<&str> {
        self.chunk_id.as_deref()
    }

    /// Total payload bytes returned to the caller so far.
    pub fn bytes_delivered(&self) -> u64 {
        self.delivered
    }

    fn chunk_label(&self) -> &str {
        self.chunk_id.as_deref().unwrap_or("<default>")
    }
}

impl<S: SocketOps> Drop for Session<S> {
    fn drop(&mut self) {
        if let Some(fd) = self.fd.take() {
            self.ops.close(fd);
        }
    }
}

impl<S: SocketOps> io::Read for Session<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match Session::read(self, buf)? {
            ReadOutcome::Data(n) => Ok(n),
            ReadOutcome::EndOfStream => Ok(0),
            ReadOutcome::WouldBlock => Err(io::ErrorKind::WouldBlock.into()),
        }
    }
}

impl<S: SocketOps> io::Write for Session<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(Session::write(self, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// EAGAIN/EWOULDBLOCK, or a signal interrupted the call.
fn is_retry_later(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

// ─── Tests ──────────────────────────────────────────────────────────────────
