//! Error type for `llhls:` transport operations.
//!
//! Would-block and end-of-stream on the read path are not errors; they are
//! reported through [`crate::session::ReadOutcome`].

use std::io;
use std::path::PathBuf;

/// Errors that can occur while opening or driving a transport session.
#[derive(Debug)]
pub enum TransportError {
    /// The locator could not be parsed or does not fit the buffer limits.
    MalformedLocator(String),
    /// The stream socket could not be allocated.
    SocketCreate(io::Error),
    /// The connect attempt (after any retry) failed.
    Connect {
        /// Socket path that was dialled.
        path: PathBuf,
        /// Error of the last attempt.
        source: io::Error,
    },
    /// A receive or send failed with a non-transient platform error.
    Io(io::Error),
    /// The producer signalled failure by appending the magic error marker.
    ProducerFailed {
        /// Requested chunk identifier, if any.
        chunk: Option<String>,
        /// Payload bytes delivered before the marker was seen.
        delivered: u64,
    },
    /// A non-blocking send could not make progress right now.
    WouldBlock,
    /// The socket did not become writable within the read/write timeout.
    Timeout,
    /// The session was already closed.
    Closed,
    /// No protocol is registered for the locator's scheme.
    UnknownProtocol(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedLocator(msg) => write!(f, "Malformed locator: {msg}"),
            Self::SocketCreate(e) => write!(f, "Socket creation failed: {e}"),
            Self::Connect { path, source } => {
                write!(f, "Connect to {} failed: {source}", path.display())
            }
            Self::Io(e) => write!(f, "Socket I/O error: {e}"),
            Self::ProducerFailed { chunk, delivered } => write!(
                f,
                "Producer reported failure for chunk {} after {delivered} bytes",
                chunk.as_deref().unwrap_or("<default>")
            ),
            Self::WouldBlock => write!(f, "Operation would block"),
            Self::Timeout => write!(f, "Operation timed out"),
            Self::Closed => write!(f, "Session already closed"),
            Self::UnknownProtocol(scheme) => write!(f, "Unknown protocol: {scheme}"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SocketCreate(e) | Self::Io(e) | Self::Connect { source: e, .. } => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for io::Error {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::SocketCreate(e) | TransportError::Io(e) => e,
            TransportError::Connect { source, .. } => source,
            TransportError::ProducerFailed { .. } | TransportError::MalformedLocator(_) => {
                io::Error::new(io::ErrorKind::InvalidData, err)
            }
            TransportError::WouldBlock => io::ErrorKind::WouldBlock.into(),
            TransportError::Timeout => io::ErrorKind::TimedOut.into(),
            TransportError::Closed => io::Error::new(io::ErrorKind::NotConnected, err),
            TransportError::UnknownProtocol(_) => io::Error::new(io::ErrorKind::Unsupported, err),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TransportError>;
