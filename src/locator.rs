//! Locator parsing: `llhls:[//]<socket path>[?<chunk id>]`.
//!
//! The chunk identifier is consumed verbatim. No percent-decoding or other
//! escaping is applied, since the producer matches the raw bytes.

use std::path::{Path, PathBuf};

use crate::constants::{MAX_CHUNK_ID_LEN, SCHEME_PREFIX, SCHEME_SEPARATOR, SOCKET_PATH_MARGIN};
use crate::error::{Result, TransportError};

/// A parsed `llhls:` locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    socket_path: PathBuf,
    chunk_id: Option<String>,
}

impl Locator {
    /// Parse a locator string.
    ///
    /// The `llhls:` prefix is optional. Everything before the first `?` is
    /// the socket path, everything after it the chunk identifier; a `//`
    /// separator in front of the path is skipped only in that form. Without
    /// a `?` the whole remainder is the socket path, so
    /// `llhls://tmp/p.sock` names `//tmp/p.sock`. An empty identifier is
    /// treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::MalformedLocator`] if the socket path is
    /// empty or does not fit the platform `sun_path` limit, or if the chunk
    /// identifier is too long or contains a NUL byte.
    pub fn parse(locator: &str) -> Result<Self> {
        let rest = locator.strip_prefix(SCHEME_PREFIX).unwrap_or(locator);

        let (path, chunk) = match rest.split_once('?') {
            Some((path, chunk)) => {
                let path = path.strip_prefix(SCHEME_SEPARATOR).unwrap_or(path);
                (path, Some(chunk))
            }
            None => (rest, None),
        };

        if path.is_empty() {
            return Err(TransportError::MalformedLocator(format!(
                "no socket path in {locator:?}"
            )));
        }

        let max_path = max_socket_path_len();
        if path.len() > max_path {
            return Err(TransportError::MalformedLocator(format!(
                "socket path too long ({} bytes, max {max_path})",
                path.len()
            )));
        }
        if path.as_bytes().contains(&0) {
            return Err(TransportError::MalformedLocator(
                "socket path contains a NUL byte".to_owned(),
            ));
        }

        let chunk_id = match chunk {
            None | Some("") => None,
            Some(chunk) => {
                if chunk.len() > MAX_CHUNK_ID_LEN {
                    return Err(TransportError::MalformedLocator(format!(
                        "chunk identifier too long ({} bytes, max {MAX_CHUNK_ID_LEN})",
                        chunk.len()
                    )));
                }
                if chunk.as_bytes().contains(&0) {
                    return Err(TransportError::MalformedLocator(
                        "chunk identifier contains a NUL byte".to_owned(),
                    ));
                }
                Some(chunk.to_owned())
            }
        };

        Ok(Self {
            socket_path: PathBuf::from(path),
            chunk_id,
        })
    }

    /// Socket path to connect to.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Requested chunk identifier, if the locator carried one.
    pub fn chunk_id(&self) -> Option<&str> {
        self.chunk_id.as_deref()
    }

    /// Split into owned parts.
    pub fn into_parts(self) -> (PathBuf, Option<String>) {
        (self.socket_path, self.chunk_id)
    }
}

impl std::str::FromStr for Locator {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Longest socket path accepted, in bytes.
///
/// `sun_path` is 108 bytes on Linux and 104 on macOS/BSD.
#[must_use]
pub fn max_socket_path_len() -> usize {
    // SAFETY: sockaddr_un is a plain C struct; all-zero is a valid value.
    let addr: libc::sockaddr_un = unsafe { std::mem::zeroed() };
    addr.sun_path.len() - SOCKET_PATH_MARGIN
}

// ─── Tests ──────────────────────────────────────────────────────────────────
