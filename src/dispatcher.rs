//! Chunk request dispatch.
//!
//! Right after connecting, the identifier is written once as
//! `<chunk id bytes> 0x00`. There is no acknowledgement: a valid request is
//! confirmed by payload arriving, an invalid one by the magic error marker.

use std::io;
use std::os::unix::io::RawFd;

use crate::error::{Result, TransportError};
use crate::retry::RetryPolicy;
use crate::socket::SocketOps;

/// Wire encoding of a chunk request: identifier plus NUL terminator.
#[must_use]
pub fn encode_request(chunk_id: &str) -> Vec<u8> {
    let mut request = Vec::with_capacity(chunk_id.len() + 1);
    request.extend_from_slice(chunk_id.as_bytes());
    request.push(0);
    request
}

/// Send the request for `chunk_id` on `fd`.
///
/// A failed, zero-byte, or partial send consumes one attempt; the retry
/// resends only the bytes not yet accepted. Returns the number of request
/// bytes written (identifier + NUL).
pub fn dispatch<S: SocketOps>(
    ops: &S,
    fd: RawFd,
    chunk_id: &str,
    policy: &RetryPolicy,
) -> Result<usize> {
    let request = encode_request(chunk_id);
    let mut offset = 0;

    policy
        .run(
            "request send",
            |_| {
                let n = ops.send(fd, &request[offset..])?;
                offset += n;
                if offset == request.len() {
                    Ok(offset)
                } else if n == 0 {
                    Err(io::Error::new(io::ErrorKind::WriteZero, "peer accepted no bytes"))
                } else {
                    Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        format!("partial send: {offset} of {} bytes", request.len()),
                    ))
                }
            },
            |_| true,
        )
        .map_err(TransportError::Io)
}

// ─── Tests ──────────────────────────────────────────────────────────────────
