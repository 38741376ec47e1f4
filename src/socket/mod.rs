//! Platform socket primitives used by the transport.
//!
//! The connector, dispatcher, and session never call libc directly; they go
//! through [`SocketOps`]. [`LibcSocket`] is the production implementation.
//! Unit tests substitute a scripted fake that records every call.
//!
//! Descriptors are plain [`RawFd`]s rather than `OwnedFd` because ownership
//! is tracked by the session, which must release them through
//! [`SocketOps::close`] exactly once.

// Rust guideline compliant 2026-02

use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::RawFd;
use std::path::Path;
use std::time::{Duration, Instant};

#[cfg(test)]
pub(crate) mod fake;

/// Socket primitives the transport depends on.
///
/// Methods take `&self`; implementations hold no per-descriptor state.
pub trait SocketOps {
    /// Allocate a stream-oriented Unix domain socket.
    fn socket(&self) -> io::Result<RawFd>;

    /// Connect `fd` to `path`, waiting at most `timeout`.
    ///
    /// On success the descriptor is left in non-blocking mode.
    fn connect(&self, fd: RawFd, path: &Path, timeout: Duration) -> io::Result<()>;

    /// Send bytes without raising SIGPIPE. Returns bytes accepted.
    fn send(&self, fd: RawFd, data: &[u8]) -> io::Result<usize>;

    /// Receive up to `buf.len()` bytes. `Ok(0)` is an orderly shutdown.
    fn recv(&self, fd: RawFd, buf: &mut [u8]) -> io::Result<usize>;

    /// Wait until `fd` is writable. Returns `false` if `timeout` expired.
    fn wait_writable(&self, fd: RawFd, timeout: Option<Duration>) -> io::Result<bool>;

    /// Release the descriptor.
    fn close(&self, fd: RawFd);
}

/// [`SocketOps`] backed by libc syscalls.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibcSocket;

/// Per-call SIGPIPE suppression where the platform has it; Apple targets
/// use `SO_NOSIGPIPE` on the socket instead.
#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd"
))]
const SEND_FLAGS: libc::c_int = libc::MSG_NOSIGNAL;
#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd"
)))]
const SEND_FLAGS: libc::c_int = 0;

impl SocketOps for LibcSocket {
    fn socket(&self) -> io::Result<RawFd> {
        // SAFETY: plain syscall, no pointers involved.
        let fd = unsafe { libc::socket(libc::AF_UNIX, libc::SOCK_STREAM, 0) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        if let Err(e) = configure_new_socket(fd) {
            self.close(fd);
            return Err(e);
        }
        Ok(fd)
    }

    fn connect(&self, fd: RawFd, path: &Path, timeout: Duration) -> io::Result<()> {
        let (addr, len) = sockaddr_for(path)?;
        set_nonblocking(fd)?;

        let deadline = Instant::now() + timeout;
        loop {
            // SAFETY: `addr` is a fully initialised sockaddr_un and `len`
            // does not exceed its size.
            let ret = unsafe {
                libc::connect(
                    fd,
                    std::ptr::addr_of!(addr).cast::<libc::sockaddr>(),
                    len,
                )
            };
            if ret == 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            match err.raw_os_error() {
                Some(libc::EINTR) => continue,
                // Linux reports a full listen backlog as EAGAIN on
                // non-blocking AF_UNIX connects.
                Some(libc::EINPROGRESS | libc::EAGAIN | libc::EALREADY) => break,
                _ => return Err(err),
            }
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if !poll_fd(fd, libc::POLLOUT, Some(remaining))? {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "connect timed out"));
        }
        match take_socket_error(fd)? {
            0 => Ok(()),
            code => Err(io::Error::from_raw_os_error(code)),
        }
    }

    fn send(&self, fd: RawFd, data: &[u8]) -> io::Result<usize> {
        // SAFETY: pointer and length describe the borrowed `data` slice.
        let n = unsafe { libc::send(fd, data.as_ptr().cast::<libc::c_void>(), data.len(), SEND_FLAGS) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n as usize)
    }

    fn recv(&self, fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
        // SAFETY: pointer and length describe the exclusively borrowed `buf`.
        let n = unsafe { libc::recv(fd, buf.as_mut_ptr().cast::<libc::c_void>(), buf.len(), 0) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n as usize)
    }

    fn wait_writable(&self, fd: RawFd, timeout: Option<Duration>) -> io::Result<bool> {
        poll_fd(fd, libc::POLLOUT, timeout)
    }

    fn close(&self, fd: RawFd) {
        // SAFETY: the caller owns `fd` and never uses it again.
        if unsafe { libc::close(fd) } < 0 {
            log::warn!("[llhls] close(fd={fd}) failed: {}", io::Error::last_os_error());
        }
    }
}

/// Wait for `events` on `fd` using `poll(2)`.
///
/// Returns `true` when the descriptor is ready (or reports an error/hangup
/// condition, which the next syscall on it will surface) and `false` when
/// `timeout` expired. `None` waits indefinitely. Interrupted polls are
/// resumed with the remaining time.
pub fn poll_fd(fd: RawFd, events: libc::c_short, timeout: Option<Duration>) -> io::Result<bool> {
    let deadline = timeout.map(|t| Instant::now() + t);
    loop {
        let timeout_ms = match deadline {
            None => -1,
            Some(deadline) => poll_timeout_ms(deadline.saturating_duration_since(Instant::now())),
        };
        let mut pollfd = libc::pollfd {
            fd,
            events,
            revents: 0,
        };
        // SAFETY: `pollfd` is a valid, exclusively borrowed array of length 1.
        let ready = unsafe { libc::poll(&mut pollfd, 1, timeout_ms) };
        if ready < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        return Ok(ready > 0);
    }
}

/// Convert a duration to a `poll(2)` timeout, rounding sub-millisecond
/// remainders up so a short timeout never turns into a busy poll.
fn poll_timeout_ms(d: Duration) -> libc::c_int {
    let mut ms = d.as_millis();
    if d.subsec_nanos() % 1_000_000 != 0 {
        ms += 1;
    }
    ms.min(libc::c_int::MAX as u128) as libc::c_int
}

fn configure_new_socket(fd: RawFd) -> io::Result<()> {
    // SAFETY: fcntl on a descriptor we just created.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
    // SAFETY: as above.
    if flags < 0 || unsafe { libc::fcntl(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC) } < 0 {
        return Err(io::Error::last_os_error());
    }

    #[cfg(any(target_os = "macos", target_os = "ios"))]
    {
        let on: libc::c_int = 1;
        // SAFETY: `on` outlives the call and the length matches its type.
        let ret = unsafe {
            libc::setsockopt(
                fd,
                libc::SOL_SOCKET,
                libc::SO_NOSIGPIPE,
                std::ptr::addr_of!(on).cast::<libc::c_void>(),
                std::mem::size_of::<libc::c_int>() as libc::socklen_t,
            )
        };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }
    }

    Ok(())
}

fn set_nonblocking(fd: RawFd) -> io::Result<()> {
    // SAFETY: fcntl on a caller-owned descriptor.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    // SAFETY: as above.
    if flags < 0 || unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn take_socket_error(fd: RawFd) -> io::Result<libc::c_int> {
    let mut code: libc::c_int = 0;
    let mut len = std::mem::size_of::<libc::c_int>() as libc::socklen_t;
    // SAFETY: `code` and `len` are valid for writes of the advertised size.
    let ret = unsafe {
        libc::getsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_ERROR,
            std::ptr::addr_of_mut!(code).cast::<libc::c_void>(),
            &mut len,
        )
    };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(code)
}

/// Build a `sockaddr_un` for `path`.
fn sockaddr_for(path: &Path) -> io::Result<(libc::sockaddr_un, libc::socklen_t)> {
    // SAFETY: all-zero is a valid sockaddr_un.
    let mut addr: libc::sockaddr_un = unsafe { std::mem::zeroed() };
    addr.sun_family = libc::AF_UNIX as libc::sa_family_t;

    let bytes = path.as_os_str().as_bytes();
    if bytes.len() >= addr.sun_path.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("socket path too long: {}", path.display()),
        ));
    }
    for (dst, src) in addr.sun_path.iter_mut().zip(bytes) {
        *dst = *src as libc::c_char;
    }

    Ok((addr, std::mem::size_of::<libc::sockaddr_un>() as libc::socklen_t))
}

// ─── Tests ──────────────────────────────────────────────────────────────────
