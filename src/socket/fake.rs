//! Scripted [`SocketOps`] for unit tests.
//!
//! Each primitive pops its next result from a queue; an empty queue yields
//! the "happy" default (socket ok, connect ok, full send, orderly EOF,
//! writable). Every call is recorded so tests can assert on descriptor
//! release and on the exact bytes put on the wire.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::os::unix::io::RawFd;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use super::SocketOps;

/// Descriptor number handed out by the fake's `socket()`.
pub(crate) const FAKE_FD: RawFd = 42;

#[derive(Debug, Default)]
struct State {
    socket: VecDeque<io::Result<RawFd>>,
    connect: VecDeque<io::Result<()>>,
    send: VecDeque<io::Result<usize>>,
    recv: VecDeque<io::Result<Vec<u8>>>,
    writable: VecDeque<io::Result<bool>>,

    connects: Vec<(RawFd, PathBuf, Duration)>,
    sent: Vec<Vec<u8>>,
    closed: Vec<RawFd>,
    recv_calls: usize,
    wait_calls: Vec<Option<Duration>>,
}

/// Shared handle: clones observe the same script and call log.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeSocket {
    state: Rc<RefCell<State>>,
}

impl FakeSocket {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    // ── Scripting ─────────────────────────────────────────────────────────

    pub(crate) fn fail_socket(&self, errno: i32) {
        self.state.borrow_mut().socket.push_back(Err(io::Error::from_raw_os_error(errno)));
    }

    pub(crate) fn fail_connect(&self, errno: i32) {
        self.state.borrow_mut().connect.push_back(Err(io::Error::from_raw_os_error(errno)));
    }

    pub(crate) fn push_send(&self, result: io::Result<usize>) {
        self.state.borrow_mut().send.push_back(result);
    }

    pub(crate) fn push_recv(&self, data: &[u8]) {
        self.state.borrow_mut().recv.push_back(Ok(data.to_vec()));
    }

    pub(crate) fn push_recv_err(&self, errno: i32) {
        self.state.borrow_mut().recv.push_back(Err(io::Error::from_raw_os_error(errno)));
    }

    pub(crate) fn push_writable(&self, result: io::Result<bool>) {
        self.state.borrow_mut().writable.push_back(result);
    }

    // ── Inspection ────────────────────────────────────────────────────────

    pub(crate) fn connects(&self) -> Vec<(RawFd, PathBuf, Duration)> {
        self.state.borrow().connects.clone()
    }

    pub(crate) fn sent(&self) -> Vec<Vec<u8>> {
        self.state.borrow().sent.clone()
    }

    pub(crate) fn closed(&self) -> Vec<RawFd> {
        self.state.borrow().closed.clone()
    }

    pub(crate) fn recv_calls(&self) -> usize {
        self.state.borrow().recv_calls
    }

    pub(crate) fn wait_calls(&self) -> Vec<Option<Duration>> {
        self.state.borrow().wait_calls.clone()
    }
}

impl SocketOps for FakeSocket {
    fn socket(&self) -> io::Result<RawFd> {
        self.state.borrow_mut().socket.pop_front().unwrap_or(Ok(FAKE_FD))
    }

    fn connect(&self, fd: RawFd, path: &Path, timeout: Duration) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        state.connects.push((fd, path.to_path_buf(), timeout));
        state.connect.pop_front().unwrap_or(Ok(()))
    }

    fn send(&self, _fd: RawFd, data: &[u8]) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();
        let result = state.send.pop_front().unwrap_or(Ok(data.len()));
        if let Ok(n) = result {
            state.sent.push(data[..n.min(data.len())].to_vec());
        }
        result
    }

    fn recv(&self, _fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();
        state.recv_calls += 1;
        match state.recv.pop_front() {
            None => Ok(0),
            Some(Err(e)) => Err(e),
            Some(Ok(mut data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    state.recv.push_front(Ok(data.split_off(n)));
                }
                Ok(n)
            }
        }
    }

    fn wait_writable(&self, _fd: RawFd, timeout: Option<Duration>) -> io::Result<bool> {
        let mut state = self.state.borrow_mut();
        state.wait_calls.push(timeout);
        state.writable.pop_front().unwrap_or(Ok(true))
    }

    fn close(&self, fd: RawFd) {
        self.state.borrow_mut().closed.push(fd);
    }
}
