//! Protocol registration: scheme name → opener.
//!
//! A host resolves `scheme:rest` URLs through a [`ProtocolRegistry`]. The
//! registry is populated explicitly; [`ProtocolRegistry::with_defaults`]
//! registers the `llhls` transport.

use std::collections::HashMap;
use std::os::unix::io::RawFd;

use crate::config::TransportOptions;
use crate::constants::SCHEME;
use crate::error::{Result, TransportError};
use crate::session::{ReadOutcome, Session};
use crate::socket::SocketOps;

/// Object-safe view of an open transport, as handed to a host.
pub trait Transport: std::fmt::Debug {
    /// Non-blocking read; see [`Session::read`].
    fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome>;

    /// See [`Session::write`].
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Release the underlying resources. Idempotent.
    fn close(&mut self) -> Result<()>;

    /// Descriptor to poll for readiness; `None` once closed.
    fn raw_fd(&self) -> Option<RawFd>;
}

impl<S: SocketOps> Transport for Session<S> {
    fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome> {
        Session::read(self, buf)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        Session::write(self, data)
    }

    fn close(&mut self) -> Result<()> {
        Session::close(self)
    }

    fn raw_fd(&self) -> Option<RawFd> {
        Session::raw_fd(self)
    }
}

/// Capability flags a protocol advertises to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProtocolFlags {
    /// Uses the network stack (host should initialize networking).
    pub network: bool,
    /// Supports non-blocking reads.
    pub nonblocking: bool,
}

/// Opens a transport for a full URL.
pub type OpenFn = fn(&str, &TransportOptions) -> Result<Box<dyn Transport>>;

/// One registered protocol.
#[derive(Clone)]
pub struct ProtocolEntry {
    /// Scheme, matched against the URL text before the first `:`.
    pub name: &'static str,
    /// Capabilities advertised to the host.
    pub flags: ProtocolFlags,
    /// Constructor invoked with the full URL.
    pub open: OpenFn,
}

impl std::fmt::Debug for ProtocolEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolEntry")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// Registry entry for the `llhls` transport.
#[must_use]
pub fn llhls_entry() -> ProtocolEntry {
    ProtocolEntry {
        name: SCHEME,
        flags: ProtocolFlags {
            network: true,
            nonblocking: true,
        },
        open: open_llhls,
    }
}

fn open_llhls(url: &str, options: &TransportOptions) -> Result<Box<dyn Transport>> {
    Ok(Box::new(Session::open(url, options)?))
}

/// Scheme-keyed table of protocols.
#[derive(Debug, Default)]
pub struct ProtocolRegistry {
    entries: HashMap<&'static str, ProtocolEntry>,
}

impl ProtocolRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in `llhls` protocol.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(llhls_entry());
        registry
    }

    /// Add `entry`, returning any entry it replaced.
    pub fn register(&mut self, entry: ProtocolEntry) -> Option<ProtocolEntry> {
        let previous = self.entries.insert(entry.name, entry);
        if let Some(ref old) = previous {
            log::debug!("[Registry] replaced protocol {}", old.name);
        }
        previous
    }

    /// Entry registered under `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&ProtocolEntry> {
        self.entries.get(name)
    }

    /// Registered scheme names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Open `url` with the protocol named by its scheme (text before `:`).
    ///
    /// # Errors
    ///
    /// [`TransportError::UnknownProtocol`] if the URL has no scheme or the
    /// scheme is not registered; otherwise whatever the opener returns.
    pub fn open(&self, url: &str, options: &TransportOptions) -> Result<Box<dyn Transport>> {
        let scheme = url
            .split_once(':')
            .map(|(scheme, _)| scheme)
            .ok_or_else(|| TransportError::UnknownProtocol(url.to_owned()))?;
        let entry = self
            .lookup(scheme)
            .ok_or_else(|| TransportError::UnknownProtocol(scheme.to_owned()))?;
        log::debug!("[Registry] opening {url} via {}", entry.name);
        (entry.open)(url, options)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socket::fake::{FakeSocket, FAKE_FD};

    fn fake_open(url: &str, options: &TransportOptions) -> Result<Box<dyn Transport>> {
        let fake = FakeSocket::new();
        fake.push_recv(b"fake payload");
        Ok(Box::new(Session::open_with(fake, url, options)?))
    }

    fn fake_entry() -> ProtocolEntry {
        ProtocolEntry {
            open: fake_open,
            ..llhls_entry()
        }
    }

    #[test]
    fn test_defaults_register_llhls() {
        let registry = ProtocolRegistry::with_defaults();
        assert_eq!(registry.names(), vec!["llhls"]);
        let entry = registry.lookup("llhls").unwrap();
        assert!(entry.flags.network);
        assert!(entry.flags.nonblocking);
    }

    #[test]
    fn test_register_replaces_and_returns_previous() {
        let mut registry = ProtocolRegistry::with_defaults();
        let previous = registry.register(fake_entry());
        assert_eq!(previous.map(|e| e.name), Some("llhls"));
        assert_eq!(registry.names().len(), 1);
    }

    #[test]
    fn test_open_dispatches_on_scheme() {
        let mut registry = ProtocolRegistry::new();
        registry.register(fake_entry());

        let mut transport = registry
            .open("llhls:/tmp/s?chunk7", &TransportOptions::default())
            .unwrap();
        assert_eq!(transport.raw_fd(), Some(FAKE_FD));

        let mut buf = [0u8; 64];
        assert_eq!(transport.read(&mut buf).unwrap(), ReadOutcome::Data(12));
        assert_eq!(&buf[..12], b"fake payload");
        transport.close().unwrap();
        assert_eq!(transport.raw_fd(), None);
    }

    #[test]
    fn test_open_unknown_scheme() {
        let registry = ProtocolRegistry::with_defaults();
        let err = registry
            .open("rtmp://host/app", &TransportOptions::default())
            .unwrap_err();
        match err {
            TransportError::UnknownProtocol(name) => assert_eq!(name, "rtmp"),
            other => panic!("expected UnknownProtocol, got {other:?}"),
        }
    }

    #[test]
    fn test_open_without_scheme() {
        let registry = ProtocolRegistry::with_defaults();
        assert!(matches!(
            registry.open("/tmp/sock", &TransportOptions::default()),
            Err(TransportError::UnknownProtocol(_))
        ));
    }

    #[test]
    fn test_open_propagates_opener_errors() {
        let mut registry = ProtocolRegistry::new();
        registry.register(fake_entry());
        assert!(matches!(
            registry.open("llhls:?c", &TransportOptions::default()),
            Err(TransportError::MalformedLocator(_))
        ));
    }
}
